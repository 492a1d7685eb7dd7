//! HTTP REST API
//!
//! Axum-based server exposing the scraper and the article/note collections.
//! Each endpoint has a thin axum handler that delegates to an inner function
//! taking plain arguments, so the logic is testable without going through
//! request dispatch.
//!
//! Endpoints:
//! - GET  /scrape: scrape the source page, respond once writes are issued
//! - GET  /scrape?wait=true: scrape and respond with the per-record report
//! - GET  /articles: list articles, optionally filtered by query params
//! - GET  /articles/:id: one article with its note inlined, or `null`
//! - POST /articles/:id: create a note from the body and attach it
//!
//! Everything else is served from the public directory.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{FetchError, StoreError};
use crate::models::ArticleFilter;
use crate::scrape::Scraper;
use crate::store::DocumentStore;

/// Body sent by `GET /scrape` regardless of how the scrape went.
pub const SCRAPE_COMPLETE: &str = "Scrape Complete";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: DocumentStore,
    pub scraper: Scraper,
    pub public_dir: PathBuf,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let public = ServeDir::new(&state.public_dir);
    Router::new()
        .route("/scrape", get(scrape_handler))
        .route("/articles", get(list_articles_handler))
        .route(
            "/articles/:id",
            get(get_article_handler).post(attach_note_handler),
        )
        .fallback_service(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn start_http_server(state: HttpState, addr: &str) -> std::io::Result<()> {
    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(addr).await?;
    info!("App running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("HTTP server shutting down...");
        })
        .await
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ScrapeParams {
    #[serde(default)]
    pub wait: bool,
}

/// Note payload parsed from either a JSON or a URL-encoded body.
///
/// An empty JSON body counts as `{}`. Any other content type yields an
/// empty field map. Unparseable bodies are rejected with a JSON error body.
#[derive(Debug, Default)]
pub struct NoteBody(pub Map<String, Value>);

#[axum::async_trait]
impl<S> FromRequest<S> for NoteBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| parse_error(rejection.status(), rejection.body_text()))?;
            return json_fields(&body)
                .map(Self)
                .map_err(|message| parse_error(StatusCode::BAD_REQUEST, message));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| parse_error(rejection.status(), rejection.body_text()))?;
            return Ok(Self(form_fields(pairs)));
        }

        Ok(Self::default())
    }
}

/// Decode a JSON note body. Blank bodies are an empty object; anything but
/// an object is an error.
pub fn json_fields(body: &[u8]) -> Result<Map<String, Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err("Expected a JSON object as the request body".to_string()),
        Err(e) => Err(format!("Failed to parse the request body as JSON: {e}")),
    }
}

/// Fold form pairs into fields. A repeated key becomes an array of its
/// values in order.
pub fn form_fields(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match fields.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key, value);
            }
        }
    }
    fields
}

fn parse_error(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(error_body("ParseError", message))).into_response()
}

/// JSON error body: `{ "name": ..., "message": ... }`.
pub fn error_body(name: &str, message: impl ToString) -> Value {
    json!({ "name": name, "message": message.to_string() })
}

fn store_error_response(e: &StoreError) -> (StatusCode, Value) {
    let status = match e {
        StoreError::InvalidId(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(e.name(), e))
}

fn fetch_error_response(e: &FetchError) -> (StatusCode, Value) {
    (StatusCode::BAD_GATEWAY, error_body("FetchError", e))
}

fn to_json<T: serde::Serialize>(value: T) -> (StatusCode, Value) {
    match serde_json::to_value(value) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("SerializationError", e),
        ),
    }
}

// ============================================================================
// Inner functions
// ============================================================================

/// Detached scrape. Fetch failures are logged, never reported to the caller.
pub async fn scrape_inner(scraper: &Scraper) -> &'static str {
    match scraper.spawn_run().await {
        Ok(issued) => info!(issued, "Scrape triggered"),
        Err(e) => error!(error = %e, source = %scraper.source_url(), "Scrape failed"),
    }
    SCRAPE_COMPLETE
}

/// Awaited scrape with a per-record report.
pub async fn scrape_report_inner(scraper: &Scraper) -> (StatusCode, Value) {
    match scraper.run().await {
        Ok(report) => to_json(report),
        Err(e) => {
            error!(error = %e, source = %scraper.source_url(), "Scrape failed");
            fetch_error_response(&e)
        }
    }
}

pub async fn list_articles_inner(
    store: &DocumentStore,
    filter: &ArticleFilter,
) -> (StatusCode, Value) {
    match store.find_articles(filter).await {
        Ok(articles) => to_json(articles),
        Err(e) => store_error_response(&e),
    }
}

pub async fn get_article_inner(store: &DocumentStore, id: &str) -> (StatusCode, Value) {
    match store.find_article_with_note(id).await {
        Ok(article) => to_json(article),
        Err(e) => store_error_response(&e),
    }
}

/// Create a note from `fields`, then point the article at it.
///
/// The note is created even when the article does not exist, in which case
/// the body is `null`.
pub async fn attach_note_inner(
    store: &DocumentStore,
    id: &str,
    fields: Map<String, Value>,
) -> (StatusCode, Value) {
    let note = match store.create_note(fields).await {
        Ok(note) => note,
        Err(e) => return store_error_response(&e),
    };
    match store.set_article_note(id, &note.id).await {
        Ok(article) => to_json(article),
        Err(e) => store_error_response(&e),
    }
}

// ============================================================================
// Axum handler wrappers (thin, delegate to inner functions)
// ============================================================================

pub async fn scrape_handler(
    State(state): State<Arc<HttpState>>,
    params: Result<Query<ScrapeParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return parse_error(rejection.status(), rejection.body_text()),
    };
    if params.wait {
        let (status, body) = scrape_report_inner(&state.scraper).await;
        (status, Json(body)).into_response()
    } else {
        scrape_inner(&state.scraper).await.into_response()
    }
}

pub async fn list_articles_handler(
    State(state): State<Arc<HttpState>>,
    Query(filter): Query<ArticleFilter>,
) -> impl IntoResponse {
    let (status, body) = list_articles_inner(&state.store, &filter).await;
    (status, Json(body))
}

pub async fn get_article_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = get_article_inner(&state.store, &id).await;
    (status, Json(body))
}

pub async fn attach_note_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    NoteBody(fields): NoteBody,
) -> impl IntoResponse {
    let (status, body) = attach_note_inner(&state.store, &id, fields).await;
    (status, Json(body))
}

// ============================================================================
// Unit tests: call inner functions directly
// ============================================================================
