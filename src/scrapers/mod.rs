//! Fetching and card extraction for the listing page.
//!
//! A scrape is two phases:
//!
//! 1. **Fetching**: [`PageFetcher`] downloads the listing page as text
//! 2. **Extracting**: an [`Extractor`] turns that HTML into [`ArticleRecord`]s
//!
//! Extraction is driven by a declarative [`SelectorMap`], so supporting a
//! different layout means writing a new map rather than new code. The
//! built-in map for the HuffPost front page lives in [`huffpost`].

pub mod huffpost;
pub mod selectors;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;
use crate::models::ArticleRecord;

pub use selectors::{FieldSpec, SelectorExtractor, SelectorMap};

/// Turns a listing page into article records.
///
/// Implementations must be infallible per card: a card that lacks a node
/// yields empty fields, never an error.
pub trait Extractor: Send + Sync {
    /// Extract one record per card in document order. `page_url` is used to
    /// resolve relative links.
    fn extract(&self, html: &str, page_url: &Url) -> Vec<ArticleRecord>;
}

/// Thin wrapper around a reusable HTTP client for one-shot page downloads.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// GET `url` and return the body text. Non-success statuses are errors.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(network)?;
        debug!(bytes = body.len(), %status, "Fetched page");
        Ok(body)
    }
}
