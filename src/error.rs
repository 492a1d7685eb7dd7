//! Error types for the fetch, extract, and store layers.
//!
//! Each layer has its own enum so callers can decide what to surface:
//! fetch failures are only logged for detached scrapes, store failures are
//! handed back to API callers as JSON, and selector failures stop startup.

use thiserror::Error;

/// Failure to retrieve the source page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Failure of a document store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cast to id failed for value \"{0}\"")]
    InvalidId(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not decode document {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Short machine-readable kind, used as the `name` of JSON error bodies.
    pub fn name(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "CastError",
            StoreError::Database(_) => "DatabaseError",
            StoreError::Decode { .. } => "DecodeError",
        }
    }
}

/// Failure to load or compile a selector map.
#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Invalid selector {selector:?}: {message}")]
    Invalid { selector: String, message: String },

    #[error("Selector map is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
