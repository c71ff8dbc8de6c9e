use thiserror::Error;

use catsync_recon::StoreError;

/// Error type for a single fetch. Never aborts a sync; the URL contributes nothing.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("cannot parse response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    /// Well-formed response whose envelope reports a failure.
    #[error("{url} rejected: {reason}")]
    Envelope { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<CacheError> for StoreError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Io { path, source } => StoreError::Io { path, source },
            CacheError::Encode(e) => StoreError::Encode(e),
        }
    }
}
