//! Shared fetch step for both catalogs: cache lookup, GET, status check,
//! JSON parse, envelope check, cache write.

use tracing::{debug, warn};

use crate::cache::{key_for_url, CacheStore};
use crate::error::FetchError;
use crate::http::HttpGet;

/// Envelope check run on a parsed body before it is accepted and cached.
pub type Accept = fn(&serde_json::Value) -> Result<(), String>;

pub fn accept_any(_: &serde_json::Value) -> Result<(), String> {
    Ok(())
}

pub struct Fetcher {
    http: Box<dyn HttpGet>,
    /// `None` disables both cache reads and cache writes.
    cache: Option<CacheStore>,
}

impl Fetcher {
    pub fn new(http: Box<dyn HttpGet>, cache: Option<CacheStore>) -> Self {
        Self { http, cache }
    }

    pub fn fetch_json(
        &self,
        namespace: &str,
        url: &str,
        accept: Accept,
    ) -> Result<serde_json::Value, FetchError> {
        let key = key_for_url(url);

        if let Some(cache) = &self.cache {
            match cache.get_json(namespace, &key) {
                Ok(Some(cached)) => {
                    debug!(url, namespace, "cache hit");
                    return Ok(cached);
                }
                Ok(None) => debug!(url, namespace, "cache miss"),
                Err(e) => warn!(url, error = %e, "cache read failed, fetching"),
            }
        }

        let resp = self.http.get(url)?;
        if !resp.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status,
            });
        }

        let parsed: serde_json::Value =
            serde_json::from_slice(&resp.body).map_err(|source| FetchError::Parse {
                url: url.to_string(),
                source,
            })?;

        accept(&parsed).map_err(|reason| FetchError::Envelope {
            url: url.to_string(),
            reason,
        })?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put_json(namespace, &key, &parsed) {
                warn!(url, error = %e, "cache write failed");
            }
        }

        Ok(parsed)
    }
}
