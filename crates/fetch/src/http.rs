//! Blocking HTTP transport (no Tokio runtime required).

use std::time::Duration;

use crate::error::FetchError;

pub const USER_AGENT: &str = concat!("catsync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A plain GET. Any status is returned as a response; only transport
/// failures are errors.
pub trait HttpGet {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

pub struct BlockingHttp {
    http: reqwest::blocking::Client,
}

impl BlockingHttp {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { http })
    }
}

impl HttpGet for BlockingHttp {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().map_err(transport)?.to_vec();

        Ok(HttpResponse { status, body })
    }
}
