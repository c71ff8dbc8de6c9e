//! Catalog fetchers and the file-backed cache.
//!
//! Both catalogs are fetched sequentially with a blocking client. Fetch
//! failures are soft: a failing URL is logged and contributes nothing.

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod source;
pub mod target;

pub use cache::{key_for_url, CacheStore};
pub use error::{CacheError, FetchError};
pub use fetcher::Fetcher;
pub use http::{BlockingHttp, HttpGet, HttpResponse};
pub use source::{SourceSync, Summary};
pub use target::TargetSync;
