//! Wiki catalog sync: cursor pagination plus an optional per-record detail fetch.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use catsync_recon::catalog::source::WikiVehicleSummary;
use catsync_recon::catalog::SourceEndpoint;

use crate::fetcher::{accept_any, Fetcher};

/// A listing row that points at its full record.
pub trait Summary: DeserializeOwned + Serialize {
    fn link(&self) -> &str;
}

impl Summary for WikiVehicleSummary {
    fn link(&self) -> &str {
        &self.link
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    #[serde(default)]
    links: Option<PageLinks>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    #[serde(default)]
    current_page: Option<u64>,
    #[serde(default)]
    last_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Detail {
    #[serde(default)]
    data: Option<serde_json::Map<String, serde_json::Value>>,
}

pub struct SourceSync<'a> {
    fetcher: &'a Fetcher,
    base_url: String,
    page_limit: u32,
    locale: Option<String>,
}

impl<'a> SourceSync<'a> {
    pub fn new(fetcher: &'a Fetcher, base_url: &str, page_limit: u32, locale: Option<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit,
            locale: locale.filter(|l| !l.is_empty()),
        }
    }

    fn namespace(endpoint: &SourceEndpoint) -> String {
        format!("wiki_{}", endpoint.name)
    }

    pub fn seed_url(&self, endpoint: &SourceEndpoint) -> String {
        let mut url = format!("{}{}", self.base_url, endpoint.path);
        if endpoint.paginated {
            url.push_str(&format!("?limit={}", self.page_limit));
            if let Some(locale) = &self.locale {
                url.push_str(&format!("&locale={locale}"));
            }
        }
        url
    }

    /// Listing rows, parsed directly into `R`. Rows that fail to parse are dropped.
    pub fn list<R: DeserializeOwned>(&self, endpoint: &SourceEndpoint) -> Vec<R> {
        let seed = self.seed_url(endpoint);
        info!(model = endpoint.name, source = %seed, "synchronizing wiki");

        let rows = if endpoint.paginated {
            self.fetch_pages(endpoint, seed)
        } else {
            self.fetch_single(endpoint, &seed)
        };

        parse_rows(endpoint.name, rows)
    }

    /// Listing rows as summaries, each merged with its detail record into `S`.
    pub fn list_detailed<L: Summary, S: DeserializeOwned>(&self, endpoint: &SourceEndpoint) -> Vec<S> {
        let summaries: Vec<L> = self.list(endpoint);
        if !endpoint.detail {
            warn!(model = endpoint.name, "endpoint has no detail records");
        }

        let namespace = Self::namespace(endpoint);
        let total = summaries.len();
        let mut records = Vec::with_capacity(total);

        for summary in &summaries {
            let link = summary.link();
            let detail = match self.fetcher.fetch_json(&namespace, link, accept_any) {
                Ok(value) => value,
                Err(e) => {
                    warn!(model = endpoint.name, link, error = %e, "detail fetch failed, record dropped");
                    continue;
                }
            };

            let merged = match merge_detail(summary, detail) {
                Ok(merged) => merged,
                Err(e) => {
                    warn!(model = endpoint.name, link, error = %e, unexpected = true, "detail unreadable, record dropped");
                    continue;
                }
            };

            match serde_json::from_value::<S>(merged) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(model = endpoint.name, link, error = %e, unexpected = true, "failed to parse detail record");
                }
            }
        }

        info!(model = endpoint.name, summaries = total, records = records.len(), "wiki details merged");
        records
    }

    fn fetch_pages(&self, endpoint: &SourceEndpoint, seed: String) -> Vec<serde_json::Value> {
        let namespace = Self::namespace(endpoint);
        let mut rows = Vec::new();
        let mut visited = BTreeSet::new();
        let mut next = Some(seed);

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                warn!(model = endpoint.name, url = %url, unexpected = true, "pagination cycle, next page already fetched");
                break;
            }

            let body = match self.fetcher.fetch_json(&namespace, &url, accept_any) {
                Ok(body) => body,
                Err(e) => {
                    warn!(model = endpoint.name, url = %url, error = %e, "page fetch failed, pagination stopped");
                    break;
                }
            };

            let page: Page = match serde_json::from_value(body) {
                Ok(page) => page,
                Err(e) => {
                    warn!(model = endpoint.name, url = %url, error = %e, unexpected = true, "invalid page, pagination stopped");
                    break;
                }
            };

            let meta = page.meta.as_ref();
            debug!(
                model = endpoint.name,
                page = meta.and_then(|m| m.current_page),
                last_page = meta.and_then(|m| m.last_page),
                entries = page.data.len(),
                "page fetched"
            );

            rows.extend(page.data);
            next = page.links.and_then(|l| l.next).filter(|n| !n.is_empty());
        }

        rows
    }

    fn fetch_single(&self, endpoint: &SourceEndpoint, url: &str) -> Vec<serde_json::Value> {
        let namespace = Self::namespace(endpoint);
        let body = match self.fetcher.fetch_json(&namespace, url, accept_any) {
            Ok(body) => body,
            Err(e) => {
                warn!(model = endpoint.name, url, error = %e, "fetch failed");
                return Vec::new();
            }
        };

        match serde_json::from_value::<Page>(body) {
            Ok(page) => page.data,
            Err(e) => {
                warn!(model = endpoint.name, url, error = %e, unexpected = true, "invalid listing");
                Vec::new()
            }
        }
    }
}

/// Seed from the summary, then overlay every non-null top-level detail field.
fn merge_detail<L: Serialize>(
    summary: &L,
    detail: serde_json::Value,
) -> Result<serde_json::Value, serde_json::Error> {
    let mut merged = serde_json::to_value(summary)?;
    let Detail { data } = serde_json::from_value(detail)?;

    if let (Some(seed), Some(data)) = (merged.as_object_mut(), data) {
        for (field, value) in data {
            if !value.is_null() {
                seed.insert(field, value);
            }
        }
    }

    Ok(merged)
}

fn parse_rows<R: DeserializeOwned>(model: &str, rows: Vec<serde_json::Value>) -> Vec<R> {
    let total = rows.len();
    let parsed: Vec<R> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<R>(row.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(model, error = %e, payload = %row, unexpected = true, "failed to parse entry");
                None
            }
        })
        .collect();

    if parsed.len() < total {
        info!(model, dropped = total - parsed.len(), "unparseable entries dropped");
    }
    parsed
}
