//! UEX catalog sync: one listing fetch, or one per dependency instance.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use catsync_recon::catalog::TargetEndpoint;

use crate::fetcher::Fetcher;

/// UEX wraps every listing in `{status, data}`; only `"ok"` is accepted.
pub fn accept_ok(body: &serde_json::Value) -> Result<(), String> {
    match body.get("status").and_then(|s| s.as_str()) {
        Some("ok") => Ok(()),
        Some(other) => Err(format!("status '{other}'")),
        None => Err("missing status".into()),
    }
}

pub struct TargetSync<'a> {
    fetcher: &'a Fetcher,
    base_url: String,
}

impl<'a> TargetSync<'a> {
    pub fn new(fetcher: &'a Fetcher, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn list<T: DeserializeOwned>(&self, endpoint: &TargetEndpoint) -> Vec<T> {
        let rows = self.list_raw(endpoint);
        let total = rows.len();

        let records: Vec<T> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<T>(row.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(model = endpoint.name, error = %e, payload = %row, unexpected = true, "failed to parse entry");
                    None
                }
            })
            .collect();

        info!(model = endpoint.name, fetched = total, parsed = records.len(), "uex catalog loaded");
        records
    }

    /// URLs to fetch for `endpoint`, resolving any fan-out dependency first.
    pub fn urls_for(&self, endpoint: &TargetEndpoint) -> Vec<String> {
        let base = format!("{}{}", self.base_url, endpoint.path);
        let Some(fan_out) = endpoint.fan_out else {
            return vec![base];
        };

        let instances = self.list_raw(fan_out.over);
        debug!(model = endpoint.name, over = fan_out.over.name, instances = instances.len(), "fanning out");

        instances
            .iter()
            .filter_map(|instance| match instance.get(fan_out.key) {
                Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => {
                    warn!(model = endpoint.name, key = fan_out.key, payload = %instance, "fan-out instance without key skipped");
                    None
                }
            })
            .map(|value| format!("{base}{}", fan_out.query(&value)))
            .collect()
    }

    fn list_raw(&self, endpoint: &TargetEndpoint) -> Vec<serde_json::Value> {
        let namespace = format!("uex_{}", endpoint.name);
        let urls = self.urls_for(endpoint);
        info!(model = endpoint.name, urls = urls.len(), source = %self.base_url, "synchronizing uex");

        let mut rows = Vec::new();
        for url in &urls {
            debug!(model = endpoint.name, url = %url, "fetching");
            let body = match self.fetcher.fetch_json(&namespace, url, accept_ok) {
                Ok(body) => body,
                Err(e) => {
                    warn!(model = endpoint.name, url = %url, error = %e, "fetch failed");
                    continue;
                }
            };

            match body.get("data") {
                Some(serde_json::Value::Array(entries)) => rows.extend(entries.iter().cloned()),
                Some(serde_json::Value::Null) | None => {}
                Some(other) => {
                    warn!(model = endpoint.name, url = %url, payload = %other, unexpected = true, "data is not a list");
                }
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_status_must_be_ok() {
        assert!(accept_ok(&serde_json::json!({"status": "ok", "data": []})).is_ok());
        assert_eq!(
            accept_ok(&serde_json::json!({"status": "requests_limit_reached"})).unwrap_err(),
            "status 'requests_limit_reached'"
        );
        assert!(accept_ok(&serde_json::json!({"data": []})).is_err());
    }
}
