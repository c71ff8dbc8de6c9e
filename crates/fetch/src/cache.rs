//! File-backed cache: raw fetch results and the update queue documents.
//!
//! Layout: `<root>/<namespace>/<key>.json`. No TTL; a present entry always
//! wins over a live fetch.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use catsync_recon::{QueueStore, ResourceType, StoreError, UpdateQueue};

use crate::error::CacheError;

pub const UPDATES_NAMESPACE: &str = "updates";

/// Cache file stem for a URL: the last path segment (query included) with
/// non-word characters replaced, plus a short hash of the whole URL.
pub fn key_for_url(url: &str) -> String {
    let segment = url.split('/').rev().find(|s| !s.is_empty()).unwrap_or("root");
    let sanitized: String = segment
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    let hash = blake3::hash(url.as_bytes()).to_hex();
    format!("{}-{}", sanitized, &hash.as_str()[..12])
}

pub fn queue_key(resource: ResourceType) -> String {
    format!("{}_updates", resource.as_str())
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{key}.json"))
    }

    /// Raw entry. Missing and empty files are misses.
    pub fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(namespace, key);
        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// Write through a temp file in the same directory, then rename.
    pub fn put(&self, namespace: &str, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(namespace, key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;
        Ok(())
    }

    /// Parsed entry. An entry that fails to parse is deleted and reported as a miss.
    pub fn get_json(&self, namespace: &str, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let Some(bytes) = self.get(namespace, key)? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                let path = self.path_for(namespace, key);
                warn!(file = %path.display(), error = %e, "removed corrupted cache file");
                self.remove(namespace, key)?;
                Ok(None)
            }
        }
    }

    pub fn put_json<T: Serialize + ?Sized>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.put(namespace, key, &bytes)
    }

    /// Returns whether an entry existed.
    pub fn remove(&self, namespace: &str, key: &str) -> Result<bool, CacheError> {
        let path = self.path_for(namespace, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    pub fn clear_queue(&self, resource: ResourceType) -> Result<bool, CacheError> {
        self.remove(UPDATES_NAMESPACE, &queue_key(resource))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.display().to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Queue persistence
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct QueueDocument<'a> {
    updated_at: String,
    #[serde(flatten)]
    queue: &'a UpdateQueue,
}

impl QueueStore for CacheStore {
    fn load_queue(&self, resource: ResourceType) -> Result<UpdateQueue, StoreError> {
        let key = queue_key(resource);
        let Some(value) = self.get_json(UPDATES_NAMESPACE, &key)? else {
            debug!(%resource, "no persisted update queue");
            return Ok(UpdateQueue::default());
        };

        match serde_json::from_value::<UpdateQueue>(value) {
            Ok(queue) => {
                debug!(%resource, records = queue.len(), "loaded update queue");
                Ok(queue)
            }
            Err(e) => {
                warn!(%resource, error = %e, "update queue unreadable, starting empty");
                self.remove(UPDATES_NAMESPACE, &key)?;
                Ok(UpdateQueue::default())
            }
        }
    }

    fn save_queue(&self, resource: ResourceType, queue: &UpdateQueue) -> Result<(), StoreError> {
        let doc = QueueDocument {
            updated_at: chrono::Utc::now().to_rfc3339(),
            queue,
        };
        self.put_json(UPDATES_NAMESPACE, &queue_key(resource), &doc)?;
        Ok(())
    }
}
