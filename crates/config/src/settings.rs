// Application settings
// Loaded from ~/.config/catsync/settings.json (or --config / CATSYNC_CONFIG)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SOURCE_BASE_URL: &str = "https://api.star-citizen.wiki/api";
pub const DEFAULT_TARGET_BASE_URL: &str = "https://api.uexcorp.space/2.0";
pub const DEFAULT_TARGET_EDIT_URL: &str = "https://uexcorp.space/data/submit/type/request";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Storage
    #[serde(rename = "cache.dir")]
    pub cache_dir: Option<PathBuf>,

    #[serde(rename = "outbox.dir")]
    pub outbox_dir: Option<PathBuf>,

    // Wiki
    #[serde(rename = "source.baseUrl")]
    pub source_base_url: String,

    #[serde(rename = "source.pageLimit")]
    pub source_page_limit: u32,

    #[serde(rename = "source.locale")]
    pub source_locale: String,  // Empty = API default

    // UEX
    #[serde(rename = "target.baseUrl")]
    pub target_base_url: String,

    #[serde(rename = "target.editUrl")]
    pub target_edit_url: String,

    // HTTP
    #[serde(rename = "http.timeoutSecs")]
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            outbox_dir: None,
            source_base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            source_page_limit: 500,
            source_locale: "en_EN".to_string(),
            target_base_url: DEFAULT_TARGET_BASE_URL.to_string(),
            target_edit_url: DEFAULT_TARGET_EDIT_URL.to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Get the default settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("catsync");
        config_dir.join("settings.json")
    }

    /// Load from `path`, or from the default location. A missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::config_path()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let settings = Self::parse(&contents).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        if cleaned.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&cleaned)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.source_page_limit == 0 {
            return Err(SettingsError::Invalid {
                key: "source.pageLimit",
                reason: "must be at least 1".into(),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "http.timeoutSecs",
                reason: "must be at least 1".into(),
            });
        }
        for (key, url) in [
            ("source.baseUrl", &self.source_base_url),
            ("target.baseUrl", &self.target_base_url),
            ("target.editUrl", &self.target_edit_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SettingsError::Invalid {
                    key,
                    reason: format!("'{url}' is not an http(s) URL"),
                });
            }
        }
        Ok(())
    }

    /// `cache.dir`, or the platform cache directory.
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("catsync")
        })
    }

    /// `outbox.dir`, or `outbox/` under the cache directory.
    pub fn effective_outbox_dir(&self, cache_dir: &Path) -> PathBuf {
        self.outbox_dir
            .clone()
            .unwrap_or_else(|| cache_dir.join("outbox"))
    }

    pub fn locale(&self) -> Option<&str> {
        Some(self.source_locale.as_str()).filter(|l| !l.is_empty())
    }
}
