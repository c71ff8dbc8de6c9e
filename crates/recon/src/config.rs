//! Mapping override files.
//!
//! ```toml
//! [vehicles]
//! uuid = {}
//! scu = "cargo_capacity"
//! length = { path = "sizes.length", transform = "round" }
//! ```
//!
//! A table replaces the built-in mapping for its resource; resources without a
//! table keep their defaults.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::catalog::ResourceType;
use crate::error::MappingError;
use crate::mapping::{Mapping, MappingEntry, Transform};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    /// Dotted source path shorthand: `"sizes.beam"`.
    Path(String),
    Spec(EntryDetail),
}

/// Full entry. Omitting `path` means "same name on both sides".
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryDetail {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone, Default)]
pub struct MappingConfig {
    overrides: BTreeMap<ResourceType, Mapping>,
}

impl MappingConfig {
    pub fn from_toml(input: &str) -> Result<Self, MappingError> {
        let raw: BTreeMap<String, BTreeMap<String, EntrySpec>> =
            toml::from_str(input).map_err(|e| MappingError::Parse(e.to_string()))?;

        let mut overrides = BTreeMap::new();
        for (resource_name, table) in raw {
            let resource: ResourceType = resource_name
                .parse()
                .map_err(|_| MappingError::UnknownResource(resource_name.clone()))?;

            let entries = table
                .into_iter()
                .map(|(target, spec)| match spec {
                    EntrySpec::Path(path) => MappingEntry {
                        target,
                        source: Some(path),
                        transform: None,
                    },
                    EntrySpec::Spec(detail) => MappingEntry {
                        target,
                        source: detail.path,
                        transform: detail.transform,
                    },
                })
                .collect();

            overrides.insert(resource, Mapping::new(entries));
        }

        Ok(Self { overrides })
    }

    /// Override for `resource`, or its built-in mapping.
    pub fn mapping_for(&self, resource: ResourceType) -> Mapping {
        self.overrides
            .get(&resource)
            .cloned()
            .unwrap_or_else(|| resource.default_mapping())
    }

    pub fn has_override(&self, resource: ResourceType) -> bool {
        self.overrides.contains_key(&resource)
    }
}
