//! Catalog types on both sides, their endpoints, and the default mapping
//! between each source/target pair.

pub mod source;
pub mod target;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mapping::{Mapping, MappingEntry, Transform};

/// Where a source (wiki) type is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceEndpoint {
    pub name: &'static str,
    pub path: &'static str,
    /// Listing follows `links.next` cursors.
    pub paginated: bool,
    /// Each listed row is a summary; the full record lives at the row's `link`.
    pub detail: bool,
}

/// Where a target (UEX) type is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetEndpoint {
    pub name: &'static str,
    pub path: &'static str,
    pub fan_out: Option<FanOut>,
}

/// Fetch once per instance of another target resource, e.g. `?id_category={id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    pub over: &'static TargetEndpoint,
    /// Query parameter added to each fetch.
    pub param: &'static str,
    /// Field of the dependency instance providing the parameter value.
    pub key: &'static str,
}

impl FanOut {
    pub fn query(&self, value: &str) -> String {
        format!("?{}={}", self.param, value)
    }
}

/// A reconciled resource: one source type, one target type, one mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Vehicles,
    Items,
}

impl ResourceType {
    pub const ALL: [ResourceType; 2] = [Self::Vehicles, Self::Items];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vehicles => "vehicles",
            Self::Items => "items",
        }
    }

    pub fn source_endpoint(&self) -> &'static SourceEndpoint {
        match self {
            Self::Vehicles => &source::WIKI_VEHICLES,
            Self::Items => &source::WIKI_ITEMS,
        }
    }

    pub fn target_endpoint(&self) -> &'static TargetEndpoint {
        match self {
            Self::Vehicles => &target::VEHICLES,
            Self::Items => &target::ITEMS,
        }
    }

    /// Built-in mapping, before validation.
    pub fn default_mapping(&self) -> Mapping {
        match self {
            Self::Items => Mapping::new(vec![MappingEntry::same("uuid")]),
            Self::Vehicles => Mapping::new(vec![
                MappingEntry::same("uuid"),
                MappingEntry::path("scu", "cargo_capacity"),
                MappingEntry::path("mass", "mass").with(Transform::Float),
                MappingEntry::path("length", "sizes.length").with(Transform::Round),
                MappingEntry::path("width", "sizes.beam").with(Transform::Round),
                MappingEntry::path("height", "sizes.height").with(Transform::Round),
                MappingEntry::path("fuel_hydrogen", "fuel.capacity").with(Transform::Float),
                MappingEntry::path("fuel_quantum", "quantum.quantum_fuel_capacity")
                    .with(Transform::Float),
            ]),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vehicles" | "vehicle" => Ok(Self::Vehicles),
            "items" | "item" => Ok(Self::Items),
            other => Err(format!("unknown resource '{other}' (expected vehicles or items)")),
        }
    }
}
