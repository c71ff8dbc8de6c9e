//! Source catalog models (Star Citizen Wiki API).

use serde::{Deserialize, Serialize};

use crate::model::{
    float, int, record, text, FieldAccess, FieldDef, FieldType, FieldValue, Resolved, ScalarKind,
    Schema, SourceRecord,
};

use super::SourceEndpoint;

pub const WIKI_ITEMS: SourceEndpoint = SourceEndpoint {
    name: "items",
    path: "/v2/items",
    paginated: true,
    detail: false,
};

/// Listing returns [`WikiVehicleSummary`] rows; each row's `link` holds the full record.
pub const WIKI_VEHICLES: SourceEndpoint = SourceEndpoint {
    name: "vehicles",
    path: "/v3/vehicles",
    paginated: true,
    detail: true,
};

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiManufacturer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Older item pages report the manufacturer as a bare name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Manufacturer {
    Record(WikiManufacturer),
    Name(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiItem {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub is_base_variant: Option<bool>,
    #[serde(default)]
    pub manufacturer: Option<Manufacturer>,
    pub link: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

const MANUFACTURER_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("name", ScalarKind::Text),
    FieldDef::scalar("code", ScalarKind::Text),
    FieldDef::scalar("link", ScalarKind::Text),
];

const WIKI_ITEM_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("uuid", ScalarKind::Text),
    FieldDef::scalar("name", ScalarKind::Text),
    FieldDef::scalar("type", ScalarKind::Text),
    FieldDef::scalar("sub_type", ScalarKind::Text),
    FieldDef::scalar("is_base_variant", ScalarKind::Bool),
    FieldDef::union(
        "manufacturer",
        &[
            FieldType::Record(MANUFACTURER_FIELDS),
            FieldType::Scalar(ScalarKind::Text),
        ],
    ),
    FieldDef::scalar("link", ScalarKind::Text),
    FieldDef::scalar("updated_at", ScalarKind::Text),
    FieldDef::scalar("version", ScalarKind::Text),
];

impl FieldAccess for WikiManufacturer {
    fn field(&self, name: &str) -> Option<Resolved<'_>> {
        match name {
            "name" => text(&self.name),
            "code" => text(&self.code),
            "link" => text(&self.link),
            _ => None,
        }
    }
}

impl FieldAccess for WikiItem {
    fn field(&self, name: &str) -> Option<Resolved<'_>> {
        match name {
            "uuid" => text(&self.uuid),
            "name" => text(&self.name),
            "type" => text(&self.kind),
            "sub_type" => text(&self.sub_type),
            "is_base_variant" => self.is_base_variant.map(|b| Resolved::Value(FieldValue::Bool(b))),
            "manufacturer" => match &self.manufacturer {
                Some(Manufacturer::Record(m)) => Some(Resolved::Record(m)),
                Some(Manufacturer::Name(n)) if !n.is_empty() => {
                    Some(Resolved::Value(FieldValue::Text(n.clone())))
                }
                _ => None,
            },
            "link" => Some(Resolved::Value(FieldValue::Text(self.link.clone()))),
            "updated_at" => text(&self.updated_at),
            "version" => text(&self.version),
            _ => None,
        }
    }
}

impl SourceRecord for WikiItem {
    const SCHEMA: Schema = Schema {
        model: "WikiItem",
        fields: WIKI_ITEM_FIELDS,
    };

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn link(&self) -> &str {
        &self.link
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

/// One row of the paginated vehicle listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiVehicleSummary {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub link: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WikiVehicleSizes {
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub beam: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WikiVehicleCrew {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WikiVehicleFuel {
    #[serde(default)]
    pub capacity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WikiVehicleQuantum {
    #[serde(default)]
    pub quantum_speed: Option<f64>,
    #[serde(default)]
    pub quantum_spool_time: Option<f64>,
    #[serde(default)]
    pub quantum_fuel_capacity: Option<f64>,
    #[serde(default)]
    pub quantum_range: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiVehicle {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    pub link: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub sizes: Option<WikiVehicleSizes>,
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub cargo_capacity: Option<f64>,
    #[serde(default)]
    pub crew: Option<WikiVehicleCrew>,
    #[serde(default)]
    pub fuel: Option<WikiVehicleFuel>,
    #[serde(default)]
    pub quantum: Option<WikiVehicleQuantum>,
}

const SIZES_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("length", ScalarKind::Float),
    FieldDef::scalar("beam", ScalarKind::Float),
    FieldDef::scalar("height", ScalarKind::Float),
];

const CREW_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("min", ScalarKind::Int),
    FieldDef::scalar("max", ScalarKind::Int),
];

const FUEL_FIELDS: &[FieldDef] = &[FieldDef::scalar("capacity", ScalarKind::Float)];

const QUANTUM_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("quantum_speed", ScalarKind::Float),
    FieldDef::scalar("quantum_spool_time", ScalarKind::Float),
    FieldDef::scalar("quantum_fuel_capacity", ScalarKind::Float),
    FieldDef::scalar("quantum_range", ScalarKind::Float),
];

const WIKI_VEHICLE_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("uuid", ScalarKind::Text),
    FieldDef::scalar("name", ScalarKind::Text),
    FieldDef::scalar("slug", ScalarKind::Text),
    FieldDef::scalar("link", ScalarKind::Text),
    FieldDef::scalar("class_name", ScalarKind::Text),
    FieldDef::record("sizes", SIZES_FIELDS),
    FieldDef::scalar("mass", ScalarKind::Float),
    FieldDef::scalar("cargo_capacity", ScalarKind::Float),
    FieldDef::record("crew", CREW_FIELDS),
    FieldDef::record("fuel", FUEL_FIELDS),
    FieldDef::record("quantum", QUANTUM_FIELDS),
];

impl FieldAccess for WikiVehicleSizes {
    fn field(&self, name: &str) -> Option<Resolved<'_>> {
        match name {
            "length" => float(self.length),
            "beam" => float(self.beam),
            "height" => float(self.height),
            _ => None,
        }
    }
}

impl FieldAccess for WikiVehicleCrew {
    fn field(&self, name: &str) -> Option<Resolved<'_>> {
        match name {
            "min" => int(self.min),
            "max" => int(self.max),
            _ => None,
        }
    }
}

impl FieldAccess for WikiVehicleFuel {
    fn field(&self, name: &str) -> Option<Resolved<'_>> {
        match name {
            "capacity" => float(self.capacity),
            _ => None,
        }
    }
}

impl FieldAccess for WikiVehicleQuantum {
    fn field(&self, name: &str) -> Option<Resolved<'_>> {
        match name {
            "quantum_speed" => float(self.quantum_speed),
            "quantum_spool_time" => float(self.quantum_spool_time),
            "quantum_fuel_capacity" => float(self.quantum_fuel_capacity),
            "quantum_range" => float(self.quantum_range),
            _ => None,
        }
    }
}

impl FieldAccess for WikiVehicle {
    fn field(&self, name: &str) -> Option<Resolved<'_>> {
        match name {
            "uuid" => text(&self.uuid),
            "name" => text(&self.name),
            "slug" => text(&self.slug),
            "link" => Some(Resolved::Value(FieldValue::Text(self.link.clone()))),
            "class_name" => text(&self.class_name),
            "sizes" => record(&self.sizes),
            "mass" => float(self.mass),
            "cargo_capacity" => float(self.cargo_capacity),
            "crew" => record(&self.crew),
            "fuel" => record(&self.fuel),
            "quantum" => record(&self.quantum),
            _ => None,
        }
    }
}

impl SourceRecord for WikiVehicle {
    const SCHEMA: Schema = Schema {
        model: "WikiVehicle",
        fields: WIKI_VEHICLE_FIELDS,
    };

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn link(&self) -> &str {
        &self.link
    }
}
