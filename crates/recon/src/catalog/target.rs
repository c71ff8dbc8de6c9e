//! Target catalog models (UEX trading database, API 2.0).

use serde::{Deserialize, Deserializer};

use crate::model::{FieldDef, FieldValue, ScalarKind, Schema, TargetRecord};

use super::{FanOut, TargetEndpoint};

pub const CATEGORIES: TargetEndpoint = TargetEndpoint {
    name: "categories",
    path: "/categories",
    fan_out: None,
};

/// Items are only listable per category.
pub const ITEMS: TargetEndpoint = TargetEndpoint {
    name: "items",
    path: "/items",
    fan_out: Some(FanOut {
        over: &CATEGORIES,
        param: "id_category",
        key: "id",
    }),
};

pub const VEHICLES: TargetEndpoint = TargetEndpoint {
    name: "vehicles",
    path: "/vehicles",
    fan_out: None,
};

/// UEX encodes booleans as 0/1.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        None => false,
    })
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UexCategory {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_game_related: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_mining: bool,
    #[serde(default)]
    pub date_added: Option<i64>,
    #[serde(default)]
    pub date_modified: Option<i64>,
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UexItem {
    /// Route id, may change during website updates.
    pub id: u64,
    #[serde(default)]
    pub id_parent: u64,
    #[serde(default)]
    pub id_category: u64,
    #[serde(default)]
    pub id_company: u64,
    #[serde(default)]
    pub id_vehicle: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub url_store: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_exclusive_pledge: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_exclusive_subscriber: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_exclusive_concierge: bool,
    #[serde(default)]
    pub notification: Option<serde_json::Value>,
    #[serde(default)]
    pub date_added: Option<i64>,
    #[serde(default)]
    pub date_modified: Option<i64>,
}

const ITEM_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("id_parent", ScalarKind::Int),
    FieldDef::scalar("id_category", ScalarKind::Int),
    FieldDef::scalar("id_company", ScalarKind::Int),
    FieldDef::scalar("id_vehicle", ScalarKind::Int),
    FieldDef::scalar("name", ScalarKind::Text),
    FieldDef::scalar("section", ScalarKind::Text),
    FieldDef::scalar("category", ScalarKind::Text),
    FieldDef::scalar("company_name", ScalarKind::Text),
    FieldDef::scalar("vehicle_name", ScalarKind::Text),
    FieldDef::scalar("slug", ScalarKind::Text),
    FieldDef::scalar("uuid", ScalarKind::Text),
    FieldDef::scalar("url_store", ScalarKind::Text),
    FieldDef::scalar("is_exclusive_pledge", ScalarKind::Bool),
    FieldDef::scalar("is_exclusive_subscriber", ScalarKind::Bool),
    FieldDef::scalar("is_exclusive_concierge", ScalarKind::Bool),
];

fn text(value: &Option<String>) -> Option<FieldValue> {
    value.as_ref().map(|s| FieldValue::Text(s.clone()))
}

impl TargetRecord for UexItem {
    const SCHEMA: Schema = Schema {
        model: "UexItem",
        fields: ITEM_FIELDS,
    };

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id_parent" => Some(FieldValue::Int(self.id_parent as i64)),
            "id_category" => Some(FieldValue::Int(self.id_category as i64)),
            "id_company" => Some(FieldValue::Int(self.id_company as i64)),
            "id_vehicle" => Some(FieldValue::Int(self.id_vehicle as i64)),
            "name" => text(&self.name),
            "section" => text(&self.section),
            "category" => text(&self.category),
            "company_name" => text(&self.company_name),
            "vehicle_name" => text(&self.vehicle_name),
            "slug" => text(&self.slug),
            "uuid" => text(&self.uuid),
            "url_store" => text(&self.url_store),
            "is_exclusive_pledge" => Some(FieldValue::Bool(self.is_exclusive_pledge)),
            "is_exclusive_subscriber" => Some(FieldValue::Bool(self.is_exclusive_subscriber)),
            "is_exclusive_concierge" => Some(FieldValue::Bool(self.is_exclusive_concierge)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UexVehicle {
    pub id: u64,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_full: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub scu: f64,
    #[serde(default)]
    pub crew: Option<String>,
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub fuel_quantum: Option<f64>,
    #[serde(default)]
    pub fuel_hydrogen: Option<f64>,
}

const VEHICLE_FIELDS: &[FieldDef] = &[
    FieldDef::scalar("uuid", ScalarKind::Text),
    FieldDef::scalar("name", ScalarKind::Text),
    FieldDef::scalar("name_full", ScalarKind::Text),
    FieldDef::scalar("slug", ScalarKind::Text),
    FieldDef::scalar("scu", ScalarKind::Float),
    FieldDef::scalar("crew", ScalarKind::Text),
    FieldDef::scalar("mass", ScalarKind::Float),
    FieldDef::scalar("width", ScalarKind::Float),
    FieldDef::scalar("height", ScalarKind::Float),
    FieldDef::scalar("length", ScalarKind::Float),
    FieldDef::scalar("fuel_quantum", ScalarKind::Float),
    FieldDef::scalar("fuel_hydrogen", ScalarKind::Float),
];

impl TargetRecord for UexVehicle {
    const SCHEMA: Schema = Schema {
        model: "UexVehicle",
        fields: VEHICLE_FIELDS,
    };

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "uuid" => text(&self.uuid),
            "name" => text(&self.name),
            "name_full" => text(&self.name_full),
            "slug" => text(&self.slug),
            "scu" => Some(FieldValue::Float(self.scu)),
            "crew" => text(&self.crew),
            "mass" => self.mass.map(FieldValue::Float),
            "width" => self.width.map(FieldValue::Float),
            "height" => self.height.map(FieldValue::Float),
            "length" => self.length.map(FieldValue::Float),
            "fuel_quantum" => self.fuel_quantum.map(FieldValue::Float),
            "fuel_hydrogen" => self.fuel_hydrogen.map(FieldValue::Float),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_accepts_integer_flags() {
        let item: UexItem = serde_json::from_value(serde_json::json!({
            "id": 7,
            "id_category": 3,
            "name": "PowerBolt",
            "uuid": null,
            "is_exclusive_pledge": 1,
            "is_exclusive_subscriber": 0,
            "is_exclusive_concierge": false,
            "date_added": 1700000000
        }))
        .unwrap();

        assert_eq!(item.id, 7);
        assert!(item.is_exclusive_pledge);
        assert!(!item.is_exclusive_subscriber);
        assert_eq!(item.value("uuid"), None);
        assert_eq!(item.value("id_category"), Some(FieldValue::Int(3)));
    }

    #[test]
    fn every_schema_field_is_readable() {
        let vehicle: UexVehicle = serde_json::from_value(serde_json::json!({
            "id": 1, "uuid": "u", "name": "n", "name_full": "nf", "slug": "s",
            "scu": 2.0, "crew": "1,2", "mass": 1.0, "width": 1.0, "height": 1.0,
            "length": 1.0, "fuel_quantum": 1.0, "fuel_hydrogen": 1.0
        }))
        .unwrap();
        for field in UexVehicle::SCHEMA.fields {
            assert!(vehicle.value(field.name).is_some(), "{} unreadable", field.name);
        }
    }

    #[test]
    fn vehicle_scu_defaults_to_zero() {
        let vehicle: UexVehicle =
            serde_json::from_value(serde_json::json!({"id": 42, "name": "Aurora"})).unwrap();
        assert_eq!(vehicle.value("scu"), Some(FieldValue::Float(0.0)));
        assert_eq!(vehicle.value("mass"), None);
    }
}
