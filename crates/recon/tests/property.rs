// Property-based tests for the diff rule and mapping validation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;

use catsync_recon::catalog::source::WikiVehicle;
use catsync_recon::catalog::target::UexVehicle;
use catsync_recon::engine::diff_record;
use catsync_recon::model::TargetRecord;
use catsync_recon::{FieldValue, Mapping, MappingEntry};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Mostly small integers so equal values come up often; sometimes zero or unset.
fn arb_amount() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(0.0)),
        4 => (1u32..6).prop_map(|n| Some(n as f64)),
    ]
}

fn arb_path() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("cargo_capacity".to_string()),
        Just("mass".to_string()),
        Just("sizes.beam".to_string()),
        Just("sizes.width".to_string()),
        Just("crew.max".to_string()),
        Just("quantum.quantum_range".to_string()),
        Just("fuel".to_string()),
        Just("fuel.capacity.value".to_string()),
        Just("hull".to_string()),
    ]
}

fn arb_target_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("scu".to_string()),
        Just("mass".to_string()),
        Just("width".to_string()),
        Just("cargo".to_string()),
        Just("beam".to_string()),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    /// A field is changed iff the source value is set, non-zero and differs.
    #[test]
    fn field_inclusion_rule(source_scu in arb_amount(), source_mass in arb_amount(),
                            target_scu in arb_amount(), target_mass in arb_amount()) {
        let mapping = Mapping::new(vec![
            MappingEntry::path("scu", "cargo_capacity"),
            MappingEntry::same("mass"),
        ])
        .validate::<WikiVehicle, UexVehicle>()
        .unwrap();

        let source: WikiVehicle = serde_json::from_value(serde_json::json!({
            "name": "Aurora", "link": "l", "cargo_capacity": source_scu, "mass": source_mass
        })).unwrap();
        let target: UexVehicle = serde_json::from_value(serde_json::json!({
            "id": 1, "name": "Aurora", "scu": target_scu.unwrap_or(0.0), "mass": target_mass
        })).unwrap();

        let (changes, provenance) = diff_record(&source, &target, &mapping);

        for (field, value) in [("scu", source_scu), ("mass", source_mass)] {
            let expected = match value {
                None => false,
                Some(v) if v == 0.0 => false,
                Some(v) => !target.value(field).is_some_and(|cur| cur.same_as(&FieldValue::Float(v))),
            };
            prop_assert_eq!(changes.contains_key(field), expected, "field {}", field);
            prop_assert_eq!(provenance.contains_key(field), expected);
        }
    }

    /// Validation fails iff the key is not a target field or the path does
    /// not resolve through the source schema.
    #[test]
    fn validation_matches_schema(key in arb_target_key(), path in arb_path()) {
        let key_ok = UexVehicle::SCHEMA.field(&key).is_some();
        let path_ok = matches!(
            path.as_str(),
            "cargo_capacity" | "mass" | "sizes.beam" | "crew.max" | "quantum.quantum_range" | "fuel"
        );

        let result = Mapping::new(vec![MappingEntry::path(&key, &path)])
            .validate::<WikiVehicle, UexVehicle>();
        prop_assert_eq!(result.is_ok(), key_ok && path_ok, "{} <- {}", key, path);
    }
}
