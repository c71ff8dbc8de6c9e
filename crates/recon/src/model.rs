use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single scalar field value, as read from either catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(x) => Some(*x),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric zero. Booleans and text are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(n) => *n == 0,
            Self::Float(x) => *x == 0.0,
            Self::Bool(_) | Self::Text(_) => false,
        }
    }

    /// Equality used by the diff engine: numbers compare by value across
    /// `Int`/`Float`, everything else compares structurally.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::Int(_) => ScalarKind::Int,
            Self::Float(_) => ScalarKind::Float,
            Self::Text(_) => ScalarKind::Text,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Text,
}

/// Declared type of a schema field. Optional fields are declared by their
/// inner type; absence is a runtime property, not a schema one.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Scalar(ScalarKind),
    Record(&'static [FieldDef]),
    /// Any of the listed branches. A path resolves if it resolves on one of them.
    Union(&'static [FieldType]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub const fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self { name, ty: FieldType::Scalar(kind) }
    }

    pub const fn record(name: &'static str, fields: &'static [FieldDef]) -> Self {
        Self { name, ty: FieldType::Record(fields) }
    }

    pub const fn union(name: &'static str, branches: &'static [FieldType]) -> Self {
        Self { name, ty: FieldType::Union(branches) }
    }
}

/// Named field tree of one catalog type.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub model: &'static str,
    pub fields: &'static [FieldDef],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ---------------------------------------------------------------------------
// Runtime access
// ---------------------------------------------------------------------------

/// Result of reading one field off a source record.
pub enum Resolved<'a> {
    Value(FieldValue),
    Record(&'a dyn FieldAccess),
}

/// Field-by-name access on source records, one level at a time.
///
/// Returns `None` for unknown names and for fields that are unset.
pub trait FieldAccess {
    fn field(&self, name: &str) -> Option<Resolved<'_>>;
}

/// A wiki-side record: joined by `name`, carries a provenance `link`.
pub trait SourceRecord: FieldAccess {
    const SCHEMA: Schema;

    fn name(&self) -> Option<&str>;
    fn link(&self) -> &str;
}

/// A target-side record with a numeric identity.
pub trait TargetRecord {
    const SCHEMA: Schema;

    fn id(&self) -> u64;
    fn name(&self) -> Option<&str>;
    /// Current value of a business field, `None` when unset.
    fn value(&self, field: &str) -> Option<FieldValue>;
}

/// Walk a dotted path through nested records. Any unset segment yields `None`,
/// as does a path ending on a record instead of a value.
pub fn resolve_path(record: &dyn FieldAccess, path: &str) -> Option<FieldValue> {
    let mut segments = path.split('.').peekable();
    let mut current = record;

    while let Some(segment) = segments.next() {
        match current.field(segment)? {
            Resolved::Value(value) => {
                return if segments.peek().is_none() { Some(value) } else { None };
            }
            Resolved::Record(next) => current = next,
        }
    }

    None
}

/// Helpers for `FieldAccess` impls.
pub(crate) fn text(value: &Option<String>) -> Option<Resolved<'static>> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| Resolved::Value(FieldValue::Text(s.to_string())))
}

pub(crate) fn int(value: Option<i64>) -> Option<Resolved<'static>> {
    value.map(|n| Resolved::Value(FieldValue::Int(n)))
}

pub(crate) fn float(value: Option<f64>) -> Option<Resolved<'static>> {
    value.map(|x| Resolved::Value(FieldValue::Float(x)))
}

pub(crate) fn record<T: FieldAccess>(value: &Option<T>) -> Option<Resolved<'_>> {
    value.as_ref().map(|r| Resolved::Record(r as &dyn FieldAccess))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inner {
        beam: Option<f64>,
    }

    impl FieldAccess for Inner {
        fn field(&self, name: &str) -> Option<Resolved<'_>> {
            match name {
                "beam" => float(self.beam),
                _ => None,
            }
        }
    }

    struct Outer {
        name: Option<String>,
        sizes: Option<Inner>,
    }

    impl FieldAccess for Outer {
        fn field(&self, name: &str) -> Option<Resolved<'_>> {
            match name {
                "name" => text(&self.name),
                "sizes" => record(&self.sizes),
                _ => None,
            }
        }
    }

    #[test]
    fn resolves_nested_paths() {
        let outer = Outer {
            name: Some("Aurora".into()),
            sizes: Some(Inner { beam: Some(12.5) }),
        };
        assert_eq!(resolve_path(&outer, "name"), Some(FieldValue::Text("Aurora".into())));
        assert_eq!(resolve_path(&outer, "sizes.beam"), Some(FieldValue::Float(12.5)));
    }

    #[test]
    fn unset_segment_short_circuits() {
        let outer = Outer { name: None, sizes: None };
        assert_eq!(resolve_path(&outer, "sizes.beam"), None);
        assert_eq!(resolve_path(&outer, "name"), None);
    }

    #[test]
    fn path_through_scalar_or_ending_on_record_is_none() {
        let outer = Outer {
            name: Some("Aurora".into()),
            sizes: Some(Inner { beam: Some(1.0) }),
        };
        assert_eq!(resolve_path(&outer, "name.first"), None);
        assert_eq!(resolve_path(&outer, "sizes"), None);
    }

    #[test]
    fn empty_text_is_absent() {
        let outer = Outer { name: Some(String::new()), sizes: None };
        assert_eq!(resolve_path(&outer, "name"), None);
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert!(FieldValue::Int(12).same_as(&FieldValue::Float(12.0)));
        assert!(!FieldValue::Int(12).same_as(&FieldValue::Float(12.5)));
        assert!(!FieldValue::Text("12".into()).same_as(&FieldValue::Int(12)));
        assert!(FieldValue::Float(0.0).is_zero());
        assert!(FieldValue::Int(0).is_zero());
        assert!(!FieldValue::Text("0".into()).is_zero());
    }

    #[test]
    fn untagged_serde_keeps_kinds() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[true, 3, 12.0, "abc"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Bool(true),
                FieldValue::Int(3),
                FieldValue::Float(12.0),
                FieldValue::Text("abc".into()),
            ]
        );
    }
}
