//! Declarative target-field → source-path mapping and its startup validation.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::{MappingError, TransformError};
use crate::model::{FieldDef, FieldType, FieldValue, Schema, SourceRecord, TargetRecord};

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Value conversion applied to a resolved source value before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Finite floats truncated toward zero; numeric text parsed.
    Int,
    /// Integers widened; numeric text parsed.
    Float,
    /// Any scalar rendered as text.
    Text,
    /// Numbers rounded to two decimals.
    Round,
    /// Text with surrounding whitespace removed.
    Trim,
}

impl Transform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Round => "round",
            Self::Trim => "trim",
        }
    }

    pub fn apply(&self, value: FieldValue) -> Result<FieldValue, TransformError> {
        let reject = |value: &FieldValue| TransformError {
            transform: self.as_str().to_string(),
            value: format!("{value:?}"),
        };

        match (self, value) {
            (Self::Int, FieldValue::Int(n)) => Ok(FieldValue::Int(n)),
            (Self::Int, FieldValue::Float(x)) if x.is_finite() => Ok(FieldValue::Int(x.trunc() as i64)),
            (Self::Int, FieldValue::Text(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Ok(FieldValue::Int(n)),
                Err(_) => Err(reject(&FieldValue::Text(s))),
            },

            (Self::Float, FieldValue::Int(n)) => Ok(FieldValue::Float(n as f64)),
            (Self::Float, FieldValue::Float(x)) => Ok(FieldValue::Float(x)),
            (Self::Float, FieldValue::Text(s)) => match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(FieldValue::Float(x)),
                _ => Err(reject(&FieldValue::Text(s))),
            },

            (Self::Text, v) => Ok(FieldValue::Text(v.to_string())),

            (Self::Round, FieldValue::Int(n)) => Ok(FieldValue::Int(n)),
            (Self::Round, FieldValue::Float(x)) if x.is_finite() => {
                Ok(FieldValue::Float((x * 100.0).round() / 100.0))
            }

            (Self::Trim, FieldValue::Text(s)) => Ok(FieldValue::Text(s.trim().to_string())),

            (_, v) => Err(reject(&v)),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Mapping table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub target: String,
    /// Dotted path on the source record. `None` = same name as `target`.
    pub source: Option<String>,
    pub transform: Option<Transform>,
}

impl MappingEntry {
    pub fn same(target: &str) -> Self {
        Self {
            target: target.to_string(),
            source: None,
            transform: None,
        }
    }

    pub fn path(target: &str, source: &str) -> Self {
        Self {
            target: target.to_string(),
            source: Some(source.to_string()),
            transform: None,
        }
    }

    pub fn with(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn source_path(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.target)
    }
}

/// Unvalidated mapping table. Only a [`ValidatedMapping`] can drive a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    pub entries: Vec<MappingEntry>,
}

impl Mapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    /// Check every target key against `T`'s schema and every source path
    /// against `S`'s schema.
    pub fn validate<S: SourceRecord, T: TargetRecord>(
        self,
    ) -> Result<ValidatedMapping<S, T>, MappingError> {
        validate_entries(&self.entries, &S::SCHEMA, &T::SCHEMA)?;
        Ok(ValidatedMapping {
            entries: self.entries,
            _types: PhantomData,
        })
    }
}

/// A mapping proven valid for source type `S` and target type `T`.
#[derive(Debug)]
pub struct ValidatedMapping<S, T> {
    entries: Vec<MappingEntry>,
    _types: PhantomData<fn(&S, &T)>,
}

impl<S, T> ValidatedMapping<S, T> {
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }
}

impl<S, T> Clone for ValidatedMapping<S, T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            _types: PhantomData,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_entries(
    entries: &[MappingEntry],
    source: &Schema,
    target: &Schema,
) -> Result<(), MappingError> {
    let mut seen = BTreeSet::new();

    for entry in entries {
        if !seen.insert(entry.target.as_str()) {
            return Err(MappingError::DuplicateKey(entry.target.clone()));
        }

        if target.field(&entry.target).is_none() {
            return Err(MappingError::UnknownTargetField {
                key: entry.target.clone(),
                model: target.model.to_string(),
            });
        }

        validate_path(&entry.target, entry.source_path(), source)?;
    }

    Ok(())
}

/// A path is valid if every segment is found on at least one of the record
/// shapes reachable so far. Union fields contribute all of their record branches.
pub fn validate_path(key: &str, path: &str, schema: &Schema) -> Result<(), MappingError> {
    let mut frontier: Vec<&'static [FieldDef]> = vec![schema.fields];
    let mut resolved: Vec<&str> = Vec::new();

    for segment in path.split('.') {
        let mut next = Vec::new();
        let mut found = false;

        for fields in &frontier {
            if let Some(def) = fields.iter().find(|f| f.name == segment) {
                found = true;
                expand_records(&def.ty, &mut next);
            }
        }

        if !found {
            return Err(MappingError::UnresolvablePath {
                key: key.to_string(),
                path: path.to_string(),
                model: schema.model.to_string(),
                segment: segment.to_string(),
                resolved: if resolved.is_empty() {
                    "<root>".to_string()
                } else {
                    resolved.join(".")
                },
            });
        }

        resolved.push(segment);
        frontier = next;
    }

    Ok(())
}

fn expand_records(ty: &FieldType, out: &mut Vec<&'static [FieldDef]>) {
    match ty {
        FieldType::Scalar(_) => {}
        FieldType::Record(fields) => out.push(*fields),
        FieldType::Union(branches) => {
            for branch in branches.iter() {
                expand_records(branch, out);
            }
        }
    }
}
