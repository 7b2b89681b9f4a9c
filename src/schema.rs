//! Declarative field schemas for every record kind in a shaped bundle.
//!
//! Every declared field is required. Shaping reads only the attributes declared
//! here (applying each field's coercion) and validation checks presence and type
//! against the same tables, so neither carries per-kind logic of its own.

use crate::models::{Value, ValueRef};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    String,
}

impl FieldType {
    pub fn matches(self, value: ValueRef<'_>) -> bool {
        matches!(
            (self, value),
            (FieldType::Integer, ValueRef::Integer(_))
                | (FieldType::Float, ValueRef::Float(_))
                | (FieldType::String, ValueRef::Text(_))
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::String => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    /// Parse the raw attribute into `field_type` while shaping
    pub coerce: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, field_type: FieldType, coerce: bool) -> Self {
        Self {
            name,
            field_type,
            coerce,
        }
    }

    /// Converts a raw attribute; on a failed parse the raw text is kept.
    pub fn coerce(&self, raw: &str) -> Value {
        if !self.coerce {
            return Value::Text(raw.to_string());
        }
        let trimmed = raw.trim();
        let parsed = match self.field_type {
            FieldType::Integer => trimmed.parse().ok().map(Value::Integer),
            FieldType::Float => trimmed.parse().ok().map(Value::Float),
            FieldType::String => None,
        };
        parsed.unwrap_or_else(|| Value::Text(raw.to_string()))
    }
}

use FieldType::{Float, Integer, String as Str};

pub const NODE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", Integer, true),
    FieldSpec::new("lat", Float, true),
    FieldSpec::new("lon", Float, true),
    FieldSpec::new("user", Str, false),
    FieldSpec::new("uid", Integer, true),
    FieldSpec::new("version", Integer, true),
    FieldSpec::new("changeset", Integer, true),
    FieldSpec::new("timestamp", Str, false),
];

pub const WAY_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", Integer, true),
    FieldSpec::new("user", Str, false),
    FieldSpec::new("uid", Integer, true),
    FieldSpec::new("version", Integer, true),
    FieldSpec::new("changeset", Integer, true),
    FieldSpec::new("timestamp", Str, false),
];

pub const TAG_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", Integer, true),
    FieldSpec::new("key", Str, false),
    FieldSpec::new("value", Str, false),
    FieldSpec::new("type", Str, false),
];

pub const WAY_NODE_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("id", Integer, true),
    FieldSpec::new("node_id", Integer, true),
    FieldSpec::new("position", Integer, false),
];
