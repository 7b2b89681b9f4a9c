use crate::schema::{FieldSpec, NODE_SCHEMA, WAY_SCHEMA};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
}

impl ElementKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "node" => Some(ElementKind::Node),
            "way" => Some(ElementKind::Way),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
        }
    }

    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            ElementKind::Node => NODE_SCHEMA,
            ElementKind::Way => WAY_SCHEMA,
        }
    }

    /// Name of the bundle section holding this kind's tags
    pub fn tags_section(self) -> &'static str {
        match self {
            ElementKind::Node => "node_tags",
            ElementKind::Way => "way_tags",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field value after schema coercion.
///
/// A raw attribute whose coercion fails stays as `Text` so validation can flag it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Float(f) => ValueRef::Float(*f),
            Value::Text(s) => ValueRef::Text(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_value_ref().fmt(f)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Integer(i) => serializer.serialize_i64(*i),
            // Same rendering as primary rows so every table agrees on float text
            Value::Float(_) => serializer.collect_str(self),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Borrowed view of a field, used by validation and row rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Integer(i64),
    Float(f64),
    Text(&'a str),
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRef::Integer(i) => write!(f, "{}", i),
            // Debug keeps the trailing `.0` on whole numbers (45.0, not 45)
            ValueRef::Float(v) => write!(f, "{:?}", v),
            ValueRef::Text(s) => f.write_str(s),
        }
    }
}

/// Named field lookup shared by primary records, tags and way nodes.
pub trait Fields {
    fn field(&self, name: &str) -> Option<ValueRef<'_>>;
}

/// Node or way attributes, in schema order. Missing attributes are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryRecord {
    pub kind: ElementKind,
    pub fields: Vec<(&'static str, Value)>,
}

impl PrimaryRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn id(&self) -> Option<&Value> {
        self.get("id")
    }
}

impl Fields for PrimaryRecord {
    fn field(&self, name: &str) -> Option<ValueRef<'_>> {
        self.get(name).map(Value::as_value_ref)
    }
}

/// One `nodes_tags` / `ways_tags` row. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    #[serde(rename = "id")]
    pub parent_id: Option<Value>,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub namespace: String,
}

impl Fields for Tag {
    fn field(&self, name: &str) -> Option<ValueRef<'_>> {
        match name {
            "id" => self.parent_id.as_ref().map(Value::as_value_ref),
            "key" => Some(ValueRef::Text(&self.key)),
            "value" => Some(ValueRef::Text(&self.value)),
            "type" => Some(ValueRef::Text(&self.namespace)),
            _ => None,
        }
    }
}

/// One `ways_nodes` row. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayNode {
    #[serde(rename = "id")]
    pub way_id: Option<Value>,
    pub node_id: i64,
    pub position: u32,
}

impl Fields for WayNode {
    fn field(&self, name: &str) -> Option<ValueRef<'_>> {
        match name {
            "id" => self.way_id.as_ref().map(Value::as_value_ref),
            "node_id" => Some(ValueRef::Integer(self.node_id)),
            "position" => Some(ValueRef::Integer(i64::from(self.position))),
            _ => None,
        }
    }
}

/// Everything shaped from one source element.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedElement {
    pub kind: ElementKind,
    pub primary: PrimaryRecord,
    pub tags: Vec<Tag>,
    /// Always empty for nodes
    pub way_nodes: Vec<WayNode>,
    pub skipped_tags: u32,
    pub skipped_refs: u32,
}
