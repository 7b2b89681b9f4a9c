//! osm-wrangle: OpenStreetMap XML to relational CSV tables
//!
//! This crate streams an OSM XML document once and writes five CSV tables that load
//! directly into a relational schema:
//!
//! | table            | columns                                                  |
//! |------------------|----------------------------------------------------------|
//! | `nodes.csv`      | `id, lat, lon, user, uid, version, changeset, timestamp` |
//! | `nodes_tags.csv` | `id, key, value, type`                                   |
//! | `ways.csv`       | `id, user, uid, version, changeset, timestamp`           |
//! | `ways_tags.csv`  | `id, key, value, type`                                   |
//! | `ways_nodes.csv` | `id, node_id, position`                                  |
//!
//! # Architecture
//!
//! One element at a time flows through:
//!
//! 1. **Read** -- [`parser::OsmReader`] yields each `node`/`way` with its direct
//!    children once its end tag is seen, then forgets it
//! 2. **Shape** -- [`shape::shape_element`] keeps only schema-declared attributes,
//!    classifies tag keys into a namespace and key, and numbers way-node references
//! 3. **Validate** (optional) -- [`validate::validate_element`] checks the shaped
//!    element against [`schema`]; the first failure stops the run
//! 4. **Write** -- [`writer::TableWriter`] appends the rows in shaping order
//!
//! Bad tag keys and non-integer node references are dropped silently. A primary record
//! that fails validation is fatal, since it points at a problem with the source itself.
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML reader with BZ2 decompression
//! - [`classify`] -- Tag key classification (problem characters, namespaces)
//! - [`shape`] -- Element to record bundle conversion
//! - [`schema`] -- Declarative field schemas with coercions
//! - [`validate`] -- Schema gate and validation errors
//! - [`writer`] -- CSV table sinks with fixed column order
//! - [`pipeline`] -- Single-pass driver
//! - [`models`] -- Core data types (Value, PrimaryRecord, Tag, WayNode)
//! - [`stats`] -- Row and drop counters
//! - [`config`] -- Constants for paths, file names and buffers
//!
//! # Example Usage
//!
//! ```bash
//! # Write the five tables for a compressed extract into out/
//! osm-wrangle -i chicago.osm.bz2 -o out/
//!
//! # Skip the schema gate for a faster pass
//! osm-wrangle -i chicago.osm -o out/ --validate false
//! ```

pub mod classify;
pub mod config;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod shape;
pub mod stats;
pub mod validate;
pub mod writer;
