use crate::config::CSV_BUFFER_SIZE;
use crate::models::{ElementKind, Fields, ShapedElement};
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// The five output tables. Column order must match the relational schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Nodes,
    NodeTags,
    Ways,
    WayNodes,
    WayTags,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Nodes,
        Table::NodeTags,
        Table::Ways,
        Table::WayNodes,
        Table::WayTags,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Table::Nodes => "nodes.csv",
            Table::NodeTags => "nodes_tags.csv",
            Table::Ways => "ways.csv",
            Table::WayNodes => "ways_nodes.csv",
            Table::WayTags => "ways_tags.csv",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Nodes => &[
                "id",
                "lat",
                "lon",
                "user",
                "uid",
                "version",
                "changeset",
                "timestamp",
            ],
            Table::NodeTags | Table::WayTags => &["id", "key", "value", "type"],
            Table::Ways => &["id", "user", "uid", "version", "changeset", "timestamp"],
            Table::WayNodes => &["id", "node_id", "position"],
        }
    }
}

type CsvSink = Writer<BufWriter<File>>;

/// Appends shaped elements to the five CSV tables under one directory.
///
/// Rows are written in the order the shaper produced them; nothing is sorted,
/// deduplicated or held back beyond the write buffers.
pub struct TableWriter {
    nodes: CsvSink,
    node_tags: CsvSink,
    ways: CsvSink,
    way_nodes: CsvSink,
    way_tags: CsvSink,
}

impl TableWriter {
    /// Creates (truncating) every table file and writes its header row.
    pub fn create(output_dir: &Path) -> Result<Self> {
        Ok(Self {
            nodes: open_table(output_dir, Table::Nodes)?,
            node_tags: open_table(output_dir, Table::NodeTags)?,
            ways: open_table(output_dir, Table::Ways)?,
            way_nodes: open_table(output_dir, Table::WayNodes)?,
            way_tags: open_table(output_dir, Table::WayTags)?,
        })
    }

    pub fn write(&mut self, shaped: &ShapedElement) -> Result<()> {
        match shaped.kind {
            ElementKind::Node => {
                write_primary(&mut self.nodes, Table::Nodes, shaped)?;
                for tag in &shaped.tags {
                    self.node_tags.serialize(tag)?;
                }
            }
            ElementKind::Way => {
                write_primary(&mut self.ways, Table::Ways, shaped)?;
                for way_node in &shaped.way_nodes {
                    self.way_nodes.serialize(way_node)?;
                }
                for tag in &shaped.tags {
                    self.way_tags.serialize(tag)?;
                }
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        for (table, sink) in [
            (Table::Nodes, &mut self.nodes),
            (Table::NodeTags, &mut self.node_tags),
            (Table::Ways, &mut self.ways),
            (Table::WayNodes, &mut self.way_nodes),
            (Table::WayTags, &mut self.way_tags),
        ] {
            sink.flush()
                .with_context(|| format!("Failed to flush {}", table.file_name()))?;
        }
        Ok(())
    }
}

fn open_table(output_dir: &Path, table: Table) -> Result<CsvSink> {
    let path = output_dir.join(table.file_name());
    let file = File::create(&path)
        .with_context(|| format!("Failed to create table file: {}", path.display()))?;
    // Header is written by hand so `serialize` never emits one of its own
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::with_capacity(CSV_BUFFER_SIZE, file));
    writer
        .write_record(table.columns())
        .with_context(|| format!("Failed to write header for {}", table.file_name()))?;
    Ok(writer)
}

fn write_primary(sink: &mut CsvSink, table: Table, shaped: &ShapedElement) -> Result<()> {
    let row = table.columns().iter().map(|column| {
        shaped
            .primary
            .field(column)
            .map(|value| value.to_string())
            .unwrap_or_default()
    });
    sink.write_record(row)
        .with_context(|| format!("Failed to write row to {}", table.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrimaryRecord, Tag, Value, WayNode};
    use std::fs;
    use tempfile::TempDir;

    fn read_table(dir: &TempDir, table: Table) -> Vec<String> {
        fs::read_to_string(dir.path().join(table.file_name()))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn tag(parent: i64, key: &str, value: &str, namespace: &str) -> Tag {
        Tag {
            parent_id: Some(Value::Integer(parent)),
            key: key.into(),
            value: value.into(),
            namespace: namespace.into(),
        }
    }

    #[test]
    fn headers_match_column_contract() -> Result<()> {
        let dir = TempDir::new()?;
        let mut writer = TableWriter::create(dir.path())?;
        writer.flush()?;

        assert_eq!(
            read_table(&dir, Table::Nodes),
            vec!["id,lat,lon,user,uid,version,changeset,timestamp"]
        );
        assert_eq!(read_table(&dir, Table::NodeTags), vec!["id,key,value,type"]);
        assert_eq!(
            read_table(&dir, Table::Ways),
            vec!["id,user,uid,version,changeset,timestamp"]
        );
        assert_eq!(read_table(&dir, Table::WayNodes), vec!["id,node_id,position"]);
        assert_eq!(read_table(&dir, Table::WayTags), vec!["id,key,value,type"]);
        Ok(())
    }

    #[test]
    fn node_rows_follow_column_order() -> Result<()> {
        let dir = TempDir::new()?;
        let mut writer = TableWriter::create(dir.path())?;
        let shaped = ShapedElement {
            kind: ElementKind::Node,
            primary: PrimaryRecord {
                kind: ElementKind::Node,
                fields: vec![
                    ("id", Value::Integer(123)),
                    ("lat", Value::Float(45.0)),
                    ("lon", Value::Float(-93.0)),
                    ("user", Value::Text("amy, b".into())),
                ],
            },
            tags: vec![
                tag(123, "name", "Main St", "regular"),
                tag(123, "street", "Elm", "addr"),
            ],
            way_nodes: Vec::new(),
            skipped_tags: 0,
            skipped_refs: 0,
        };
        writer.write(&shaped)?;
        writer.flush()?;

        let nodes = read_table(&dir, Table::Nodes);
        assert_eq!(nodes[1], "123,45.0,-93.0,\"amy, b\",,,,");
        let tags = read_table(&dir, Table::NodeTags);
        assert_eq!(tags[1..], ["123,name,Main St,regular", "123,street,Elm,addr"]);
        assert_eq!(read_table(&dir, Table::WayTags).len(), 1);
        Ok(())
    }

    #[test]
    fn way_rows_go_to_way_tables() -> Result<()> {
        let dir = TempDir::new()?;
        let mut writer = TableWriter::create(dir.path())?;
        let shaped = ShapedElement {
            kind: ElementKind::Way,
            primary: PrimaryRecord {
                kind: ElementKind::Way,
                fields: vec![("id", Value::Integer(9)), ("version", Value::Integer(2))],
            },
            tags: vec![tag(9, "highway", "service", "regular")],
            way_nodes: vec![
                WayNode {
                    way_id: Some(Value::Integer(9)),
                    node_id: 5,
                    position: 0,
                },
                WayNode {
                    way_id: Some(Value::Integer(9)),
                    node_id: 3,
                    position: 1,
                },
            ],
            skipped_tags: 0,
            skipped_refs: 0,
        };
        writer.write(&shaped)?;
        writer.flush()?;

        assert_eq!(read_table(&dir, Table::Ways)[1], "9,,,2,,");
        assert_eq!(read_table(&dir, Table::WayNodes)[1..], ["9,5,0", "9,3,1"]);
        assert_eq!(
            read_table(&dir, Table::WayTags)[1..],
            ["9,highway,service,regular"]
        );
        assert_eq!(read_table(&dir, Table::Nodes).len(), 1);
        assert_eq!(read_table(&dir, Table::NodeTags).len(), 1);
        Ok(())
    }

    #[test]
    fn missing_parent_id_renders_empty_cell() -> Result<()> {
        let dir = TempDir::new()?;
        let mut writer = TableWriter::create(dir.path())?;
        let shaped = ShapedElement {
            kind: ElementKind::Node,
            primary: PrimaryRecord {
                kind: ElementKind::Node,
                fields: vec![("lat", Value::Float(1.5))],
            },
            tags: vec![Tag {
                parent_id: None,
                key: "name".into(),
                value: "x".into(),
                namespace: "regular".into(),
            }],
            way_nodes: Vec::new(),
            skipped_tags: 0,
            skipped_refs: 0,
        };
        writer.write(&shaped)?;
        writer.flush()?;

        assert_eq!(read_table(&dir, Table::Nodes)[1], ",1.5,,,,,,");
        assert_eq!(read_table(&dir, Table::NodeTags)[1], ",name,x,regular");
        Ok(())
    }
}
