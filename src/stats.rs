use crate::models::{ElementKind, ShapedElement};

/// Statistics collected during one pipeline run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessStats {
    pub elements_read: u64,
    pub nodes: u64,
    pub ways: u64,
    pub node_tags: u64,
    pub way_tags: u64,
    pub way_nodes: u64,
    pub skipped_tags: u64,
    pub skipped_refs: u64,
}

impl ProcessStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_elements(&mut self) {
        self.elements_read += 1;
    }

    /// Counts the rows of an accepted element.
    pub fn record(&mut self, shaped: &ShapedElement) {
        let tags = shaped.tags.len() as u64;
        match shaped.kind {
            ElementKind::Node => {
                self.nodes += 1;
                self.node_tags += tags;
            }
            ElementKind::Way => {
                self.ways += 1;
                self.way_tags += tags;
                self.way_nodes += shaped.way_nodes.len() as u64;
            }
        }
        self.skipped_tags += u64::from(shaped.skipped_tags);
        self.skipped_refs += u64::from(shaped.skipped_refs);
    }

    pub fn rows_written(&self) -> u64 {
        self.nodes + self.ways + self.node_tags + self.way_tags + self.way_nodes
    }
}
