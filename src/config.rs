/// Source document used when no input path is given
pub const DEFAULT_OSM_PATH: &str = "example.osm";

/// Output directory used when none is given
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Namespace assigned to tag keys without a colon prefix
pub const DEFAULT_TAG_TYPE: &str = "regular";

/// Element names consumed by the pipeline (relations are skipped)
pub const ELEMENTS_OF_INTEREST: &[&str] = &["node", "way"];

/// Progress update interval (tick every N elements)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Buffer size for each CSV table writer
pub const CSV_BUFFER_SIZE: usize = 128 * 1024;

/// Buffer size for reading the (possibly decompressed) source document
pub const READ_BUFFER_SIZE: usize = 256 * 1024;
