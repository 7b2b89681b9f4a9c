use crate::config::{ELEMENTS_OF_INTEREST, PROGRESS_INTERVAL};
use crate::parser::OsmReader;
use crate::shape::shape_element;
use crate::stats::ProcessStats;
use crate::validate::validate_element;
use crate::writer::TableWriter;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: String,
    pub output_dir: String,
    /// Check every shaped element against the schema; the first failure aborts
    pub validate: bool,
    /// Stop after this many elements of interest
    pub limit: Option<u64>,
    /// Shape and validate without creating output files
    pub dry_run: bool,
}

/// Streams `config.input` once, writing each accepted element before reading the next.
///
/// Parse and validation errors abort the run; rows already written stay on disk.
pub fn run_pipeline(config: &PipelineConfig) -> Result<ProcessStats> {
    let reader = OsmReader::open(&config.input, ELEMENTS_OF_INTEREST)?;

    let mut writer = if config.dry_run {
        None
    } else {
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", config.output_dir)
        })?;
        Some(TableWriter::create(Path::new(&config.output_dir))?)
    };

    info!(
        input = %config.input,
        validate = config.validate,
        dry_run = config.dry_run,
        "Processing map"
    );

    let mut stats = ProcessStats::new();
    let pb = ProgressBar::new_spinner();

    for element in reader {
        if config.limit.is_some_and(|limit| stats.elements_read >= limit) {
            info!(limit = stats.elements_read, "Element limit reached");
            break;
        }

        let element = element.with_context(|| format!("Failed to parse {}", config.input))?;
        stats.inc_elements();

        let Some(shaped) = shape_element(&element) else {
            continue;
        };

        if config.validate {
            validate_element(&shaped)?;
        }

        if shaped.skipped_tags > 0 || shaped.skipped_refs > 0 {
            debug!(
                kind = %shaped.kind,
                id = ?shaped.primary.id(),
                skipped_tags = shaped.skipped_tags,
                skipped_refs = shaped.skipped_refs,
                "Dropped malformed sub-records"
            );
        }

        if let Some(writer) = writer.as_mut() {
            writer.write(&shaped)?;
        }
        stats.record(&shaped);

        if stats.elements_read % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }
    }

    pb.finish_and_clear();

    if let Some(writer) = writer.as_mut() {
        writer.flush()?;
    }

    info!(
        nodes = stats.nodes,
        ways = stats.ways,
        rows = stats.rows_written(),
        "Map processed"
    );

    Ok(stats)
}
