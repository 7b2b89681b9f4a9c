use anyhow::Result;
use clap::Parser;
use osm_wrangle::config::{DEFAULT_OSM_PATH, DEFAULT_OUTPUT_DIR};
use osm_wrangle::pipeline::{run_pipeline, PipelineConfig};
use osm_wrangle::writer::Table;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "osm-wrangle")]
#[command(about = "Stream OpenStreetMap XML into CSV tables for relational import")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the OSM XML file (.osm or .osm.bz2)
    #[arg(short, long, default_value = DEFAULT_OSM_PATH)]
    input: String,

    /// Output directory for the CSV tables
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: String,

    /// Validate every shaped element against the schema (aborts on first failure)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    validate: bool,

    /// Limit number of elements to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Dry run - don't write output files
    #[arg(long)]
    dry_run: bool,
}

fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig {
        input: cli.input,
        output_dir: cli.output,
        validate: cli.validate,
        limit: cli.limit,
        dry_run: cli.dry_run,
    };

    let start = Instant::now();
    let stats = run_pipeline(&config)?;
    let duration = start.elapsed();
    info!(duration_secs = duration.as_secs_f64(), "Processing complete");

    println!();
    println!("=== Summary ===");
    println!("Processing time:    {:.2}s", duration.as_secs_f64());
    println!("Elements read:      {}", stats.elements_read);
    println!("Nodes:              {}", stats.nodes);
    println!("Node tags:          {}", stats.node_tags);
    println!("Ways:               {}", stats.ways);
    println!("Way tags:           {}", stats.way_tags);
    println!("Way nodes:          {}", stats.way_nodes);
    println!("Skipped tags:       {}", stats.skipped_tags);
    println!("Skipped node refs:  {}", stats.skipped_refs);
    if !config.dry_run {
        println!();
        for table in Table::ALL {
            println!(
                "Wrote {}",
                Path::new(&config.output_dir).join(table.file_name()).display()
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG, when set, takes precedence over -v
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
