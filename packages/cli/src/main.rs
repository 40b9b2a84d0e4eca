#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the earthquake keys lookup.
//!
//! Uses `indicatif-log-bridge` (via [`quake_keys_cli_utils::init_logger`])
//! so that log lines and the batch progress bar share the terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use quake_keys_catalog::Catalog;
use quake_keys_cli_utils::{IndicatifProgress, MultiProgress};
use quake_keys_keys_models::ResolvedKey;
use quake_keys_location_models::LocationRecord;
use quake_keys_lookup::output::KEYS_JSON_FILE;
use quake_keys_lookup::{KeySummary, KeysCsvWriter, KeysLookup, LookupConfig, write_json_lines};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "quake_keys", about = "Earthquake keys lookup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// `keys.csv` plus `keys-errors.csv`
    Csv,
    /// `keys.jsonl`, one key per line
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a location file to area peril and vulnerability keys
    Resolve {
        /// Lookup config file (TOML)
        #[arg(long, required_unless_present = "keys_dir")]
        config: Option<PathBuf>,
        /// Keys data directory (overrides the config file's)
        #[arg(long)]
        keys_dir: Option<PathBuf>,
        /// Location CSV file
        #[arg(long)]
        locations: PathBuf,
        /// Directory to write key files to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
        /// Resolve chunks concurrently with this many workers
        #[arg(long)]
        concurrency: Option<usize>,
        /// Locations per concurrent chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Print statistics for a hazard-zone catalog
    Catalog {
        /// Keys data directory
        #[arg(long)]
        keys_dir: PathBuf,
        /// Catalog file name within the keys data directory
        #[arg(long, default_value = "areaperil_dict.csv")]
        areaperil_file: String,
    },
    /// Print the construction code / storeys to taxonomy table
    Taxonomy,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = quake_keys_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            config,
            keys_dir,
            locations,
            output_dir,
            format,
            concurrency,
            chunk_size,
        } => {
            let mut config = match (config, keys_dir) {
                (Some(path), keys_dir) => {
                    let mut config = LookupConfig::load(&path)?;
                    if let Some(dir) = keys_dir {
                        config.keys_data_directory = dir;
                    }
                    config
                }
                (None, Some(dir)) => LookupConfig::new(dir),
                (None, None) => return Err("either --config or --keys-dir is required".into()),
            };
            let concurrent = concurrency.is_some() || chunk_size.is_some();
            if let Some(n) = concurrency {
                config.batch.concurrency = n;
            }
            if let Some(n) = chunk_size {
                config.batch.chunk_size = n;
            }

            let start = Instant::now();
            let lookup = KeysLookup::from_config(&config)?;
            let records = lookup.load_locations(&locations)?;

            let keys = if concurrent {
                resolve_concurrently(lookup, records, &config, &multi).await?
            } else {
                lookup.process_locations(records).collect()
            };

            let summary = write_keys(&keys, &output_dir, format)?;
            log::info!(
                "Resolution complete: {summary} in {:.1}s",
                start.elapsed().as_secs_f64()
            );
        }
        Commands::Catalog {
            keys_dir,
            areaperil_file,
        } => {
            let catalog = Catalog::load(&keys_dir.join(areaperil_file))?;
            println!("Cells:          {}", catalog.cells().len());
            println!("Spatial cells:  {}", catalog.spatial_cell_count());
            println!("Fallback rows:  {}", catalog.fallback_rows().len());
            println!();
            println!("{:<20} CELLS", "IMT");
            println!("{}", "-".repeat(30));
            for (imt, count) in catalog.imt_counts() {
                println!("{imt:<20} {count}");
            }
        }
        Commands::Taxonomy => {
            println!("{:<6} {:>7}  TAXONOMY", "CODE", "STOREYS");
            println!("{}", "-".repeat(40));
            for entry in quake_keys_taxonomy::entries() {
                println!(
                    "{:<6} {:>7}  {}",
                    entry.construction_code, entry.number_of_storeys, entry.taxonomy
                );
            }
        }
    }

    Ok(())
}

async fn resolve_concurrently(
    lookup: KeysLookup,
    records: Vec<LocationRecord>,
    config: &LookupConfig,
    multi: &MultiProgress,
) -> Result<Vec<ResolvedKey>, Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling batch");
            on_interrupt.cancel();
        }
    });

    let progress = IndicatifProgress::locations_bar(multi, "Resolving locations");
    let keys = Arc::new(lookup)
        .resolve_batch(records, &config.batch, &cancel, progress)
        .await?;
    Ok(keys)
}

fn write_keys(
    keys: &[ResolvedKey],
    output_dir: &Path,
    format: OutputFormat,
) -> Result<KeySummary, Box<dyn std::error::Error>> {
    let summary = match format {
        OutputFormat::Csv => {
            let mut writer = KeysCsvWriter::create(output_dir)?;
            writer.write_all(keys)?;
            writer.finish()?
        }
        OutputFormat::Json => {
            std::fs::create_dir_all(output_dir)?;
            let file = std::fs::File::create(output_dir.join(KEYS_JSON_FILE))?;
            write_json_lines(std::io::BufWriter::new(file), keys)?
        }
    };
    log::info!("Wrote keys to {}", output_dir.display());
    Ok(summary)
}
