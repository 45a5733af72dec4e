//! Pushtrain CLI
//!
//! `fetch` runs the fetch-and-aggregate pipeline for a push-id window and
//! writes the dataset; `merge` concatenates dataset files into one training
//! input for the downstream trainer.

use clap::{Parser, Subcommand};
use pushtrain::{
    dataset, error::Result, pipeline, NoteScanPolicy, PipelineConfig,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pushtrain")]
#[command(about = "Builds labeled training datasets from a pushlog and build results", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a push window and write the aggregated dataset
    Fetch {
        /// Remote repository URL (last path segment names the repository)
        #[arg(long, env = "PUSHTRAIN_REMOTE")]
        remote: String,

        /// Build-result service URL
        #[arg(long, env = "PUSHTRAIN_BUILDS_URL")]
        builds_url: String,

        /// First push ID (inclusive)
        #[arg(long)]
        start: u64,

        /// Last push ID (inclusive)
        #[arg(long)]
        end: u64,

        /// Output path
        #[arg(short, long)]
        out: PathBuf,

        /// Number of concurrent fetch lanes
        #[arg(long, default_value = "10")]
        lanes: usize,

        /// Minimum delay between requests within a lane, in milliseconds
        #[arg(long, default_value = "10000")]
        delay_ms: u64,

        /// Only treat the first revision match of the first matching note as
        /// a backout target (legacy scan behavior)
        #[arg(long)]
        first_match_only: bool,
    },

    /// Merge dataset files into one training input
    Merge {
        /// Output path
        #[arg(short, long)]
        out: PathBuf,

        /// Dataset files to merge, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "pushtrain={},hyper=warn,reqwest=warn",
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Pushtrain v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Fetch {
            remote,
            builds_url,
            start,
            end,
            out,
            lanes,
            delay_ms,
            first_match_only,
        } => {
            let config = PipelineConfig {
                remote,
                builds_url,
                start,
                end,
                lanes,
                delay: Duration::from_millis(delay_ms),
                scan_policy: if first_match_only {
                    NoteScanPolicy::FirstMatch
                } else {
                    NoteScanPolicy::ScanAll
                },
            };

            let records = pipeline::run(&config).await?;
            dataset::write_records(&out, &records)?;
            println!("Wrote {} record(s) to {}", records.len(), out.display());
            Ok(())
        }
        Commands::Merge { out, inputs } => {
            let (merged, summary) = dataset::merge_datasets(&inputs)?;
            dataset::write_records(&out, &merged)?;
            println!(
                "Merged {} record(s) mapping {} input(s) to {} output(s) into {}",
                summary.records,
                summary.inputs,
                summary.outputs,
                out.display()
            );
            Ok(())
        }
    }
}
