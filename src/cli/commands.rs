//! CLI commands and argument parsing

use crate::pipeline::PARAMETER_PATH_ENV;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Converts OCI cost reports into CBF drops
#[derive(Parser, Debug)]
#[command(name = "anycost-oci")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for the run summary
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download reports, build a drop and publish manifests
    Run {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Directory downloaded reports are staged in
        #[arg(long, default_value = "/tmp/")]
        temp_dir: PathBuf,

        /// Directory drops are written to; must be empty or absent
        #[arg(long, default_value = "/tmp/anycost_drop")]
        output_dir: PathBuf,

        /// Whole months to look back from the current month
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        lookback_months: i32,

        /// Upload destination (s3://bucket/path, gs://, az://, r2://, local path);
        /// overrides the sink in the config file
        #[arg(short, long)]
        destination: Option<String>,
    },

    /// Validate the configuration and list reports in the window
    Check {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Whole months to look back from the current month
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        lookback_months: i32,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Parameter path prefix for credentials
        #[arg(long, env = PARAMETER_PATH_ENV, default_value = "/anycost/")]
        params_path: String,

        /// Parameter file (JSON or YAML); parameters come from the environment when absent
        #[arg(long)]
        params_file: Option<PathBuf>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Pretty,
}
