//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// taskpulse - Telemetry aggregation for massively parallel task benchmarks
#[derive(Parser, Debug)]
#[command(name = "taskpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long, global = true, env = "TASKPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate a telemetry file into concurrency and rate time series
    Aggregate {
        /// Telemetry file (JSON) produced by `write`, `read`, or an external collector
        #[arg(value_name = "TELEMETRY")]
        telemetry: PathBuf,

        #[command(flatten)]
        aggregation: AggregationArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write synthetic objects into a local directory and record per-object telemetry
    Write {
        /// Directory acting as the object store
        #[arg(long)]
        dir: PathBuf,

        /// Size of each object (e.g., 64M, 1G)
        #[arg(short = 's', long)]
        size: String,

        /// Number of objects to write
        #[arg(short = 'n', long)]
        count: usize,

        /// Prefix for generated object keys
        #[arg(long)]
        key_prefix: Option<String>,

        #[command(flatten)]
        driver: DriverArgs,

        #[command(flatten)]
        stream: StreamArgs,

        /// Where to save the telemetry (JSON)
        #[arg(long)]
        telemetry: Option<PathBuf>,

        /// Aggregate and report the run immediately
        #[arg(long)]
        report: bool,

        #[command(flatten)]
        aggregation: AggregationArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Read back objects listed in a write telemetry file and record per-object telemetry
    Read {
        /// Directory acting as the object store
        #[arg(long)]
        dir: PathBuf,

        /// Telemetry file from a previous `write` run (provides the keys)
        #[arg(long)]
        keys: PathBuf,

        /// Number of objects to read (cycling through the keys), 0 for all
        #[arg(short = 'n', long, default_value = "0")]
        count: usize,

        /// Number of times to read each object
        #[arg(long)]
        read_times: Option<usize>,

        /// Size of each read call (e.g., 1M)
        #[arg(long)]
        chunk: Option<String>,

        #[command(flatten)]
        driver: DriverArgs,

        /// Where to save the telemetry (JSON)
        #[arg(long)]
        telemetry: Option<PathBuf>,

        /// Aggregate and report the run immediately
        #[arg(long)]
        report: bool,

        #[command(flatten)]
        aggregation: AggregationArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Delete the objects listed in a write telemetry file
    Delete {
        /// Directory acting as the object store
        #[arg(long)]
        dir: PathBuf,

        /// Telemetry file from a previous `write` run (provides the keys)
        #[arg(long)]
        keys: PathBuf,
    },

    /// Stream a synthetic pseudorandom payload to a file or stdout
    Generate {
        /// Total payload size (e.g., 10G)
        #[arg(short = 's', long)]
        size: String,

        /// Start streaming from this offset
        #[arg(long, default_value = "0")]
        offset: u64,

        #[command(flatten)]
        stream: StreamArgs,

        /// Output file (stdout when absent)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

/// Aggregation overrides
#[derive(Args, Debug, Clone, Default)]
pub struct AggregationArgs {
    /// Width of one time bin (e.g., 1s, 500ms)
    #[arg(long)]
    pub bin_width: Option<String>,

    /// Headroom past the last completion (e.g., 1.2 for 20%)
    #[arg(long)]
    pub margin: Option<f64>,

    /// Round the bin count up to a multiple of this
    #[arg(long)]
    pub granularity: Option<usize>,

    /// Rolling rate handling of completions at zero elapsed time
    #[arg(long, value_enum)]
    pub zero_elapsed: Option<ZeroElapsedArg>,

    /// Bin width of the per-task rate distribution
    #[arg(long)]
    pub rate_bin_width: Option<f64>,

    /// Largest bin count; records ending past it are dropped
    #[arg(long)]
    pub max_bins: Option<usize>,
}

/// Output overrides
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Report format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<FormatArg>,

    /// Report destination (console when absent)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Load driver overrides
#[derive(Args, Debug, Clone, Default)]
pub struct DriverArgs {
    /// Number of concurrent tasks
    #[arg(short = 'p', long)]
    pub parallelism: Option<usize>,
}

/// Payload stream overrides
#[derive(Args, Debug, Clone, Default)]
pub struct StreamArgs {
    /// Block size of the pseudorandom stream (e.g., 1M)
    #[arg(long)]
    pub block_size: Option<String>,

    /// Fixed seed for reproducible payloads
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Zero-elapsed policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ZeroElapsedArg {
    /// Omit the point
    Skip,
    /// Report rate 0
    Zero,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human-readable console report
    Text,
    /// Full series as JSON
    Json,
    /// Bin series and rolling curve as CSV
    Csv,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
