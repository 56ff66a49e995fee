//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! Every section has serde defaults, so an empty TOML file (or none at all)
//! yields a usable configuration:
//!
//! ```toml
//! [aggregation]
//! bin_width = 1.0
//! margin = 1.2
//! granularity = 8
//! zero_elapsed = "skip"
//! rate_bin_width = 1.0
//! max_bins = 4194304
//!
//! [stream]
//! block_size = 1048576
//! clamp_seeks = false
//!
//! [driver]
//! parallelism = 16
//! read_chunk = 1048576
//! read_times = 1
//! key_prefix = "bench/"
//!
//! [output]
//! format = "json"
//! path = "results.json"
//! ```

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::stats::ZeroElapsedPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Time-series aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Width of one time bin in seconds
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,
    /// Headroom past the last completion (1.2 = 20%)
    #[serde(default = "default_margin")]
    pub margin: f64,
    /// Bin count is rounded up to a multiple of this
    #[serde(default = "default_granularity")]
    pub granularity: usize,
    /// Handling of completions at zero elapsed time in the rolling curve
    #[serde(default)]
    pub zero_elapsed: ZeroElapsedPolicy,
    /// Bin width of the per-task rate distribution
    #[serde(default = "default_rate_bin_width")]
    pub rate_bin_width: f64,
    /// Upper bound on the bin count; records ending past it are dropped
    #[serde(default = "default_max_bins")]
    pub max_bins: usize,
}

fn default_bin_width() -> f64 {
    1.0
}

fn default_margin() -> f64 {
    1.2
}

fn default_granularity() -> usize {
    8
}

fn default_rate_bin_width() -> f64 {
    1.0
}

fn default_max_bins() -> usize {
    1 << 22
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            bin_width: default_bin_width(),
            margin: default_margin(),
            granularity: default_granularity(),
            zero_elapsed: ZeroElapsedPolicy::default(),
            rate_bin_width: default_rate_bin_width(),
            max_bins: default_max_bins(),
        }
    }
}

/// Synthetic payload stream settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Block size of the pseudorandom stream
    #[serde(default = "default_stream_block_size")]
    pub block_size: u64,
    /// Clamp seeks into [0, len] instead of allowing any position
    #[serde(default)]
    pub clamp_seeks: bool,
    /// Fixed seed for reproducible payloads (fresh seed per stream when absent)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_stream_block_size() -> u64 {
    1024 * 1024
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            block_size: default_stream_block_size(),
            clamp_seeks: false,
            seed: None,
        }
    }
}

/// Local load driver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Number of tasks run concurrently
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Size of each read call when reading objects back
    #[serde(default = "default_read_chunk")]
    pub read_chunk: u64,
    /// How many times each object is read
    #[serde(default = "default_read_times")]
    pub read_times: usize,
    /// Prefix for generated object keys
    #[serde(default)]
    pub key_prefix: String,
}

fn default_parallelism() -> usize {
    num_cpus::get()
}

fn default_read_chunk() -> u64 {
    1024 * 1024
}

fn default_read_times() -> usize {
    1
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            read_chunk: default_read_chunk(),
            read_times: default_read_times(),
            key_prefix: String::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Destination file; console when absent (CSV writes `<path>` and `<stem>_rolling.csv`)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.aggregation.bin_width, 1.0);
        assert_eq!(config.aggregation.margin, 1.2);
        assert_eq!(config.aggregation.granularity, 8);
        assert_eq!(config.aggregation.zero_elapsed, ZeroElapsedPolicy::Skip);
        assert_eq!(config.stream.block_size, 1024 * 1024);
        assert!(!config.stream.clamp_seeks);
        assert!(config.driver.parallelism >= 1);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}
