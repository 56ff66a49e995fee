//! CLI string conversion utilities

use crate::config::cli;
use crate::config::OutputFormat;
use crate::stats::ZeroElapsedPolicy;
use anyhow::{Context, Result};

/// Parse a size string (e.g., "1G", "100M", "4k") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("k") || s.ends_with("kb") {
        (s.trim_end_matches("kb").trim_end_matches("k"), 1024u64)
    } else if s.ends_with("m") || s.ends_with("mb") {
        (s.trim_end_matches("mb").trim_end_matches("m"), 1024 * 1024)
    } else if s.ends_with("g") || s.ends_with("gb") {
        (s.trim_end_matches("gb").trim_end_matches("g"), 1024 * 1024 * 1024)
    } else if s.ends_with("t") || s.ends_with("tb") {
        (s.trim_end_matches("tb").trim_end_matches("t"), 1024 * 1024 * 1024 * 1024)
    } else {
        (s.trim_end_matches("b"), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size too large: {}", s))
}

/// Parse a time string (e.g., "500ms", "2s", "1.5", "1m") to fractional seconds
///
/// A bare number is taken as seconds.
pub fn parse_seconds(s: &str) -> Result<f64> {
    let s = s.trim().to_lowercase();

    let (num_str, per_second, multiplier) = if s.ends_with("us") {
        (s.trim_end_matches("us"), 1e6, 1.0)
    } else if s.ends_with("ms") {
        (s.trim_end_matches("ms"), 1e3, 1.0)
    } else if s.ends_with("min") {
        (s.trim_end_matches("min"), 1.0, 60.0)
    } else if s.ends_with("m") {
        (s.trim_end_matches("m"), 1.0, 60.0)
    } else if s.ends_with("s") {
        (s.trim_end_matches("s"), 1.0, 1.0)
    } else {
        (s.as_str(), 1.0, 1.0)
    };

    let num: f64 = num_str
        .parse()
        .with_context(|| format!("Invalid time format: {}", s))?;

    Ok(num * multiplier / per_second)
}

/// Convert CLI ZeroElapsedArg to the aggregation policy
pub fn convert_zero_elapsed(arg: cli::ZeroElapsedArg) -> ZeroElapsedPolicy {
    match arg {
        cli::ZeroElapsedArg::Skip => ZeroElapsedPolicy::Skip,
        cli::ZeroElapsedArg::Zero => ZeroElapsedPolicy::Zero,
    }
}

/// Convert CLI FormatArg to OutputFormat
pub fn convert_format(arg: cli::FormatArg) -> OutputFormat {
    match arg {
        cli::FormatArg::Text => OutputFormat::Text,
        cli::FormatArg::Json => OutputFormat::Json,
        cli::FormatArg::Csv => OutputFormat::Csv,
    }
}
