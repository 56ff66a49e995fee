//! Report output
//!
//! - [`text`]: console report
//! - [`json`]: full series plus run metadata as JSON
//! - [`csv`]: one row per bin, plus the rolling rate curve in a sibling file

pub mod csv;
pub mod json;
pub mod text;

use crate::config::{OutputConfig, OutputFormat};
use crate::stats::AggregateSeries;
use crate::telemetry::TelemetryBatch;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::info;

/// Run metadata printed alongside the series
#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    pub label: String,
    /// Run start (epoch seconds); bin 0 starts here
    pub start_time: f64,
    /// Dispatcher-side wall time of the run, 0 when unknown
    pub total_time: f64,
}

impl ReportHeader {
    pub fn new(label: impl Into<String>, start_time: f64) -> Self {
        Self {
            label: label.into(),
            start_time,
            total_time: 0.0,
        }
    }

    /// Absolute time of `offset` seconds into the run
    pub fn timestamp_at(&self, offset: f64) -> Option<DateTime<Utc>> {
        let micros = ((self.start_time + offset) * 1e6).round();
        if !micros.is_finite() {
            return None;
        }
        DateTime::from_timestamp_micros(micros as i64)
    }

    /// ISO 8601 form of [`timestamp_at`](Self::timestamp_at), empty when out of range
    pub fn format_timestamp(&self, offset: f64) -> String {
        self.timestamp_at(offset)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default()
    }
}

impl From<&TelemetryBatch> for ReportHeader {
    fn from(batch: &TelemetryBatch) -> Self {
        Self {
            label: batch.label.clone(),
            start_time: batch.start_time,
            total_time: batch.total_time,
        }
    }
}

/// Write the report in the configured format to the configured destination
pub fn write_report(series: &AggregateSeries, header: &ReportHeader, config: &OutputConfig) -> Result<()> {
    match (config.format, &config.path) {
        (OutputFormat::Text, None) => {
            let stdout = io::stdout();
            text::write_results(&mut stdout.lock(), series, header)?;
        }
        (OutputFormat::Text, Some(path)) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create report file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            text::write_results(&mut writer, series, header)?;
            writer.flush()?;
            info!("Report written to {}", path.display());
        }
        (OutputFormat::Json, None) => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            json::write_json(&mut lock, series, header)?;
            writeln!(lock)?;
        }
        (OutputFormat::Json, Some(path)) => {
            json::write_json_output(path, series, header)?;
            info!("JSON report written to {}", path.display());
        }
        (OutputFormat::Csv, None) => {
            let stdout = io::stdout();
            csv::write_bin_series(&mut stdout.lock(), series, header)?;
        }
        (OutputFormat::Csv, Some(path)) => {
            let rolling_path = csv::write_csv_output(path, series, header)?;
            info!(
                "CSV report written to {} and {}",
                path.display(),
                rolling_path.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_timestamp() {
        let header = ReportHeader::new("write", 1_700_000_000.0);
        assert_eq!(header.format_timestamp(0.5), "2023-11-14T22:13:20.500Z");
    }

    #[test]
    fn test_header_from_batch() {
        let mut batch = TelemetryBatch::new("read", 12.0);
        batch.total_time = 3.5;

        let header = ReportHeader::from(&batch);
        assert_eq!(header.label, "read");
        assert_eq!(header.start_time, 12.0);
        assert_eq!(header.total_time, 3.5);
    }

    #[test]
    fn test_header_timestamp_out_of_range() {
        let header = ReportHeader::new("x", f64::NAN);
        assert!(header.timestamp_at(0.0).is_none());
        assert_eq!(header.format_timestamp(0.0), "");
    }
}
