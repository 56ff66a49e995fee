//! JSON output formatting
//!
//! The document carries run metadata, a summary with both raw numbers and
//! human-readable strings, and the complete [`AggregateSeries`] so that it can
//! be re-plotted without re-running the aggregation.

use super::ReportHeader;
use crate::stats::{AggregateSeries, RunSummary};
use crate::util::time::{format_rate, format_seconds};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Seconds with a human-readable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSeconds {
    pub seconds: f64,
    pub human: String,
}

impl JsonSeconds {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            human: format_seconds(seconds),
        }
    }
}

/// Rate (work per second) with a human-readable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRate {
    pub per_sec: f64,
    pub human: String,
}

impl JsonRate {
    pub fn new(per_sec: f64) -> Self {
        Self {
            per_sec,
            human: format!("{}/s", format_rate(per_sec)),
        }
    }
}

/// Task duration percentiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDurations {
    pub p50: JsonSeconds,
    pub p90: JsonSeconds,
    pub p99: JsonSeconds,
    pub max: JsonSeconds,
}

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRunInfo {
    pub label: String,
    pub taskpulse_version: String,
    /// Run start, ISO 8601
    pub start_time: String,
    pub start_epoch: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<JsonSeconds>,
}

/// Summary block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSummary {
    pub total_tasks: usize,
    pub failed_records: usize,
    pub dropped_records: usize,
    pub degenerate_tasks: usize,
    pub total_work: f64,
    pub wall_time: JsonSeconds,
    pub effective_rate: JsonRate,
    pub peak_rate: JsonRate,
    pub peak_concurrency: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_durations: Option<JsonDurations>,
}

impl From<&RunSummary> for JsonSummary {
    fn from(summary: &RunSummary) -> Self {
        let task_durations = match (
            summary.duration_p50,
            summary.duration_p90,
            summary.duration_p99,
            summary.duration_max,
        ) {
            (Some(p50), Some(p90), Some(p99), Some(max)) => Some(JsonDurations {
                p50: JsonSeconds::new(p50),
                p90: JsonSeconds::new(p90),
                p99: JsonSeconds::new(p99),
                max: JsonSeconds::new(max),
            }),
            _ => None,
        };

        Self {
            total_tasks: summary.total_tasks,
            failed_records: summary.failed_records,
            dropped_records: summary.dropped_records,
            degenerate_tasks: summary.degenerate_tasks,
            total_work: summary.total_work,
            wall_time: JsonSeconds::new(summary.wall_time),
            effective_rate: JsonRate::new(summary.effective_rate),
            peak_rate: JsonRate::new(summary.peak_rate),
            peak_concurrency: summary.peak_concurrency,
            task_durations,
        }
    }
}

/// Complete JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub run: JsonRunInfo,
    pub summary: JsonSummary,
    pub series: AggregateSeries,
}

/// Build the JSON document for a series
pub fn build_report(series: &AggregateSeries, header: &ReportHeader) -> JsonReport {
    JsonReport {
        run: JsonRunInfo {
            label: header.label.clone(),
            taskpulse_version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: header.format_timestamp(0.0),
            start_epoch: header.start_time,
            total_time: (header.total_time > 0.0).then(|| JsonSeconds::new(header.total_time)),
        },
        summary: JsonSummary::from(&series.summary),
        series: series.clone(),
    }
}

/// Write the pretty-printed report to any writer
pub fn write_json<W: Write>(writer: &mut W, series: &AggregateSeries, header: &ReportHeader) -> Result<()> {
    serde_json::to_writer_pretty(writer, &build_report(series, header))
        .context("Failed to serialize JSON report")?;
    Ok(())
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, series: &AggregateSeries, header: &ReportHeader) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write_json(&mut writer, series, header)?;
    writer.flush()?;

    Ok(())
}
