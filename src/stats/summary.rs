//! Run summary
//!
//! Scalar totals for one aggregated batch: task counts, work done, wall time,
//! effective and peak rates, and task duration percentiles.
//!
//! Durations are tracked with HdrHistogram at microsecond resolution (1us to
//! 24 hours, 3 significant digits), which is ample for remote task runtimes.

use super::TaskInterval;
use crate::Result;
use anyhow::Context;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};

/// Longest task duration tracked (24 hours, in microseconds)
const MAX_DURATION_MICROS: u64 = 24 * 3600 * 1_000_000;

/// Task duration histogram
#[derive(Debug)]
pub struct DurationHistogram {
    histogram: Histogram<u64>,
}

impl DurationHistogram {
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new_with_bounds(1, MAX_DURATION_MICROS, 3)
            .context("Failed to create duration histogram")?;
        Ok(Self { histogram })
    }

    /// Record a duration in seconds; values are clamped into the tracked range
    #[inline]
    pub fn record_secs(&mut self, seconds: f64) {
        let micros = (seconds.max(0.0) * 1e6).round() as u64;
        let value = micros.clamp(1, MAX_DURATION_MICROS);
        let _ = self.histogram.record(value);
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Duration in seconds at `percentile` (0-100), `None` when empty
    pub fn percentile_secs(&self, percentile: f64) -> Option<f64> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(self.histogram.value_at_percentile(percentile) as f64 / 1e6)
    }

    pub fn max_secs(&self) -> Option<f64> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(self.histogram.max() as f64 / 1e6)
    }
}

/// Scalar description of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Successful, well-formed tasks that were aggregated
    pub total_tasks: usize,
    /// Records flagged as failed by the collector
    pub failed_records: usize,
    /// Records rejected as malformed
    pub dropped_records: usize,
    /// Tasks that covered no histogram bin
    pub degenerate_tasks: usize,
    /// Sum of task weights
    pub total_work: f64,
    /// Seconds from the start of the run to the last completion
    pub wall_time: f64,
    /// total_work / wall_time (0 when wall_time is 0)
    pub effective_rate: f64,
    pub peak_concurrency: u32,
    pub peak_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_p50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_p90: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_p99: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_max: Option<f64>,
}

impl RunSummary {
    /// Compute totals and duration percentiles for `intervals`
    ///
    /// Curve peaks and record counters are filled in by the aggregator.
    pub fn from_intervals(intervals: &[TaskInterval], global_start: f64) -> Result<Self> {
        let mut durations = DurationHistogram::new()?;
        let mut total_work = 0.0;
        let mut wall_time = 0.0f64;

        for interval in intervals {
            durations.record_secs(interval.duration());
            total_work += interval.weight_or_unit();
            wall_time = wall_time.max(interval.end - global_start);
        }

        let effective_rate = if wall_time > 0.0 { total_work / wall_time } else { 0.0 };

        Ok(Self {
            total_tasks: intervals.len(),
            total_work,
            wall_time,
            effective_rate,
            duration_p50: durations.percentile_secs(50.0),
            duration_p90: durations.percentile_secs(90.0),
            duration_p99: durations.percentile_secs(99.0),
            duration_max: durations.max_secs(),
            ..Default::default()
        })
    }
}
