//! Time-series aggregation of task telemetry
//!
//! Converts a set of per-task `(start, end, weight)` intervals into fixed-width
//! time-bin series describing the run as a whole.
//!
//! - **Concurrency**: how many tasks were executing in each bin
//! - **Peak rate**: sum of per-task instantaneous work rates in each bin
//! - **Bandwidth**: sum of per-task measured rates in each bin
//! - **Rolling effective rate**: cumulative work / elapsed time at each completion
//!
//! All three histograms share one bin-placement core ([`bins`]), so a task
//! covers exactly the same bins in every series.
//!
//! # Example
//!
//! ```
//! use taskpulse::stats::{RunContext, TaskInterval};
//! use taskpulse::stats::histogram::{IntervalHistogram, WeightedRateHistogram};
//!
//! let ctx = RunContext::new(0.0, 1.0, 16);
//! let tasks = vec![TaskInterval::weighted(0.0, 10.0, 100.0)];
//!
//! let concurrency = IntervalHistogram::build(&tasks, &ctx);
//! assert_eq!(concurrency[0], 1);
//! assert_eq!(concurrency[10], 0);
//!
//! let rate = WeightedRateHistogram::build(&tasks, &ctx);
//! assert_eq!(rate[3], 10.0);
//! ```

pub mod aggregator;
pub mod bins;
pub mod distribution;
pub mod histogram;
pub mod rolling;
pub mod summary;

use crate::telemetry::TaskRecord;
use serde::{Deserialize, Serialize};

pub use aggregator::TelemetryAggregator;
pub use distribution::RateDistribution;
pub use rolling::{RatePoint, ZeroElapsedPolicy};
pub use summary::RunSummary;

/// Execution interval of one completed task
///
/// Timestamps are absolute; [`RunContext::global_start`] is subtracted when
/// the interval is placed into bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskInterval {
    pub start: f64,
    pub end: f64,
    /// Work done; absent counts as 1
    pub weight: Option<f64>,
}

impl TaskInterval {
    /// Occupancy-only interval
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end, weight: None }
    }

    pub fn weighted(start: f64, end: f64, weight: f64) -> Self {
        Self { start, end, weight: Some(weight) }
    }

    #[inline]
    pub fn weight_or_unit(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl From<&TaskRecord> for TaskInterval {
    fn from(record: &TaskRecord) -> Self {
        Self {
            start: record.start_time,
            end: record.end_time,
            weight: record.weight,
        }
    }
}

/// Time axis shared by every histogram of one aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunContext {
    /// Absolute timestamp treated as t=0
    pub global_start: f64,
    /// Width of one bin in seconds (strictly positive)
    pub bin_width: f64,
    /// Number of bins
    pub bin_count: usize,
}

impl RunContext {
    pub fn new(global_start: f64, bin_width: f64, bin_count: usize) -> Self {
        Self {
            global_start,
            bin_width,
            bin_count,
        }
    }

    /// Bin edges for this context
    pub fn edges(&self) -> bins::BinEdges {
        bins::BinEdges::new(self.bin_width, self.bin_count)
    }

    /// Place an absolute interval into bins
    #[inline]
    pub fn place(&self, interval: &TaskInterval) -> bins::BinRange {
        self.edges().place(
            interval.start - self.global_start,
            interval.end - self.global_start,
        )
    }
}

/// Everything derived from one batch of task telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSeries {
    pub bin_width: f64,
    pub bin_count: usize,
    /// Tasks executing per bin
    pub concurrency_curve: Vec<u32>,
    /// Sum of `weight / bins covered` per bin
    pub peak_rate_curve: Vec<f64>,
    /// Sum of task-measured rates per bin (only when tasks report a rate)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_curve: Option<Vec<f64>>,
    /// Cumulative effective rate at each completion, ascending by end time
    pub rolling_rate_curve: Vec<RatePoint>,
    /// Distribution of per-task rates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_distribution: Option<RateDistribution>,
    pub summary: RunSummary,
}

impl AggregateSeries {
    /// Start time (relative, seconds) of each bin
    pub fn bin_starts(&self) -> Vec<f64> {
        (0..self.bin_count).map(|i| i as f64 * self.bin_width).collect()
    }
}
