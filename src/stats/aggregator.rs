//! Telemetry aggregation
//!
//! This module turns a flat list of per-task records into the full set of
//! time series for a run. The aggregator filters and validates records, sizes
//! the bin axis, and then runs every histogram over the same intervals.
//!
//! # Pipeline
//!
//! 1. Drop records flagged as failed
//! 2. Drop malformed records and records ending past the `max_bins` horizon
//!    (logged, counted in the summary)
//! 3. Derive the bin count from the last completion
//! 4. Build concurrency, peak rate, bandwidth, rolling rate, rate distribution
//! 5. Fill in the run summary
//!
//! # Example
//!
//! ```
//! use taskpulse::config::AggregationConfig;
//! use taskpulse::stats::TelemetryAggregator;
//! use taskpulse::telemetry::TaskRecord;
//!
//! let aggregator = TelemetryAggregator::new(AggregationConfig::default());
//! let records = vec![
//!     TaskRecord::new(0.0, 10.0).with_weight(50.0),
//!     TaskRecord::new(0.0, 5.0).with_weight(50.0),
//! ];
//!
//! let series = aggregator.aggregate(&records, 0.0, 1.0).unwrap();
//! assert_eq!(series.concurrency_curve[0], 2);
//! assert_eq!(series.rolling_rate_curve.len(), 2);
//! assert_eq!(series.summary.total_work, 100.0);
//! ```

use super::bins::derive_bin_count;
use super::histogram::{IntervalHistogram, WeightedRateHistogram};
use super::rolling::RollingEffectiveRate;
use super::{AggregateSeries, RateDistribution, RunContext, RunSummary, TaskInterval};
use crate::config::AggregationConfig;
use crate::telemetry::{TaskRecord, TelemetryBatch};
use crate::Result;
use tracing::{debug, warn};

/// Builds [`AggregateSeries`] from task records
///
/// Holds only configuration; every call to [`aggregate`](Self::aggregate)
/// is independent and returns bit-identical output for identical input.
#[derive(Debug, Clone)]
pub struct TelemetryAggregator {
    config: AggregationConfig,
}

/// Records that survived filtering, plus what was discarded
struct FilteredRecords {
    intervals: Vec<TaskInterval>,
    /// Task-measured rate per interval (parallel to `intervals`)
    rates: Vec<Option<f64>>,
    failed: usize,
    dropped: usize,
}

impl TelemetryAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate a telemetry batch using its start time and the configured bin width
    pub fn aggregate_batch(&self, batch: &TelemetryBatch) -> Result<AggregateSeries> {
        self.aggregate(&batch.records, batch.start_time, self.config.bin_width)
    }

    /// Aggregate `records` on a time axis starting at `global_start`
    ///
    /// `bin_width` overrides the configured width for this call.
    pub fn aggregate(&self, records: &[TaskRecord], global_start: f64, bin_width: f64) -> Result<AggregateSeries> {
        if !bin_width.is_finite() || bin_width <= 0.0 {
            anyhow::bail!("bin_width must be positive, got {}", bin_width);
        }

        let max_bins = self.config.max_bins.max(self.config.granularity.max(1));
        let horizon = max_bins as f64 * bin_width / self.config.margin.max(1.0);
        let filtered = filter_records(records, global_start, horizon);

        let max_end_relative = filtered
            .intervals
            .iter()
            .map(|i| i.end - global_start)
            .fold(0.0f64, f64::max);
        let bin_count = derive_bin_count(
            max_end_relative,
            bin_width,
            self.config.margin,
            self.config.granularity,
        )
        .min(max_bins);
        debug!(
            tasks = filtered.intervals.len(),
            max_end_relative, bin_width, bin_count, "derived bin axis"
        );

        let ctx = RunContext::new(global_start, bin_width, bin_count);

        let occupancy = IntervalHistogram::build_with_counts(&filtered.intervals, &ctx);
        let peak_rate_curve = WeightedRateHistogram::build(&filtered.intervals, &ctx);

        let bandwidth_curve = if filtered.rates.iter().any(Option::is_some) {
            let rates: Vec<f64> = filtered.rates.iter().map(|r| r.unwrap_or(0.0)).collect();
            Some(WeightedRateHistogram::build_from_rates(&filtered.intervals, &rates, &ctx))
        } else {
            None
        };

        let rolling_rate_curve =
            RollingEffectiveRate::build_with_policy(&filtered.intervals, global_start, self.config.zero_elapsed);

        let task_rates: Vec<f64> = filtered
            .intervals
            .iter()
            .zip(&filtered.rates)
            .filter_map(|(interval, rate)| match rate {
                Some(rate) => Some(*rate),
                None if interval.duration() > 0.0 => Some(interval.weight_or_unit() / interval.duration()),
                None => None,
            })
            .collect();
        let rate_distribution = RateDistribution::from_rates(&task_rates, self.config.rate_bin_width);

        let mut summary = RunSummary::from_intervals(&filtered.intervals, global_start)?;
        summary.failed_records = filtered.failed;
        summary.dropped_records = filtered.dropped;
        summary.degenerate_tasks = occupancy.degenerate_tasks;
        summary.peak_concurrency = occupancy.concurrency.iter().copied().max().unwrap_or(0);
        summary.peak_rate = peak_rate_curve.iter().copied().fold(0.0f64, f64::max);

        Ok(AggregateSeries {
            bin_width,
            bin_count,
            concurrency_curve: occupancy.concurrency,
            peak_rate_curve,
            bandwidth_curve,
            rolling_rate_curve,
            rate_distribution,
            summary,
        })
    }
}

/// Keep valid, successful records that end within `horizon` seconds of `global_start`
fn filter_records(records: &[TaskRecord], global_start: f64, horizon: f64) -> FilteredRecords {
    let mut filtered = FilteredRecords {
        intervals: Vec::with_capacity(records.len()),
        rates: Vec::with_capacity(records.len()),
        failed: 0,
        dropped: 0,
    };

    for (index, record) in records.iter().enumerate() {
        if record.failed {
            filtered.failed += 1;
            continue;
        }
        if let Err(e) = record.validate() {
            warn!(index, key = record.key.as_deref().unwrap_or("-"), "dropping malformed record: {}", e);
            filtered.dropped += 1;
            continue;
        }
        let relative_end = record.end_time - global_start;
        if relative_end > horizon {
            warn!(
                index,
                key = record.key.as_deref().unwrap_or("-"),
                relative_end,
                horizon,
                "dropping record past the bin horizon"
            );
            filtered.dropped += 1;
            continue;
        }
        filtered.intervals.push(TaskInterval::from(record));
        filtered.rates.push(record.rate);
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{RatePoint, ZeroElapsedPolicy};

    fn aggregator() -> TelemetryAggregator {
        TelemetryAggregator::new(AggregationConfig::default())
    }

    #[test]
    fn test_single_task_peak_rate() {
        let records = vec![TaskRecord::new(0.0, 10.0).with_weight(100.0)];
        let series = aggregator().aggregate(&records, 0.0, 1.0).unwrap();

        // ceil(10 * 1.2) = 12 -> rounded to 16
        assert_eq!(series.bin_count, 16);
        for bin in 0..10 {
            assert_eq!(series.peak_rate_curve[bin], 10.0);
            assert_eq!(series.concurrency_curve[bin], 1);
        }
        for bin in 10..16 {
            assert_eq!(series.peak_rate_curve[bin], 0.0);
            assert_eq!(series.concurrency_curve[bin], 0);
        }
        assert_eq!(series.summary.peak_rate, 10.0);
        assert_eq!(series.summary.peak_concurrency, 1);
    }

    #[test]
    fn test_rolling_curve() {
        let records = vec![
            TaskRecord::new(0.0, 10.0).with_weight(50.0),
            TaskRecord::new(0.0, 5.0).with_weight(50.0),
        ];
        let series = aggregator().aggregate(&records, 0.0, 1.0).unwrap();

        assert_eq!(
            series.rolling_rate_curve,
            vec![
                RatePoint { elapsed: 5.0, rate: 10.0 },
                RatePoint { elapsed: 10.0, rate: 10.0 },
            ]
        );
    }

    #[test]
    fn test_exact_boundary_interval() {
        let records = vec![TaskRecord::new(3.0, 4.0)];
        let series = aggregator().aggregate(&records, 0.0, 1.0).unwrap();

        assert_eq!(series.concurrency_curve.iter().sum::<u32>(), 1);
        assert_eq!(series.concurrency_curve[3], 1);
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            TaskRecord::new(100.2, 107.9).with_weight(3.0).with_rate(1.5),
            TaskRecord::new(100.0, 103.3).with_weight(7.0),
            TaskRecord::new(101.1, 101.1),
            TaskRecord::failed(102.0),
        ];
        let agg = aggregator();

        let first = agg.aggregate(&records, 100.0, 0.5).unwrap();
        let second = agg.aggregate(&records, 100.0, 0.5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_and_malformed_records() {
        let records = vec![
            TaskRecord::new(0.0, 2.0),
            TaskRecord::failed(1.0),
            TaskRecord::new(5.0, 4.0),
            TaskRecord::new(0.0, f64::INFINITY),
            TaskRecord::new(0.0, 1.0).with_weight(-3.0),
        ];
        let series = aggregator().aggregate(&records, 0.0, 1.0).unwrap();

        assert_eq!(series.summary.total_tasks, 1);
        assert_eq!(series.summary.failed_records, 1);
        assert_eq!(series.summary.dropped_records, 3);
        assert_eq!(series.concurrency_curve[..2], [1, 1]);
        assert_eq!(series.concurrency_curve.iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_degenerate_task_counted() {
        let records = vec![TaskRecord::new(2.5, 2.7), TaskRecord::new(0.0, 3.0)];
        let series = aggregator().aggregate(&records, 0.0, 1.0).unwrap();

        assert_eq!(series.summary.degenerate_tasks, 1);
        assert_eq!(series.summary.total_tasks, 2);
        // The degenerate task still counts toward total work
        assert_eq!(series.summary.total_work, 2.0);
    }

    #[test]
    fn test_bandwidth_only_with_rates() {
        let plain = vec![TaskRecord::new(0.0, 2.0).with_weight(4.0)];
        let series = aggregator().aggregate(&plain, 0.0, 1.0).unwrap();
        assert!(series.bandwidth_curve.is_none());

        let measured = vec![
            TaskRecord::new(0.0, 2.0).with_weight(4.0).with_rate(25.0),
            TaskRecord::new(1.0, 3.0).with_weight(4.0),
        ];
        let series = aggregator().aggregate(&measured, 0.0, 1.0).unwrap();
        let bandwidth = series.bandwidth_curve.unwrap();
        assert_eq!(bandwidth[..4], [25.0, 25.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rate_distribution_sources() {
        let records = vec![
            TaskRecord::new(0.0, 2.0).with_weight(4.0),
            TaskRecord::new(0.0, 1.0).with_rate(7.5),
            TaskRecord::new(1.0, 1.0),
        ];
        let series = aggregator().aggregate(&records, 0.0, 1.0).unwrap();
        let dist = series.rate_distribution.unwrap();

        // 4/2 = 2.0 from weight/duration, 7.5 measured, zero-duration task skipped
        assert_eq!(dist.total(), 2);
        assert_eq!(dist.counts[2], 1);
        assert_eq!(dist.counts[7], 1);
    }

    #[test]
    fn test_empty_input() {
        let series = aggregator().aggregate(&[], 0.0, 1.0).unwrap();

        assert_eq!(series.bin_count, 8);
        assert!(series.concurrency_curve.iter().all(|&c| c == 0));
        assert!(series.rolling_rate_curve.is_empty());
        assert!(series.rate_distribution.is_none());
        assert_eq!(series.summary.total_tasks, 0);
    }

    #[test]
    fn test_zero_elapsed_policy_from_config() {
        let config = AggregationConfig {
            zero_elapsed: ZeroElapsedPolicy::Zero,
            ..Default::default()
        };
        let records = vec![TaskRecord::new(5.0, 5.0), TaskRecord::new(5.0, 7.0)];
        let series = TelemetryAggregator::new(config).aggregate(&records, 5.0, 1.0).unwrap();

        assert_eq!(series.rolling_rate_curve[0], RatePoint { elapsed: 0.0, rate: 0.0 });
        assert_eq!(series.rolling_rate_curve[1], RatePoint { elapsed: 2.0, rate: 1.0 });
    }

    #[test]
    fn test_aggregate_batch_uses_start_time() {
        let mut batch = TelemetryBatch::new("write", 1000.0);
        batch.push(TaskRecord::new(1002.0, 1004.0));

        let series = aggregator().aggregate_batch(&batch).unwrap();
        assert_eq!(series.concurrency_curve[..5], [0, 0, 1, 1, 0]);
        assert_eq!(series.summary.wall_time, 4.0);
    }

    #[test]
    fn test_huge_end_time_is_dropped() {
        let records = vec![TaskRecord::new(0.0, 4.0).with_weight(8.0), TaskRecord::new(0.0, 1e300)];
        let series = aggregator().aggregate(&records, 0.0, 1.0).unwrap();

        assert_eq!(series.bin_count, 8);
        assert_eq!(series.summary.total_tasks, 1);
        assert_eq!(series.summary.dropped_records, 1);
        assert_eq!(series.summary.total_work, 8.0);
    }

    #[test]
    fn test_millisecond_outlier_is_dropped() {
        // One collector reporting epoch milliseconds among epoch seconds
        let start = 1_700_000_000.0;
        let records = vec![
            TaskRecord::new(start, start + 10.0),
            TaskRecord::new(start + 1.0, start * 1000.0),
        ];
        let series = aggregator().aggregate(&records, start, 1.0).unwrap();

        assert_eq!(series.bin_count, 16);
        assert_eq!(series.summary.dropped_records, 1);
        assert_eq!(series.summary.peak_concurrency, 1);
    }

    #[test]
    fn test_max_bins_horizon() {
        let config = AggregationConfig {
            max_bins: 64,
            ..Default::default()
        };
        let agg = TelemetryAggregator::new(config);

        // 64 bins / 1.2 margin: ends up to 53.33s fit
        let series = agg
            .aggregate(&[TaskRecord::new(0.0, 53.0), TaskRecord::new(0.0, 54.0)], 0.0, 1.0)
            .unwrap();
        assert_eq!(series.summary.total_tasks, 1);
        assert_eq!(series.summary.dropped_records, 1);
        assert!(series.bin_count <= 64);
        assert_eq!(series.concurrency_curve.len(), series.bin_count);

        // Half-width bins halve the horizon
        let series = agg.aggregate(&[TaskRecord::new(0.0, 30.0)], 0.0, 0.5).unwrap();
        assert_eq!(series.summary.dropped_records, 1);
    }

    #[test]
    fn test_rejects_bad_bin_width() {
        assert!(aggregator().aggregate(&[], 0.0, 0.0).is_err());
    }
}
