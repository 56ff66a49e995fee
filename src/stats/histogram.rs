//! Interval histograms
//!
//! Two thin callers over one span-walking core:
//!
//! - [`IntervalHistogram`]: occupancy, +1 per covered bin (concurrency curve)
//! - [`WeightedRateHistogram`]: work spread evenly over the covered bins
//!   (peak rate curve), or a task-measured rate added to every covered bin
//!   (bandwidth curve)
//!
//! Tasks whose bin range is empty contribute nothing to any series. Their work
//! is not moved to a neighbouring bin.

use super::bins::BinRange;
use super::{RunContext, TaskInterval};

/// Occupancy histogram plus task counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyResult {
    /// Tasks executing per bin
    pub concurrency: Vec<u32>,
    /// Tasks considered (including degenerate ones)
    pub total_tasks: usize,
    /// Tasks that covered no bin
    pub degenerate_tasks: usize,
}

/// Call `f` with the input index of every interval that covers at least one bin
///
/// Returns the number of intervals skipped because their range was empty.
fn for_each_span<F>(intervals: &[TaskInterval], ctx: &RunContext, mut f: F) -> usize
where
    F: FnMut(usize, &TaskInterval, BinRange),
{
    let edges = ctx.edges();
    let mut degenerate = 0;

    for (index, interval) in intervals.iter().enumerate() {
        let range = edges.place(
            interval.start - ctx.global_start,
            interval.end - ctx.global_start,
        );
        if range.is_empty() {
            degenerate += 1;
            continue;
        }
        f(index, interval, range);
    }

    degenerate
}

/// Concurrency (occupancy) histogram
pub struct IntervalHistogram;

impl IntervalHistogram {
    /// Number of tasks executing in each bin
    pub fn build(intervals: &[TaskInterval], ctx: &RunContext) -> Vec<u32> {
        Self::build_with_counts(intervals, ctx).concurrency
    }

    /// Concurrency curve together with total and degenerate task counts
    ///
    /// Uses a difference array, so cost is O(tasks + bins) rather than
    /// O(tasks * bins).
    pub fn build_with_counts(intervals: &[TaskInterval], ctx: &RunContext) -> OccupancyResult {
        let mut deltas = vec![0i64; ctx.bin_count + 1];

        let degenerate_tasks = for_each_span(intervals, ctx, |_, _, range| {
            deltas[range.a] += 1;
            deltas[range.b] -= 1;
        });

        let mut running = 0i64;
        let concurrency = deltas[..ctx.bin_count]
            .iter()
            .map(|delta| {
                running += delta;
                running as u32
            })
            .collect();

        OccupancyResult {
            concurrency,
            total_tasks: intervals.len(),
            degenerate_tasks,
        }
    }
}

/// Work-weighted rate histogram
pub struct WeightedRateHistogram;

impl WeightedRateHistogram {
    /// Peak rate curve: each task adds `weight / bins_covered` to every bin it covers
    ///
    /// Summing the curve and multiplying by the bin width approximates the
    /// total work of the tasks that landed in the histogram.
    pub fn build(intervals: &[TaskInterval], ctx: &RunContext) -> Vec<f64> {
        let mut curve = vec![0.0f64; ctx.bin_count];

        for_each_span(intervals, ctx, |_, interval, range| {
            let share = interval.weight_or_unit() / range.len() as f64;
            for bin in &mut curve[range.a..range.b] {
                *bin += share;
            }
        });

        curve
    }

    /// Bandwidth curve: `rates[i]` is added unchanged to every bin task `i` covers
    ///
    /// `rates` must be parallel to `intervals`; missing entries count as 0.
    pub fn build_from_rates(intervals: &[TaskInterval], rates: &[f64], ctx: &RunContext) -> Vec<f64> {
        let mut curve = vec![0.0f64; ctx.bin_count];

        for_each_span(intervals, ctx, |index, _, range| {
            let rate = rates.get(index).copied().unwrap_or(0.0);
            for bin in &mut curve[range.a..range.b] {
                *bin += rate;
            }
        });

        curve
    }
}
