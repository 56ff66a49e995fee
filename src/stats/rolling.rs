//! Rolling effective rate
//!
//! Tasks are ordered by completion time and a running total of their work is
//! divided by the wall time elapsed since the start of the run:
//!
//! ```text
//! rate_k = (w_1 + ... + w_k) / (end_k - global_start)
//! ```
//!
//! The x values are non-decreasing by construction. The y values are not: a
//! burst of fast completions followed by stragglers makes the curve rise and
//! then sag back toward the run's overall effective rate.

use super::TaskInterval;
use serde::{Deserialize, Serialize};

/// One sample of the rolling curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    /// Seconds since the start of the run
    pub elapsed: f64,
    /// Cumulative work / elapsed
    pub rate: f64,
}

/// What to do with a completion at (or before) the start of the run
///
/// The rate at zero elapsed time is undefined. Either way the task's work is
/// still added to the running total used by later points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroElapsedPolicy {
    /// Omit the point
    #[default]
    Skip,
    /// Emit the point with rate 0
    Zero,
}

/// Rolling effective rate curve builder
pub struct RollingEffectiveRate;

impl RollingEffectiveRate {
    /// Build with the default policy ([`ZeroElapsedPolicy::Skip`])
    pub fn build(intervals: &[TaskInterval], global_start: f64) -> Vec<RatePoint> {
        Self::build_with_policy(intervals, global_start, ZeroElapsedPolicy::default())
    }

    /// Build the curve, one point per task in ascending end-time order
    ///
    /// Ties in end time keep their input order.
    pub fn build_with_policy(
        intervals: &[TaskInterval],
        global_start: f64,
        policy: ZeroElapsedPolicy,
    ) -> Vec<RatePoint> {
        let mut order: Vec<&TaskInterval> = intervals.iter().collect();
        // sort_by is stable
        order.sort_by(|x, y| x.end.total_cmp(&y.end));

        let mut points = Vec::with_capacity(order.len());
        let mut cumulative = 0.0f64;

        for interval in order {
            cumulative += interval.weight_or_unit();
            let elapsed = interval.end - global_start;

            if elapsed > 0.0 {
                points.push(RatePoint {
                    elapsed,
                    rate: cumulative / elapsed,
                });
            } else if policy == ZeroElapsedPolicy::Zero {
                points.push(RatePoint {
                    elapsed: 0.0,
                    rate: 0.0,
                });
            }
        }

        points
    }
}
