//! Distribution of per-task rates
//!
//! A plain linear histogram answering "how many tasks achieved a given rate".
//! Bins are `bin_width` wide starting at 0 and extend to 20% past the fastest
//! task so the top bin is never flush with the edge. Bins are widened when
//! the range would need more than [`MAX_RATE_BINS`].

use serde::{Deserialize, Serialize};

/// Headroom applied past the largest observed rate
const RANGE_MARGIN: f64 = 1.2;

/// Most bins a distribution will allocate
pub const MAX_RATE_BINS: usize = 1 << 16;

/// Linear histogram of per-task rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateDistribution {
    /// Width of one bin, in the unit of the rates
    pub bin_width: f64,
    /// `counts[i]` = tasks with `i * bin_width <= rate < (i + 1) * bin_width`
    pub counts: Vec<u64>,
    pub min_rate: f64,
    pub max_rate: f64,
    pub mean_rate: f64,
}

impl RateDistribution {
    /// Build from a set of rates; `None` if there are no finite, non-negative rates
    pub fn from_rates(rates: &[f64], bin_width: f64) -> Option<Self> {
        let valid: Vec<f64> = rates
            .iter()
            .copied()
            .filter(|r| r.is_finite() && *r >= 0.0)
            .collect();

        if valid.is_empty() || !(bin_width > 0.0) {
            return None;
        }

        let min_rate = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let max_rate = valid.iter().copied().fold(0.0f64, f64::max);
        let mean_rate = valid.iter().sum::<f64>() / valid.len() as f64;

        let range = max_rate * RANGE_MARGIN;
        let bin_width = if range / bin_width > MAX_RATE_BINS as f64 {
            range / MAX_RATE_BINS as f64
        } else {
            bin_width
        };
        let num_bins = ((range / bin_width).ceil() as usize).clamp(1, MAX_RATE_BINS);
        let mut counts = vec![0u64; num_bins];

        for rate in &valid {
            let idx = ((rate / bin_width).floor() as usize).min(num_bins - 1);
            counts[idx] += 1;
        }

        Some(Self {
            bin_width,
            counts,
            min_rate,
            max_rate,
            mean_rate,
        })
    }

    /// Total number of tasks in the distribution
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Index of the most populated bin (lowest index on ties)
    pub fn mode_bin(&self) -> Option<usize> {
        let max = *self.counts.iter().max()?;
        self.counts.iter().position(|&c| c == max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_distribution() {
        let dist = RateDistribution::from_rates(&[1.5, 2.2, 2.7, 9.9], 1.0).unwrap();

        // 9.9 * 1.2 = 11.88 -> 12 bins
        assert_eq!(dist.counts.len(), 12);
        assert_eq!(dist.counts[1], 1);
        assert_eq!(dist.counts[2], 2);
        assert_eq!(dist.counts[9], 1);
        assert_eq!(dist.total(), 4);
        assert_eq!(dist.mode_bin(), Some(2));
        assert_eq!(dist.min_rate, 1.5);
        assert_eq!(dist.max_rate, 9.9);
    }

    #[test]
    fn test_wider_bins() {
        let dist = RateDistribution::from_rates(&[10.0, 45.0, 49.0, 51.0], 25.0).unwrap();
        assert_eq!(dist.counts, vec![1, 2, 1]);
    }

    #[test]
    fn test_all_zero_rates() {
        let dist = RateDistribution::from_rates(&[0.0, 0.0], 1.0).unwrap();
        assert_eq!(dist.counts, vec![2]);
        assert_eq!(dist.mean_rate, 0.0);
    }

    #[test]
    fn test_invalid_rates_ignored() {
        let dist = RateDistribution::from_rates(&[f64::NAN, -1.0, 3.0], 1.0).unwrap();
        assert_eq!(dist.total(), 1);
    }

    #[test]
    fn test_huge_rate_widens_bins() {
        let dist = RateDistribution::from_rates(&[1.0, 1e300], 1.0).unwrap();

        assert!(dist.counts.len() <= MAX_RATE_BINS);
        assert!(dist.bin_width > 1.0);
        assert_eq!(dist.counts[0], 1);
        assert_eq!(dist.total(), 2);
        assert_eq!(dist.max_rate, 1e300);
    }

    #[test]
    fn test_empty_is_none() {
        assert!(RateDistribution::from_rates(&[], 1.0).is_none());
        assert!(RateDistribution::from_rates(&[1.0], 0.0).is_none());
    }
}
