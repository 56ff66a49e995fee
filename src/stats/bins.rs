//! Bin placement
//!
//! Maps relative `(start, end)` times onto histogram columns. Bin `i` has its
//! left edge at `i * bin_width`. An interval covers the half-open bin range
//! `[a, b)` where both ends come from the same lower-bound search:
//!
//! ```text
//! edges:    0    1    2    3    4
//!           |----|----|----|----|
//! interval:   [=======)              s=0.5, e=2.0
//! a = lower_bound(0.5) = 1
//! b = lower_bound(2.0) = 2           -> covers bin 1 only
//! ```
//!
//! Searching both ends the same way means two intervals that share a boundary
//! never both claim the bin at that boundary.
//!
//! # Quirks
//!
//! - A time beyond the last edge places at `bin_count`: intervals are silently
//!   truncated at the right edge of the histogram.
//! - A negative time (task started before `global_start`) searches to 0; it is
//!   not rejected.
//! - `b <= a` means the interval covers no bin at all.

/// Left edges of the histogram bins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEdges {
    bin_width: f64,
    bin_count: usize,
}

/// Half-open range of bins `[a, b)` covered by one interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRange {
    pub a: usize,
    pub b: usize,
}

impl BinRange {
    /// Number of bins covered (0 for degenerate ranges)
    #[inline]
    pub fn len(&self) -> usize {
        self.b.saturating_sub(self.a)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.b <= self.a
    }
}

impl BinEdges {
    pub fn new(bin_width: f64, bin_count: usize) -> Self {
        Self { bin_width, bin_count }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bin_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bin_count == 0
    }

    /// Left edge of bin `i`
    #[inline]
    pub fn edge(&self, i: usize) -> f64 {
        i as f64 * self.bin_width
    }

    /// Leftmost bin index whose edge is `>= x`, or `bin_count` if none
    pub fn lower_bound(&self, x: f64) -> usize {
        let (mut lo, mut hi) = (0usize, self.bin_count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.edge(mid) < x {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Bins covered by the relative interval `[start, end)`
    #[inline]
    pub fn place(&self, relative_start: f64, relative_end: f64) -> BinRange {
        BinRange {
            a: self.lower_bound(relative_start),
            b: self.lower_bound(relative_end),
        }
    }
}

/// Number of bins needed to show a run whose last task ends at `max_end_relative`
///
/// Adds `margin` headroom (e.g. 1.2 = 20%) and rounds up to a multiple of
/// `granularity`. Never returns less than `granularity`. Spans too large to
/// count saturate at the largest multiple of `granularity` that fits a `usize`.
pub fn derive_bin_count(max_end_relative: f64, bin_width: f64, margin: f64, granularity: usize) -> usize {
    let granularity = granularity.max(1);

    let raw = if max_end_relative.is_finite() && max_end_relative > 0.0 && bin_width > 0.0 {
        (max_end_relative * margin / bin_width).ceil() as usize
    } else {
        0
    };

    let rounded = raw
        .checked_next_multiple_of(granularity)
        .unwrap_or(usize::MAX / granularity * granularity);
    rounded.max(granularity)
}
