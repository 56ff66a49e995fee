//! Wall-clock and formatting utilities
//!
//! Task telemetry is recorded as fractional epoch seconds so that records
//! from different processes (or hosts) share one time axis.

use chrono::Utc;

/// Current wall-clock time as fractional seconds since the Unix epoch
///
/// Microsecond resolution.
#[inline]
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1e6
}

/// Format a span of seconds in human-readable form
///
/// # Examples
///
/// ```
/// use taskpulse::util::time::format_seconds;
///
/// assert_eq!(format_seconds(0.0000005), "500ns");
/// assert_eq!(format_seconds(0.0025), "2.50ms");
/// assert_eq!(format_seconds(5.0), "5.00s");
/// assert_eq!(format_seconds(150.0), "2m 30.0s");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    if seconds < 0.0 {
        return format!("-{}", format_seconds(-seconds));
    }

    let nanos = seconds * 1e9;
    if nanos < 1_000.0 {
        format!("{:.0}ns", nanos)
    } else if nanos < 1_000_000.0 {
        format!("{:.2}us", nanos / 1_000.0)
    } else if nanos < 1_000_000_000.0 {
        format!("{:.2}ms", nanos / 1_000_000.0)
    } else if seconds < 60.0 {
        format!("{:.2}s", seconds)
    } else {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {:.1}s", minutes as u64, seconds - minutes * 60.0)
    }
}

/// Format a rate (units per second) with a metric suffix
///
/// # Examples
///
/// ```
/// use taskpulse::util::time::format_rate;
///
/// assert_eq!(format_rate(500.0), "500");
/// assert_eq!(format_rate(1500.0), "1.50K");
/// assert_eq!(format_rate(2_500_000.0), "2.50M");
/// assert_eq!(format_rate(3.2e12), "3.20T");
/// ```
pub fn format_rate(rate: f64) -> String {
    if rate < 1_000.0 {
        format!("{:.0}", rate)
    } else if rate < 1_000_000.0 {
        format!("{:.2}K", rate / 1_000.0)
    } else if rate < 1_000_000_000.0 {
        format!("{:.2}M", rate / 1_000_000.0)
    } else if rate < 1_000_000_000_000.0 {
        format!("{:.2}G", rate / 1_000_000_000.0)
    } else {
        format!("{:.2}T", rate / 1_000_000_000_000.0)
    }
}

/// Transfer rate in MB/s (10^6 bytes) for `bytes` moved over `elapsed` seconds
///
/// 0 when no time elapsed (or the clock stepped backwards).
pub fn transfer_rate_mb(bytes: u64, elapsed: f64) -> f64 {
    if elapsed > 0.0 {
        bytes as f64 / elapsed / 1e6
    } else {
        0.0
    }
}
