//! Human-readable text output

use super::ReportHeader;
use crate::stats::AggregateSeries;
use crate::util::time::{format_rate, format_seconds};
use crate::Result;
use std::io::Write;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Width of the concurrency bars in the timeline
const BAR_WIDTH: usize = 40;

/// Most timeline rows printed before bins are merged
const MAX_TIMELINE_ROWS: usize = 24;

/// Print run results to stdout
pub fn print_results(series: &AggregateSeries, header: &ReportHeader) -> Result<()> {
    let stdout = std::io::stdout();
    write_results(&mut stdout.lock(), series, header)
}

/// Write run results in console form
///
/// Displays:
/// - Task counts (aggregated, failed, dropped, degenerate)
/// - Work and rates (effective, peak)
/// - Task duration percentiles
/// - A coarse concurrency timeline
pub fn write_results<W: Write>(out: &mut W, series: &AggregateSeries, header: &ReportHeader) -> Result<()> {
    let summary = &series.summary;

    writeln!(out, "{}", RULE)?;
    writeln!(out, "                    RUN RESULTS")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)?;

    if !header.label.is_empty() {
        writeln!(out, "Run:          {}", header.label)?;
    }
    writeln!(out, "Started:      {}", header.format_timestamp(0.0))?;
    writeln!(out, "Wall Time:    {}", format_seconds(summary.wall_time))?;
    if header.total_time > 0.0 {
        writeln!(out, "Dispatch:     {}", format_seconds(header.total_time))?;
    }
    writeln!(
        out,
        "Bins:         {} x {}",
        format_number(series.bin_count as u64),
        format_seconds(series.bin_width)
    )?;
    writeln!(out)?;

    writeln!(out, "Tasks:")?;
    writeln!(out, "  Aggregated: {}", format_number(summary.total_tasks as u64))?;
    if summary.failed_records > 0 {
        writeln!(out, "  Failed:     {}", format_number(summary.failed_records as u64))?;
    }
    if summary.dropped_records > 0 {
        writeln!(out, "  Malformed:  {}", format_number(summary.dropped_records as u64))?;
    }
    if summary.degenerate_tasks > 0 {
        writeln!(
            out,
            "  Sub-bin:    {} (shorter than one bin, not in curves)",
            format_number(summary.degenerate_tasks as u64)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Work:")?;
    writeln!(out, "  Total:          {}", format_rate(summary.total_work))?;
    writeln!(out, "  Effective Rate: {}/s", format_rate(summary.effective_rate))?;
    writeln!(out, "  Peak Rate:      {}/s", format_rate(summary.peak_rate))?;
    if let Some(ref bandwidth) = series.bandwidth_curve {
        let peak = bandwidth.iter().copied().fold(0.0f64, f64::max);
        writeln!(out, "  Peak Bandwidth: {:.2} (task-reported units)", peak)?;
    }
    writeln!(out, "  Peak Tasks:     {}", summary.peak_concurrency)?;
    writeln!(out)?;

    writeln!(out, "Task Duration:")?;
    match (summary.duration_p50, summary.duration_p90, summary.duration_p99, summary.duration_max) {
        (Some(p50), Some(p90), Some(p99), Some(max)) => {
            writeln!(out, "  p50:  {}", format_seconds(p50))?;
            writeln!(out, "  p90:  {}", format_seconds(p90))?;
            writeln!(out, "  p99:  {}", format_seconds(p99))?;
            writeln!(out, "  Max:  {}", format_seconds(max))?;
        }
        _ => writeln!(out, "  No tasks aggregated")?,
    }
    writeln!(out)?;

    if let Some(ref dist) = series.rate_distribution {
        writeln!(out, "Per-Task Rate:")?;
        writeln!(out, "  Min:  {}/s", format_rate(dist.min_rate))?;
        writeln!(out, "  Mean: {}/s", format_rate(dist.mean_rate))?;
        writeln!(out, "  Max:  {}/s", format_rate(dist.max_rate))?;
        if let Some(mode) = dist.mode_bin() {
            writeln!(
                out,
                "  Mode: {}-{}/s ({} tasks)",
                format_rate(mode as f64 * dist.bin_width),
                format_rate((mode + 1) as f64 * dist.bin_width),
                format_number(dist.counts[mode])
            )?;
        }
        writeln!(out)?;
    }

    write_timeline(out, series)?;

    writeln!(out, "{}", RULE)?;
    Ok(())
}

/// Concurrency over time as horizontal bars, merging adjacent bins when there are many
fn write_timeline<W: Write>(out: &mut W, series: &AggregateSeries) -> Result<()> {
    let peak = series.summary.peak_concurrency;
    if peak == 0 || series.concurrency_curve.is_empty() {
        return Ok(());
    }

    let per_row = series.concurrency_curve.len().div_ceil(MAX_TIMELINE_ROWS);

    writeln!(out, "Concurrency:")?;
    for (row, chunk) in series.concurrency_curve.chunks(per_row).enumerate() {
        let level = chunk.iter().copied().max().unwrap_or(0);
        let filled = (level as usize * BAR_WIDTH).div_ceil(peak as usize);
        writeln!(
            out,
            "  {:>9} │{:<width$}│ {}",
            format_seconds(row as f64 * per_row as f64 * series.bin_width),
            "█".repeat(filled),
            level,
            width = BAR_WIDTH
        )?;
    }
    writeln!(out)?;

    Ok(())
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregationConfig;
    use crate::stats::TelemetryAggregator;
    use crate::telemetry::TaskRecord;

    fn render(records: &[TaskRecord]) -> String {
        let series = TelemetryAggregator::new(AggregationConfig::default())
            .aggregate(records, 0.0, 1.0)
            .unwrap();
        let mut buf = Vec::new();
        write_results(&mut buf, &series, &ReportHeader::new("flops", 0.0)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_report_sections() {
        let text = render(&[
            TaskRecord::new(0.0, 10.0).with_weight(50.0),
            TaskRecord::new(0.0, 5.0).with_weight(50.0),
            TaskRecord::failed(1.0),
        ]);

        assert!(text.contains("Run:          flops"));
        assert!(text.contains("Aggregated: 2"));
        assert!(text.contains("Failed:     1"));
        assert!(text.contains("Effective Rate: 10/s"));
        assert!(text.contains("Peak Tasks:     2"));
        assert!(text.contains("Concurrency:"));
        assert!(!text.contains("Malformed"));
        // 50/10 = 5 and 50/5 = 10 per task, one task per bin
        assert!(text.contains("Mode: 5-6/s (1 tasks)"));
    }

    #[test]
    fn test_report_empty_run() {
        let text = render(&[]);

        assert!(text.contains("No tasks aggregated"));
        assert!(!text.contains("Concurrency:"));
    }
}
