//! CSV output formatting
//!
//! Two files per report, ready for pandas, R, or a spreadsheet:
//!
//! - `<path>`: one row per time bin
//!   (`timestamp,elapsed_sec,concurrency,peak_rate,bandwidth`)
//! - `<stem>_rolling.csv`: one row per completion (`elapsed_sec,rate`)
//!
//! The `bandwidth` column is empty when no task reported a measured rate.

use super::ReportHeader;
use crate::stats::{AggregateSeries, RatePoint};
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const BIN_HEADER: &str = "timestamp,elapsed_sec,concurrency,peak_rate,bandwidth";
const ROLLING_HEADER: &str = "elapsed_sec,rate";

/// Row-at-a-time writer for the per-bin series
pub struct CsvWriter<W: Write> {
    out: W,
}

impl<W: Write> CsvWriter<W> {
    /// Wrap a writer and emit the header row
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", BIN_HEADER)?;
        Ok(Self { out })
    }

    /// Append one bin
    pub fn append_bin(
        &mut self,
        timestamp: &str,
        elapsed_sec: f64,
        concurrency: u32,
        peak_rate: f64,
        bandwidth: Option<f64>,
    ) -> Result<()> {
        match bandwidth {
            Some(bw) => writeln!(
                self.out,
                "{},{:.3},{},{:.6},{:.6}",
                timestamp, elapsed_sec, concurrency, peak_rate, bw
            )?,
            None => writeln!(
                self.out,
                "{},{:.3},{},{:.6},",
                timestamp, elapsed_sec, concurrency, peak_rate
            )?,
        }
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Write every bin of `series`
pub fn write_bin_series<W: Write>(out: W, series: &AggregateSeries, header: &ReportHeader) -> Result<()> {
    let mut writer = CsvWriter::new(out)?;

    for (bin, elapsed) in series.bin_starts().into_iter().enumerate() {
        writer.append_bin(
            &header.format_timestamp(elapsed),
            elapsed,
            series.concurrency_curve[bin],
            series.peak_rate_curve[bin],
            series.bandwidth_curve.as_ref().map(|curve| curve[bin]),
        )?;
    }

    writer.finish()?;
    Ok(())
}

/// Write the rolling effective rate curve
pub fn write_rolling_curve<W: Write>(mut out: W, points: &[RatePoint]) -> Result<()> {
    writeln!(out, "{}", ROLLING_HEADER)?;
    for point in points {
        writeln!(out, "{:.6},{:.6}", point.elapsed, point.rate)?;
    }
    out.flush()?;
    Ok(())
}

/// Path of the rolling curve file that accompanies `path`
///
/// `out/run.csv` becomes `out/run_rolling.csv`.
pub fn rolling_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    path.with_file_name(format!("{}_rolling.csv", stem))
}

/// Write both CSV files, returning the path of the rolling curve file
pub fn write_csv_output(path: &Path, series: &AggregateSeries, header: &ReportHeader) -> Result<PathBuf> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV output: {}", path.display()))?;
    write_bin_series(BufWriter::new(file), series, header)?;

    let rolling = rolling_path(path);
    let file = File::create(&rolling)
        .with_context(|| format!("Failed to create CSV output: {}", rolling.display()))?;
    write_rolling_curve(BufWriter::new(file), &series.rolling_rate_curve)?;

    Ok(rolling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregationConfig;
    use crate::stats::TelemetryAggregator;
    use crate::telemetry::TaskRecord;
    use tempfile::tempdir;

    fn series() -> AggregateSeries {
        let records = vec![
            TaskRecord::new(0.0, 10.0).with_weight(50.0),
            TaskRecord::new(0.0, 5.0).with_weight(50.0),
        ];
        TelemetryAggregator::new(AggregationConfig::default())
            .aggregate(&records, 0.0, 1.0)
            .unwrap()
    }

    #[test]
    fn test_bin_series_rows() {
        let series = series();
        let mut buf = Vec::new();
        write_bin_series(&mut buf, &series, &ReportHeader::new("flops", 0.0)).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], BIN_HEADER);
        assert_eq!(lines.len(), series.bin_count + 1);
        assert_eq!(lines[1], "1970-01-01T00:00:00.000Z,0.000,2,15.000000,");
        assert_eq!(lines[6], "1970-01-01T00:00:05.000Z,5.000,1,5.000000,");
    }

    #[test]
    fn test_bandwidth_column() {
        let records = vec![TaskRecord::new(0.0, 2.0).with_rate(3.5)];
        let series = TelemetryAggregator::new(AggregationConfig::default())
            .aggregate(&records, 0.0, 1.0)
            .unwrap();

        let mut buf = Vec::new();
        write_bin_series(&mut buf, &series, &ReportHeader::new("upload", 0.0)).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.lines().nth(1).unwrap().ends_with(",3.500000"));
        assert!(text.lines().nth(3).unwrap().ends_with(",0.000000"));
    }

    #[test]
    fn test_rolling_path() {
        assert_eq!(rolling_path(Path::new("out/run.csv")), PathBuf::from("out/run_rolling.csv"));
        assert_eq!(rolling_path(Path::new("run")), PathBuf::from("run_rolling.csv"));
    }

    #[test]
    fn test_write_csv_output_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.csv");

        let rolling = write_csv_output(&path, &series(), &ReportHeader::new("flops", 0.0)).unwrap();
        assert_eq!(rolling, dir.path().join("series_rolling.csv"));

        let bins = std::fs::read_to_string(&path).unwrap();
        assert!(bins.starts_with(BIN_HEADER));

        let curve = std::fs::read_to_string(&rolling).unwrap();
        assert_eq!(curve, "elapsed_sec,rate\n5.000000,10.000000\n10.000000,10.000000\n");
    }
}
