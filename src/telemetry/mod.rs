//! Per-task telemetry records
//!
//! A benchmark run produces one [`TaskRecord`] per dispatched task. Records are
//! collected into a [`TelemetryBatch`] together with the wall-clock instant
//! the run started, which becomes t=0 for every time series derived from it.
//!
//! Batches are stored as JSON so that a write run, a read run, and the
//! aggregation step can happen in separate invocations.
//!
//! # Example
//!
//! ```
//! use taskpulse::telemetry::{TaskRecord, TelemetryBatch};
//!
//! let mut batch = TelemetryBatch::new("flops", 100.0);
//! batch.push(TaskRecord::new(100.5, 110.5).with_weight(2.0e9));
//! batch.push(TaskRecord::failed(100.5));
//!
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch.successful().count(), 1);
//! ```

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Reasons a record cannot be aggregated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("end time {end} precedes start time {start}")]
    EndBeforeStart { start: f64, end: f64 },

    #[error("timestamp is not finite (start={start}, end={end})")]
    NonFiniteTimestamp { start: f64, end: f64 },

    #[error("weight {0} is negative or not finite")]
    InvalidWeight(f64),

    #[error("rate {0} is negative or not finite")]
    InvalidRate(f64),
}

/// Telemetry of a single task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Absolute time the task started executing (epoch seconds)
    pub start_time: f64,
    /// Absolute time the task finished (epoch seconds)
    pub end_time: f64,
    /// Work completed (FLOPs, bytes, ...); absent means 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Rate measured by the task itself (e.g. MB/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// Task did not complete successfully
    #[serde(default)]
    pub failed: bool,
    /// Object key or other task identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl TaskRecord {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            weight: None,
            rate: None,
            failed: false,
            key: None,
        }
    }

    /// A record for a task that failed; its timestamps are not meaningful
    pub fn failed(at: f64) -> Self {
        Self {
            failed: true,
            ..Self::new(at, at)
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Task duration in seconds
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Weight, defaulting to 1 when absent
    #[inline]
    pub fn weight_or_unit(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    /// Check that the record can be aggregated
    pub fn validate(&self) -> std::result::Result<(), RecordError> {
        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            return Err(RecordError::NonFiniteTimestamp {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.end_time < self.start_time {
            return Err(RecordError::EndBeforeStart {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecordError::InvalidWeight(weight));
            }
        }
        if let Some(rate) = self.rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(RecordError::InvalidRate(rate));
            }
        }
        Ok(())
    }
}

/// All telemetry of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBatch {
    /// Free-form label ("write", "read", "flops", ...)
    #[serde(default)]
    pub label: String,
    /// Wall-clock instant the run was started (epoch seconds); t=0 for every series
    pub start_time: f64,
    /// Wall time of the whole run as seen by the dispatcher
    #[serde(default)]
    pub total_time: f64,
    pub records: Vec<TaskRecord>,
}

impl TelemetryBatch {
    pub fn new(label: impl Into<String>, start_time: f64) -> Self {
        Self {
            label: label.into(),
            start_time,
            total_time: 0.0,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TaskRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records not flagged as failed
    pub fn successful(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter().filter(|r| !r.failed)
    }

    /// Keys of every record that carries one, in record order
    pub fn keys(&self) -> Vec<String> {
        self.records.iter().filter_map(|r| r.key.clone()).collect()
    }
}

/// Load a telemetry batch from a JSON file
pub fn load_batch(path: &Path) -> Result<TelemetryBatch> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open telemetry file: {}", path.display()))?;

    let batch: TelemetryBatch = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse telemetry file: {}", path.display()))?;

    Ok(batch)
}

/// Save a telemetry batch as pretty-printed JSON
pub fn save_batch(batch: &TelemetryBatch, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create telemetry file: {}", path.display()))?;

    serde_json::to_writer_pretty(BufWriter::new(file), batch)
        .with_context(|| format!("Failed to write telemetry file: {}", path.display()))?;

    Ok(())
}
