//! taskpulse - Telemetry aggregation for massively parallel task benchmarks
//!
//! taskpulse reconstructs what a fleet of concurrently running tasks did as a
//! whole from nothing but per-task start/end timestamps and work counts.
//!
//! # Architecture
//!
//! - **Telemetry**: per-task records and run batches, stored as JSON
//! - **Aggregation**: concurrency, peak rate, bandwidth, and rolling effective rate
//!   curves over fixed-width time bins
//! - **Payload stream**: seekable pseudorandom bytes in O(block size) memory
//! - **Load driver**: parallel object writes and reads against a local store
//! - **Output**: console, JSON, and CSV reports

pub mod config;
pub mod driver;
pub mod output;
pub mod stats;
pub mod telemetry;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use stats::{AggregateSeries, TelemetryAggregator};
pub use telemetry::{TaskRecord, TelemetryBatch};
pub use util::stream::BlockRandomStream;

/// Result type used throughout taskpulse
pub type Result<T> = anyhow::Result<T>;
