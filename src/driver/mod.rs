//! Local load driver
//!
//! Runs many object writes or reads concurrently and records one
//! [`TaskRecord`] per object, producing the same telemetry a fleet of remote
//! workers would. Each task gets its own payload stream, so memory stays at
//! one stream block per in-flight write regardless of object size.
//!
//! # Telemetry
//!
//! - `start_time` / `end_time`: epoch seconds around the whole transfer
//! - `weight`: bytes transferred
//! - `rate`: MB/s (10^6 bytes) measured by the task
//! - `failed`: the transfer returned an error; timestamps are not meaningful

pub mod store;

use crate::config::{DriverConfig, StreamConfig};
use crate::telemetry::{TaskRecord, TelemetryBatch};
use crate::util::stream::BlockRandomStream;
use crate::util::time::{epoch_seconds, transfer_rate_mb};
use crate::Result;
use anyhow::Context;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

pub use store::{LocalObjectStore, ObjectStore};

/// Log progress every this many completed tasks
const PROGRESS_EVERY: usize = 1000;

/// Generate `count` random object keys: `prefix` + 32 upper-case hex characters
pub fn generate_keys(prefix: &str, count: usize) -> Vec<String> {
    let mut rng = Xoshiro256PlusPlus::from_entropy();
    (0..count)
        .map(|_| format!("{}{:032X}", prefix, rng.gen::<u128>()))
        .collect()
}

/// Keys for a read run: all of `keys` when `count` is 0, otherwise `count` keys cycling through `keys`
pub fn select_keys(keys: &[String], count: usize) -> Vec<String> {
    if count == 0 || keys.is_empty() {
        return keys.to_vec();
    }
    (0..count).map(|i| keys[i % keys.len()].clone()).collect()
}

/// Payload stream for one object
///
/// With a configured seed, object `index` gets seed `seed + index` so that
/// objects differ from each other but a rerun reproduces every object.
pub fn payload_stream(size: u64, config: &StreamConfig, index: u64) -> Result<BlockRandomStream> {
    let block_size = usize::try_from(config.block_size)
        .with_context(|| format!("Stream block size too large: {}", config.block_size))?;
    if block_size == 0 {
        anyhow::bail!("Stream block size must be greater than 0");
    }

    let stream = match config.seed {
        Some(seed) => BlockRandomStream::with_seed(size, block_size, seed.wrapping_add(index)),
        None => BlockRandomStream::with_block_size(size, block_size),
    };
    Ok(stream.clamp_seeks(config.clamp_seeks))
}

/// Upload one synthetic payload and time it
pub fn write_object(store: &dyn ObjectStore, key: &str, mut payload: BlockRandomStream) -> TaskRecord {
    let start_time = epoch_seconds();
    let result = store.put_object(key, &mut payload);
    let end_time = epoch_seconds();

    match result {
        Ok(bytes) => {
            let rate = transfer_rate_mb(bytes, end_time - start_time);
            debug!(key, bytes, rate_mb = rate, "object written");
            TaskRecord::new(start_time, end_time)
                .with_weight(bytes as f64)
                .with_rate(rate)
                .with_key(key)
        }
        Err(e) => {
            warn!(key, "write failed: {:#}", e);
            TaskRecord::failed(start_time).with_key(key)
        }
    }
}

/// Read one object `read_times` times in `chunk`-sized reads and time it
pub fn read_object(store: &dyn ObjectStore, key: &str, read_times: usize, chunk: usize) -> TaskRecord {
    let start_time = epoch_seconds();
    let result = read_repeatedly(store, key, read_times, chunk);
    let end_time = epoch_seconds();

    match result {
        Ok(bytes) => {
            let rate = transfer_rate_mb(bytes, end_time - start_time);
            debug!(key, bytes, rate_mb = rate, "object read");
            TaskRecord::new(start_time, end_time)
                .with_weight(bytes as f64)
                .with_rate(rate)
                .with_key(key)
        }
        Err(e) => {
            warn!(key, "read failed: {:#}", e);
            TaskRecord::failed(start_time).with_key(key)
        }
    }
}

fn read_repeatedly(store: &dyn ObjectStore, key: &str, read_times: usize, chunk: usize) -> Result<u64> {
    let mut buf = vec![0u8; chunk.max(1)];
    let mut bytes_read = 0u64;

    for _ in 0..read_times {
        let mut object = store.get_object(key)?;
        loop {
            let n = object
                .read(&mut buf)
                .with_context(|| format!("Failed to read object: {}", key))?;
            if n == 0 {
                break;
            }
            bytes_read += n as u64;
        }
    }

    Ok(bytes_read)
}

fn build_pool(parallelism: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1))
        .thread_name(|i| format!("taskpulse-task-{}", i))
        .build()
        .context("Failed to build task thread pool")
}

fn log_progress(done: &AtomicUsize, total: usize, phase: &str) {
    let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
    if completed % PROGRESS_EVERY == 0 || completed == total {
        debug!("{}: {}/{} tasks complete", phase, completed, total);
    }
}

/// Write one `object_size` object per key on `driver.parallelism` threads
pub fn run_write(
    store: &dyn ObjectStore,
    keys: &[String],
    object_size: u64,
    stream: &StreamConfig,
    driver: &DriverConfig,
) -> Result<TelemetryBatch> {
    let pool = build_pool(driver.parallelism)?;

    info!(
        "Writing {} objects of {} bytes to {} store ({} threads)",
        keys.len(),
        object_size,
        store.name(),
        driver.parallelism
    );

    let done = AtomicUsize::new(0);
    let total = keys.len();
    let mut batch = TelemetryBatch::new("write", epoch_seconds());

    let records: Vec<TaskRecord> = pool.install(|| {
        keys.par_iter()
            .enumerate()
            .map(|(index, key)| {
                // Streams are built inside the task so only in-flight writes hold a block
                let record = match payload_stream(object_size, stream, index as u64) {
                    Ok(payload) => write_object(store, key, payload),
                    Err(e) => {
                        warn!(key = key.as_str(), "cannot build payload: {:#}", e);
                        TaskRecord::failed(epoch_seconds()).with_key(key.as_str())
                    }
                };
                log_progress(&done, total, "write");
                record
            })
            .collect()
    });

    batch.total_time = epoch_seconds() - batch.start_time;
    batch.records = records;

    info!(
        "Write finished in {:.3}s ({} failed)",
        batch.total_time,
        batch.records.iter().filter(|r| r.failed).count()
    );
    Ok(batch)
}

/// Read every key `driver.read_times` times on `driver.parallelism` threads
pub fn run_read(store: &dyn ObjectStore, keys: &[String], driver: &DriverConfig) -> Result<TelemetryBatch> {
    let pool = build_pool(driver.parallelism)?;
    let chunk = usize::try_from(driver.read_chunk)
        .with_context(|| format!("Read chunk too large: {}", driver.read_chunk))?;

    info!(
        "Reading {} objects x{} from {} store ({} threads)",
        keys.len(),
        driver.read_times,
        store.name(),
        driver.parallelism
    );

    let done = AtomicUsize::new(0);
    let total = keys.len();
    let mut batch = TelemetryBatch::new("read", epoch_seconds());

    let records: Vec<TaskRecord> = pool.install(|| {
        keys.par_iter()
            .map(|key| {
                let record = read_object(store, key, driver.read_times, chunk);
                log_progress(&done, total, "read");
                record
            })
            .collect()
    });

    batch.total_time = epoch_seconds() - batch.start_time;
    batch.records = records;

    info!(
        "Read finished in {:.3}s ({} failed)",
        batch.total_time,
        batch.records.iter().filter(|r| r.failed).count()
    );
    Ok(batch)
}
