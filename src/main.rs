//! taskpulse CLI entry point

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use taskpulse::config::cli::{Cli, Command};
use taskpulse::config::{cli_convert, toml::load_config, Config};
use taskpulse::driver::{self, LocalObjectStore, ObjectStore};
use taskpulse::output::{write_report, ReportHeader};
use taskpulse::stats::TelemetryAggregator;
use taskpulse::telemetry::{self, TelemetryBatch};
use taskpulse::util::stream::Whence;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_WRITE_TELEMETRY: &str = "taskpulse_write.json";
const DEFAULT_READ_TELEMETRY: &str = "taskpulse_read.json";

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let config = load_config(&cli)?;
    info!("taskpulse v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Aggregate { ref telemetry, .. } => run_aggregate(telemetry, &config),
        Command::Write {
            ref dir,
            ref size,
            count,
            ref telemetry,
            report,
            ..
        } => run_write(dir, size, count, telemetry.as_deref(), report, &config),
        Command::Read {
            ref dir,
            ref keys,
            count,
            ref telemetry,
            report,
            ..
        } => run_read(dir, keys, count, telemetry.as_deref(), report, &config),
        Command::Delete { ref dir, ref keys } => run_delete(dir, keys),
        Command::Generate {
            ref size,
            offset,
            ref output,
            ..
        } => run_generate(size, offset, output.as_deref(), &config),
    }
}

/// Logs go to stderr so stdout stays clean for reports and payloads
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_aggregate(path: &Path, config: &Config) -> Result<()> {
    let batch = telemetry::load_batch(path)?;
    info!("Loaded {} records from {}", batch.len(), path.display());
    report(&batch, config)
}

fn report(batch: &TelemetryBatch, config: &Config) -> Result<()> {
    let aggregator = TelemetryAggregator::new(config.aggregation.clone());
    let series = aggregator.aggregate_batch(batch)?;
    write_report(&series, &ReportHeader::from(batch), &config.output)
}

fn save_telemetry(batch: &TelemetryBatch, path: Option<&Path>, default: &str) -> Result<PathBuf> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(default));
    telemetry::save_batch(batch, &path)?;
    info!("Telemetry saved to {}", path.display());
    Ok(path)
}

fn run_write(
    dir: &Path,
    size: &str,
    count: usize,
    telemetry_path: Option<&Path>,
    report_now: bool,
    config: &Config,
) -> Result<()> {
    let object_size = cli_convert::parse_size(size).context("Invalid object size")?;
    let store = LocalObjectStore::new(dir)?;
    let keys = driver::generate_keys(&config.driver.key_prefix, count);

    let batch = driver::run_write(&store, &keys, object_size, &config.stream, &config.driver)?;
    save_telemetry(&batch, telemetry_path, DEFAULT_WRITE_TELEMETRY)?;

    if report_now {
        report(&batch, config)?;
    }
    Ok(())
}

fn run_read(
    dir: &Path,
    keys_path: &Path,
    count: usize,
    telemetry_path: Option<&Path>,
    report_now: bool,
    config: &Config,
) -> Result<()> {
    let written = telemetry::load_batch(keys_path)?;
    let keys = driver::select_keys(&written.keys(), count);
    if keys.is_empty() {
        anyhow::bail!("No object keys found in {}", keys_path.display());
    }

    let store = LocalObjectStore::new(dir)?;
    let batch = driver::run_read(&store, &keys, &config.driver)?;
    save_telemetry(&batch, telemetry_path, DEFAULT_READ_TELEMETRY)?;

    if report_now {
        report(&batch, config)?;
    }
    Ok(())
}

fn run_delete(dir: &Path, keys_path: &Path) -> Result<()> {
    let written = telemetry::load_batch(keys_path)?;
    let keys = written.keys();

    let store = LocalObjectStore::new(dir)?;
    info!("Deleting {} objects from {} store", keys.len(), store.name());
    let deleted = store.delete_objects(&keys)?;
    info!("Deleted {} objects", deleted);
    Ok(())
}

fn run_generate(size: &str, offset: u64, output: Option<&Path>, config: &Config) -> Result<()> {
    let total = cli_convert::parse_size(size).context("Invalid payload size")?;
    let offset = i64::try_from(offset).context("Offset too large")?;

    let mut stream = driver::payload_stream(total, &config.stream, 0)?;
    stream.seek(offset, Whence::Start);

    let copied = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let copied = io::copy(&mut stream, &mut writer)?;
            writer.flush()?;
            copied
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            let copied = io::copy(&mut stream, &mut writer)?;
            writer.flush()?;
            copied
        }
    };

    info!("Generated {} bytes ({} total, offset {})", copied, total, offset);
    Ok(())
}
