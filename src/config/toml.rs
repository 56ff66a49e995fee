//! TOML configuration file parsing

use super::*;
use crate::config::cli::{AggregationArgs, Cli, Command, DriverArgs, OutputArgs, StreamArgs};
use crate::config::cli_convert::{convert_format, convert_zero_elapsed, parse_seconds, parse_size};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the effective configuration: TOML file (if any), then CLI overrides, then validation
pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };

    let config = merge_cli_with_config(cli, config)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    match &cli.command {
        Command::Aggregate { aggregation, output, .. } => {
            merge_aggregation(aggregation, &mut config.aggregation)?;
            merge_output(output, &mut config.output);
        }
        Command::Write {
            key_prefix,
            driver,
            stream,
            aggregation,
            output,
            ..
        } => {
            if let Some(prefix) = key_prefix {
                config.driver.key_prefix = prefix.clone();
            }
            merge_driver(driver, &mut config.driver);
            merge_stream(stream, &mut config.stream)?;
            merge_aggregation(aggregation, &mut config.aggregation)?;
            merge_output(output, &mut config.output);
        }
        Command::Read {
            read_times,
            chunk,
            driver,
            aggregation,
            output,
            ..
        } => {
            if let Some(times) = read_times {
                config.driver.read_times = *times;
            }
            if let Some(chunk) = chunk {
                config.driver.read_chunk = parse_size(chunk).context("Invalid read chunk size")?;
            }
            merge_driver(driver, &mut config.driver);
            merge_aggregation(aggregation, &mut config.aggregation)?;
            merge_output(output, &mut config.output);
        }
        Command::Generate { stream, .. } => {
            merge_stream(stream, &mut config.stream)?;
        }
        Command::Delete { .. } => {}
    }

    Ok(config)
}

fn merge_aggregation(args: &AggregationArgs, config: &mut AggregationConfig) -> Result<()> {
    if let Some(ref width) = args.bin_width {
        config.bin_width = parse_seconds(width).context("Invalid bin width")?;
    }
    if let Some(margin) = args.margin {
        config.margin = margin;
    }
    if let Some(granularity) = args.granularity {
        config.granularity = granularity;
    }
    if let Some(policy) = args.zero_elapsed {
        config.zero_elapsed = convert_zero_elapsed(policy);
    }
    if let Some(width) = args.rate_bin_width {
        config.rate_bin_width = width;
    }
    if let Some(max_bins) = args.max_bins {
        config.max_bins = max_bins;
    }
    Ok(())
}

fn merge_output(args: &OutputArgs, config: &mut OutputConfig) {
    if let Some(format) = args.format {
        config.format = convert_format(format);
    }
    if let Some(ref path) = args.output {
        config.path = Some(path.clone());
    }
}

fn merge_driver(args: &DriverArgs, config: &mut DriverConfig) {
    if let Some(parallelism) = args.parallelism {
        config.parallelism = parallelism;
    }
}

fn merge_stream(args: &StreamArgs, config: &mut StreamConfig) -> Result<()> {
    if let Some(ref block_size) = args.block_size {
        config.block_size = parse_size(block_size).context("Invalid stream block size")?;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_empty_toml() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            [aggregation]
            bin_width = 0.5
            margin = 1.1
            granularity = 4
            zero_elapsed = "zero"
            rate_bin_width = 10.0
            max_bins = 1024

            [stream]
            block_size = 4096
            clamp_seeks = true
            seed = 42

            [driver]
            parallelism = 3
            read_times = 2
            key_prefix = "bench/"

            [output]
            format = "csv"
            path = "out.csv"
        "#;

        let config = parse_toml_string(toml_str).unwrap();
        assert_eq!(config.aggregation.bin_width, 0.5);
        assert_eq!(config.aggregation.granularity, 4);
        assert_eq!(config.aggregation.zero_elapsed, ZeroElapsedPolicy::Zero);
        assert_eq!(config.aggregation.max_bins, 1024);
        assert_eq!(config.stream.block_size, 4096);
        assert!(config.stream.clamp_seeks);
        assert_eq!(config.stream.seed, Some(42));
        assert_eq!(config.driver.parallelism, 3);
        assert_eq!(config.driver.read_chunk, 1024 * 1024);
        assert_eq!(config.driver.key_prefix, "bench/");
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(config.output.path, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(parse_toml_string("[aggregation]\nbin_width = \"wide\"").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[aggregation]\nbin_width = 5.0\nmargin = 1.5").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::try_parse_from([
            "taskpulse",
            "--config",
            path.as_str(),
            "aggregate",
            "run.json",
            "--bin-width",
            "250ms",
            "--max-bins",
            "4096",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.aggregation.bin_width, 0.25);
        assert_eq!(config.aggregation.max_bins, 4096);
        assert_eq!(config.aggregation.margin, 1.5);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let cli = Cli::try_parse_from(["taskpulse", "aggregate", "run.json", "--bin-width", "0"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_merge_write_stream_args() {
        let cli = Cli::try_parse_from([
            "taskpulse", "write", "--dir", "/tmp/x", "-s", "1M", "-n", "2", "--block-size", "64k", "--seed", "9",
            "--key-prefix", "run1/",
        ])
        .unwrap();

        let config = merge_cli_with_config(&cli, Config::default()).unwrap();
        assert_eq!(config.stream.block_size, 64 * 1024);
        assert_eq!(config.stream.seed, Some(9));
        assert_eq!(config.driver.key_prefix, "run1/");
    }
}
