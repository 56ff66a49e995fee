//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_aggregation(&config.aggregation)?;
    validate_stream(&config.stream)?;
    validate_driver(&config.driver)?;

    Ok(())
}

/// Validate aggregation configuration
pub fn validate_aggregation(aggregation: &AggregationConfig) -> Result<()> {
    if !aggregation.bin_width.is_finite() || aggregation.bin_width <= 0.0 {
        anyhow::bail!("bin_width must be a positive number of seconds, got {}", aggregation.bin_width);
    }

    // Bins must reach past the last completion
    if !aggregation.margin.is_finite() || aggregation.margin < 1.0 {
        anyhow::bail!("margin must be at least 1.0, got {}", aggregation.margin);
    }

    if aggregation.granularity == 0 {
        anyhow::bail!("granularity must be at least 1");
    }

    if aggregation.max_bins < aggregation.granularity || aggregation.max_bins % aggregation.granularity != 0 {
        anyhow::bail!(
            "max_bins must be a positive multiple of granularity ({}), got {}",
            aggregation.granularity,
            aggregation.max_bins
        );
    }

    if !aggregation.rate_bin_width.is_finite() || aggregation.rate_bin_width <= 0.0 {
        anyhow::bail!("rate_bin_width must be positive, got {}", aggregation.rate_bin_width);
    }

    Ok(())
}

/// Validate stream configuration
pub fn validate_stream(stream: &StreamConfig) -> Result<()> {
    if stream.block_size == 0 {
        anyhow::bail!("stream block_size must be greater than 0");
    }
    if stream.block_size > isize::MAX as u64 {
        anyhow::bail!("stream block_size too large: {}", stream.block_size);
    }

    Ok(())
}

/// Validate load driver configuration
pub fn validate_driver(driver: &DriverConfig) -> Result<()> {
    if driver.parallelism == 0 {
        anyhow::bail!("driver.parallelism must be at least 1");
    }

    if driver.read_chunk == 0 {
        anyhow::bail!("driver.read_chunk must be greater than 0");
    }

    if driver.read_times == 0 {
        anyhow::bail!("driver.read_times must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_bin_width() {
        let mut config = Config::default();
        config.aggregation.bin_width = 0.0;
        assert!(validate_config(&config).is_err());

        config.aggregation.bin_width = f64::NAN;
        assert!(validate_config(&config).is_err());

        config.aggregation.bin_width = -1.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_margin_and_granularity() {
        let mut config = Config::default();
        config.aggregation.margin = 0.9;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.aggregation.granularity = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.aggregation.margin = 1.0;
        config.aggregation.granularity = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_max_bins() {
        let mut config = Config::default();
        config.aggregation.max_bins = 0;
        assert!(validate_config(&config).is_err());

        config.aggregation.max_bins = 100;
        assert!(validate_config(&config).is_err());

        config.aggregation.max_bins = 96;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_stream_and_driver() {
        let mut config = Config::default();
        config.stream.block_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.driver.parallelism = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.driver.read_times = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.driver.read_chunk = 0;
        assert!(validate_config(&config).is_err());
    }
}
