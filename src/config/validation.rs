use crate::config::types::{CacheConfig, Config, FetcherConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_cache_config(&config.cache)?;
    validate_fetcher_config(&config.fetcher)?;
    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "capacity must be >= 1, got {}",
            config.capacity
        )));
    }

    if config.minimum_ttl > config.default_ttl {
        return Err(ConfigError::Validation(format!(
            "minimum-ttl ({}s) must not exceed default-ttl ({}s)",
            config.minimum_ttl, config.default_ttl
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be >= 1 second".to_string(),
        ));
    }

    if config.connect_timeout == 0 || config.connect_timeout > config.timeout {
        return Err(ConfigError::Validation(format!(
            "connect-timeout must be between 1 and timeout ({}s), got {}s",
            config.timeout, config.connect_timeout
        )));
    }

    if config.max_body_size == 0 {
        return Err(ConfigError::Validation(
            "max-body-size must be >= 1 byte".to_string(),
        ));
    }

    Ok(())
}
