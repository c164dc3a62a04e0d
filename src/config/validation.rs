use crate::config::types::Config;
use crate::output::OutputFormat;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Runs after command-line overrides are merged in, and before any network
/// activity. Any failure here is fatal.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_channels(&config.channels)?;
    validate_start_ids(config)?;
    validate_limits(config)?;
    validate_base_url(&config.base_url)?;

    if config.output_format.parse::<OutputFormat>().is_err() {
        tracing::warn!(
            "Unrecognized output format '{}', json will be used",
            config.output_format
        );
    }

    Ok(())
}

/// Validates the channel list
fn validate_channels(channels: &[String]) -> Result<(), ConfigError> {
    if channels.is_empty() {
        return Err(ConfigError::Validation(
            "No channels specified. Provide channels in the config file or via --channels"
                .to_string(),
        ));
    }

    for channel in channels {
        validate_channel_name(channel)?;
    }

    Ok(())
}

/// Validates a public channel username
pub(crate) fn validate_channel_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "Channel name cannot be empty".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(format!(
            "Channel name must contain only letters, digits and underscores, got '{}'",
            name
        )));
    }

    Ok(())
}

/// Start ids must be positive
fn validate_start_ids(config: &Config) -> Result<(), ConfigError> {
    for (channel, id) in &config.start_ids {
        if *id == 0 {
            return Err(ConfigError::Validation(format!(
                "start_ids entry for '{}' must be a positive message id",
                channel
            )));
        }

        if !config.channels.contains(channel) {
            tracing::warn!("start_ids entry for '{}' matches no configured channel", channel);
        }
    }

    Ok(())
}

/// Validates retry, timeout and stop-condition limits
fn validate_limits(config: &Config) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.max_empty_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_empty_pages must be >= 1, got {}",
            config.max_empty_pages
        )));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1 second, got {}",
            config.timeout
        )));
    }

    Ok(())
}

/// The base URL must be an absolute http(s) URL
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    Ok(())
}
