use crate::config::types::Config;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// A missing file is not an error: a warning is logged and the defaults are
/// returned. A file that exists but cannot be read or parsed is an error.
/// Validation is left to the caller so command-line overrides can be
/// applied first.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Parsed configuration merged over the defaults
/// * `Err(ConfigError)` - Failed to read or parse the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(
                "Configuration file not found: {}, using defaults",
                path.display()
            );
            return Ok(Config::default());
        }
        Err(e) => return Err(e.into()),
    };

    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration that
/// produced them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Writes the default configuration as TOML to `path`
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    tracing::info!("Created default configuration file: {}", path.display());
    Ok(())
}
