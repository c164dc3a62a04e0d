//! Configuration module for the harvester
//!
//! This module handles loading, defaulting, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use channel_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Harvesting {} channels", config.channels.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DEFAULT_BASE_URL, DEFAULT_MAX_EMPTY_PAGES, DEFAULT_MAX_RETRIES,
    DEFAULT_POLITENESS_DELAY_MS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, write_default_config};
pub use validation::validate;
