//! Channel Harvester: incremental history harvesting for public broadcast channels
//!
//! This crate walks the paginated web preview of one or more public channels
//! backwards in time, deduplicates messages across overlapping pages, and
//! hands a single timestamp-ordered result set to an output writer.

pub mod config;
pub mod harvest;
pub mod output;
pub mod record;
pub mod state;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Giving up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid channel name: {0}")]
    InvalidChannel(String),

    #[error("Fragment extraction error: {0}")]
    Extract(String),

    #[error("Interrupted before the page could be fetched")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use harvest::{Coordinator, HarvestOutcome};
pub use record::MessageRecord;
pub use state::{ChannelState, StopReason, WalkPhase};
