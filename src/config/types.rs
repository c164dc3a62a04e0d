use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Source service root; channel previews live under `/s/<channel>`
pub const DEFAULT_BASE_URL: &str = "https://t.me";

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: u64 = 2;
pub const DEFAULT_TIMEOUT: u64 = 10;
pub const DEFAULT_MAX_EMPTY_PAGES: u32 = 3;
pub const DEFAULT_POLITENESS_DELAY_MS: u64 = 1000;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure
///
/// Every field has a default, so a partial (or empty) file is valid input.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channel names to harvest
    pub channels: Vec<String>,

    /// Output format name (json, txt, markdown, pdf, html, xlsx, docx, csv)
    #[serde(alias = "output-format")]
    pub output_format: String,

    /// Field delimiter for the txt and csv writers; each writer has its own default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    /// Total attempts per page fetch
    #[serde(alias = "max-retries")]
    pub max_retries: u32,

    /// Fixed delay between fetch attempts (seconds)
    #[serde(alias = "retry-delay")]
    pub retry_delay: u64,

    /// Per-request timeout (seconds)
    pub timeout: u64,

    /// Consecutive pages without new messages before a walker stops
    #[serde(alias = "max-empty-pages")]
    pub max_empty_pages: u32,

    /// Delay between successive pages of one channel (milliseconds)
    #[serde(alias = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Root URL of the source service
    #[serde(alias = "base-url")]
    pub base_url: String,

    /// Browser user agent sent with every request
    #[serde(alias = "user-agent")]
    pub user_agent: String,

    /// Directory the result file is written to
    #[serde(alias = "output-dir")]
    pub output_dir: String,

    /// Per-channel start ids: the first page requested is the one before this id
    #[serde(alias = "start-ids")]
    pub start_ids: BTreeMap<String, u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            output_format: "json".to_string(),
            delimiter: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
            max_empty_pages: DEFAULT_MAX_EMPTY_PAGES,
            politeness_delay_ms: DEFAULT_POLITENESS_DELAY_MS,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output_dir: ".".to_string(),
            start_ids: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Start id configured for a channel, if any
    pub fn start_id_for(&self, channel: &str) -> Option<u64> {
        self.start_ids.get(channel).copied()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}
