//! Page fetching for channel previews
//!
//! This module handles all HTTP requests for the harvester:
//! - Building one shared HTTP client with a browser user agent and no-cache header
//! - Building preview URLs with an optional `before` cursor
//! - Single-attempt page fetches behind the [`PageSource`] seam
//! - Bounded, fixed-delay retries in [`FetchClient`]

use crate::config::Config;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Upper bound on connection setup, whatever the request timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One attempt at fetching a channel preview page
///
/// Implementations must be safe to share between concurrent walkers.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the page of `channel` older than `cursor`, or the newest page
    /// when no cursor is given
    async fn fetch_page(&self, channel: &str, cursor: Option<u64>) -> Result<String, HarvestError>;
}

/// Builds the HTTP client shared by every walker
///
/// # Arguments
///
/// * `config` - Supplies the user agent and request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(connect_timeout(config))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Connection timeout: the request timeout, capped at ten seconds
fn connect_timeout(config: &Config) -> Duration {
    config.timeout().min(MAX_CONNECT_TIMEOUT)
}

/// Builds the preview URL for a channel page
///
/// `https://<service>/s/<channel>` for the newest page, with
/// `?before=<cursor>` appended for older pages.
///
/// # Example
///
/// ```
/// use channel_harvester::harvest::page_url;
/// use url::Url;
///
/// let base = Url::parse("https://t.me").unwrap();
/// let url = page_url(&base, "durov", Some(120)).unwrap();
/// assert_eq!(url.as_str(), "https://t.me/s/durov?before=120");
/// ```
pub fn page_url(base: &Url, channel: &str, cursor: Option<u64>) -> Result<Url, HarvestError> {
    if channel.is_empty() || !channel.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(HarvestError::InvalidChannel(channel.to_string()));
    }

    let mut root = base.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }

    let mut url = root.join(&format!("s/{}", channel))?;
    if let Some(cursor) = cursor {
        url.query_pairs_mut()
            .append_pair("before", &cursor.to_string());
    }

    Ok(url)
}

/// [`PageSource`] backed by a shared `reqwest` client
pub struct HttpPageSource {
    client: Client,
    base_url: Url,
}

impl HttpPageSource {
    pub fn new(client: Client, base_url: &str) -> Result<Self, HarvestError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, channel: &str, cursor: Option<u64>) -> Result<String, HarvestError> {
        let url = page_url(&self.base_url, channel, cursor)?;
        let url_str = url.to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(&url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(&url_str, e))
    }
}

/// Maps a transport error to the harvester's taxonomy
fn classify(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Wait between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// Fetch client with bounded retries
///
/// Every attempt uses the same cursor. Transport errors, timeouts and
/// non-success statuses are all retried after the same fixed delay.
#[derive(Clone)]
pub struct FetchClient {
    source: Arc<dyn PageSource>,
    policy: RetryPolicy,
}

impl FetchClient {
    pub fn new(source: Arc<dyn PageSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches one page, retrying transient failures
    ///
    /// The cancel flag is checked before every attempt and raced against
    /// the retry delay. A request already in flight is allowed to finish.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The page body
    /// * `Err(HarvestError::Cancelled)` - The run was interrupted between attempts
    /// * `Err(HarvestError::RetriesExhausted)` - Every attempt failed
    pub async fn fetch(
        &self,
        channel: &str,
        cursor: Option<u64>,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<String, HarvestError> {
        let attempts = self.policy.max_attempts;

        for attempt in 1..=attempts {
            if *cancel.borrow() {
                return Err(HarvestError::Cancelled);
            }

            match self.source.fetch_page(channel, cursor).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::warn!(
                        "Request failed (attempt {}/{}) for {}: {}",
                        attempt,
                        attempts,
                        channel,
                        e
                    );
                    if attempt < attempts {
                        tokio::select! {
                            _ = tokio::time::sleep(self.policy.delay) => {}
                            _ = cancelled(cancel) => return Err(HarvestError::Cancelled),
                        }
                    }
                }
            }
        }

        tracing::error!(
            "Failed to get page content for {} after {} attempts",
            channel,
            attempts
        );

        Err(HarvestError::RetriesExhausted {
            url: describe_page(channel, cursor),
            attempts,
        })
    }
}

/// Resolves once the cancel flag is set; never resolves if the sender is gone
pub(crate) async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn describe_page(channel: &str, cursor: Option<u64>) -> String {
    match cursor {
        Some(cursor) => format!("/s/{}?before={}", channel, cursor),
        None => format!("/s/{}", channel),
    }
}
