//! Fleet coordinator - runs one walker per channel and merges the results
//!
//! This module contains the fan-out/fan-in orchestration:
//! - Building the shared HTTP client and fetch policy
//! - Spawning one walker task per configured channel
//! - Tracking aggregate progress across walkers
//! - Merging every walker's records into one timestamp-ordered set
//! - Handing the merged set to the selected output writer

use crate::config::Config;
use crate::harvest::fetcher::{build_http_client, FetchClient, HttpPageSource, PageSource, RetryPolicy};
use crate::harvest::walker::{ChannelWalker, WalkSettings, WalkSummary};
use crate::output::{output_filename, sink_for, OutputError, OutputFormat};
use crate::record::{sort_newest_first, MessageRecord};
use crate::state::StopReason;
use crate::HarvestError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Combined result of a harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestOutcome {
    /// Every channel's records, newest first
    pub records: Vec<MessageRecord>,

    /// One summary per walker that finished, in configuration order
    pub walks: Vec<WalkSummary>,
}

impl HarvestOutcome {
    /// Returns true if any walker stopped because of an interrupt
    pub fn interrupted(&self) -> bool {
        self.walks
            .iter()
            .any(|walk| walk.stop_reason == StopReason::Cancelled)
    }
}

/// Main harvest coordinator
pub struct Coordinator {
    config: Arc<Config>,
    client: FetchClient,
    progress: Arc<AtomicUsize>,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client or base URL could not be set up
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let http = build_http_client(&config).map_err(|source| HarvestError::Http {
            url: config.base_url.clone(),
            source,
        })?;
        let source = HttpPageSource::new(http, &config.base_url)?;

        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Creates a coordinator over any page source
    pub fn with_source(config: Config, source: Arc<dyn PageSource>) -> Self {
        let client = FetchClient::new(source, RetryPolicy::from_config(&config));

        Self {
            config: Arc::new(config),
            client,
            progress: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Records accepted so far across all walkers
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Runs every channel walker concurrently and merges their records
    ///
    /// Walkers share nothing but the fetch client and the progress counter.
    /// A walker that fails or panics never affects its siblings. When
    /// `cancel` flips to `true`, walkers stop at their next checkpoint and
    /// whatever they collected is still merged.
    pub async fn run(&self, cancel: watch::Receiver<bool>) -> HarvestOutcome {
        let settings = WalkSettings::from_config(&self.config);
        let total = self.config.channels.len();

        tracing::info!("Starting harvest of {} channels", total);

        let mut handles = Vec::with_capacity(total);
        for channel in &self.config.channels {
            let walker = ChannelWalker::new(
                channel.clone(),
                self.config.start_id_for(channel),
                self.client.clone(),
                settings,
                self.progress.clone(),
                cancel.clone(),
            );
            let span = tracing::info_span!("walker", channel = %channel);
            handles.push((channel.clone(), tokio::spawn(walker.run().instrument(span))));
        }

        let mut outcome = HarvestOutcome::default();
        for (channel, handle) in handles {
            match handle.await {
                Ok(report) => {
                    outcome.walks.push(report.summary);
                    outcome.records.extend(report.records);
                    tracing::info!(
                        "Progress: {} messages collected, {}/{} channels finished",
                        self.progress(),
                        outcome.walks.len(),
                        total
                    );
                }
                Err(e) => {
                    tracing::error!("Walker for {} ended abnormally: {}", channel, e);
                }
            }
        }

        sort_newest_first(&mut outcome.records);

        tracing::info!(
            "Harvest finished: {} messages from {} channels",
            outcome.records.len(),
            outcome.walks.len()
        );

        outcome
    }

    /// Writes the outcome with the configured output format
    ///
    /// The records are written as given: already deduplicated and ordered.
    /// A write failure is logged and returned; the outcome itself is untouched.
    pub fn deliver(&self, outcome: &HarvestOutcome) -> Result<PathBuf, OutputError> {
        let format = OutputFormat::from_name_or_default(&self.config.output_format);
        let sink = sink_for(format);
        let filename = output_filename(sink.extension(), chrono::Local::now());
        let path = Path::new(&self.config.output_dir).join(filename);

        match sink.save(&outcome.records, &path, self.config.delimiter.as_deref()) {
            Ok(()) => {
                tracing::info!("Results saved to {}", path.display());
                Ok(path)
            }
            Err(e) => {
                tracing::error!("Error saving results: {}", e);
                Err(e)
            }
        }
    }
}
