//! Channel walker: backward pagination over one channel
//!
//! The walker is an explicit state machine over [`WalkPhase`]:
//!
//! ```text
//! Fetching -> Parsing -> Evaluating -> Fetching | Stopped
//! ```
//!
//! The first page is the one before the configured start id, or the newest
//! page when the channel has none. The walker fetches the page before the
//! current cursor, offers every extracted
//! record to the channel's dedup set, and then applies the stop conditions:
//!
//! | Condition | Result |
//! |-----------|--------|
//! | Fetch failed after all retries | `Stopped(FetchFailed)` |
//! | `max_empty_pages` pages in a row without a new record | `Stopped(EmptyPages)` |
//! | Cursor at id 1 | `Stopped(ReachedEarliest)` |
//! | Operator interrupt | `Stopped(Cancelled)` |
//!
//! Nothing in here can fail the run; every error ends (at most) this walk.

use crate::config::Config;
use crate::harvest::extractor::{extract, split_fragments};
use crate::harvest::fetcher::{cancelled, FetchClient};
use crate::record::MessageRecord;
use crate::state::{Admission, ChannelState, StopReason, WalkPhase};
use crate::HarvestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Stop-condition and pacing settings for one walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSettings {
    /// Consecutive pages without a new record before stopping
    pub max_empty_pages: u32,

    /// Wait between successive pages
    pub politeness_delay: Duration,
}

impl WalkSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_empty_pages: config.max_empty_pages.max(1),
            politeness_delay: config.politeness_delay(),
        }
    }
}

/// Per-channel outcome of a walk, without the records themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub channel: String,
    pub stop_reason: StopReason,
    pub records: usize,
    pub pages_fetched: u32,
    pub oldest_id: Option<u64>,
    pub newest_id: Option<u64>,
}

/// Frozen result of one channel walk
#[derive(Debug, Clone)]
pub struct WalkReport {
    pub summary: WalkSummary,
    pub records: Vec<MessageRecord>,
}

/// What one page contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    /// No message containers at all
    Empty,

    /// Containers found; `accepted` of them were new and retainable
    Parsed { fragments: usize, accepted: usize },
}

/// Drives the fetch/parse/evaluate loop for a single channel
pub struct ChannelWalker {
    state: ChannelState,
    phase: WalkPhase,
    client: FetchClient,
    settings: WalkSettings,
    progress: Arc<AtomicUsize>,
    cancel: watch::Receiver<bool>,
}

impl ChannelWalker {
    /// Creates a walker in the `Fetching` phase
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel username
    /// * `start_id` - Optional id to start below; becomes the initial cursor
    /// * `client` - Fetch client, usually shared with sibling walkers
    /// * `settings` - Stop-condition and pacing settings
    /// * `progress` - Run-wide counter of accepted records
    /// * `cancel` - Flips to `true` when the operator interrupts the run
    pub fn new(
        channel: impl Into<String>,
        start_id: Option<u64>,
        client: FetchClient,
        settings: WalkSettings,
        progress: Arc<AtomicUsize>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            state: ChannelState::new(channel, start_id),
            phase: WalkPhase::Fetching,
            client,
            settings,
            progress,
            cancel,
        }
    }

    pub fn phase(&self) -> WalkPhase {
        self.phase
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Runs the walk to completion
    ///
    /// Always returns a report; a walk that stopped early (failed fetch,
    /// interrupt) still carries everything it collected.
    pub async fn run(mut self) -> WalkReport {
        tracing::info!(
            "Starting harvest of {} (before: {:?})",
            self.state.channel,
            self.state.start_id
        );

        let mut body = String::new();
        let mut outcome = PageOutcome::Empty;

        let reason = loop {
            let next = match self.phase {
                WalkPhase::Fetching => match self.fetch_page().await {
                    Ok(page) => {
                        body = page;
                        WalkPhase::Parsing
                    }
                    Err(reason) => WalkPhase::Stopped(reason),
                },
                WalkPhase::Parsing => {
                    outcome = self.parse_page(&body);
                    WalkPhase::Evaluating
                }
                WalkPhase::Evaluating => self.evaluate(outcome).await,
                WalkPhase::Stopped(reason) => break reason,
            };

            tracing::trace!("{}: {} -> {}", self.state.channel, self.phase, next);
            self.phase = next;
        };

        self.finish(reason)
    }

    /// Fetching: one bounded-retry request at the current cursor
    async fn fetch_page(&mut self) -> Result<String, StopReason> {
        if self.is_cancelled() {
            return Err(StopReason::Cancelled);
        }

        let fetched = self
            .client
            .fetch(&self.state.channel, self.state.cursor, &mut self.cancel)
            .await;

        match fetched {
            Ok(body) => {
                self.state.pages_fetched += 1;
                Ok(body)
            }
            Err(HarvestError::Cancelled) => Err(StopReason::Cancelled),
            Err(e) => {
                tracing::error!("Stopping {}: {}", self.state.channel, e);
                Err(StopReason::FetchFailed)
            }
        }
    }

    /// Parsing: extract every fragment and offer it to the dedup set
    fn parse_page(&mut self, body: &str) -> PageOutcome {
        let fragments = match split_fragments(body) {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::error!("Error splitting page for {}: {}", self.state.channel, e);
                return PageOutcome::Empty;
            }
        };

        if fragments.is_empty() {
            return PageOutcome::Empty;
        }

        let mut accepted = 0;
        for fragment in &fragments {
            let record = match extract(fragment) {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!("Error parsing message in {}: {}", self.state.channel, e);
                    continue;
                }
            };

            let id = record.id.clone();
            match self.state.accept(record) {
                Admission::Accepted => {
                    accepted += 1;
                    self.progress.fetch_add(1, Ordering::Relaxed);
                }
                Admission::Duplicate => {
                    tracing::debug!("Already have message {} in {}", id, self.state.channel);
                }
                Admission::Rejected => {
                    tracing::info!("Skipping empty or invalid message, ID: {:?}", id);
                }
            }
        }

        tracing::info!(
            "Scraped {} new messages from {}. Total: {}",
            accepted,
            self.state.channel,
            self.state.len()
        );

        PageOutcome::Parsed {
            fragments: fragments.len(),
            accepted,
        }
    }

    /// Evaluating: apply the stop conditions, then pace the next request
    async fn evaluate(&mut self, outcome: PageOutcome) -> WalkPhase {
        let yielded = match outcome {
            // Refetched at the same cursor, still after the politeness delay
            PageOutcome::Empty => {
                tracing::debug!("Empty page for {}", self.state.channel);
                false
            }
            PageOutcome::Parsed { accepted, fragments } => {
                if accepted == 0 {
                    tracing::debug!(
                        "No new messages among {} on page for {}",
                        fragments,
                        self.state.channel
                    );
                }
                accepted > 0
            }
        };

        if yielded {
            self.state.reset_empty_pages();
        } else {
            let streak = self.state.note_empty_page();
            if streak >= self.settings.max_empty_pages {
                tracing::info!(
                    "No new messages for {} consecutive pages in {}. Stopping.",
                    streak,
                    self.state.channel
                );
                return WalkPhase::Stopped(StopReason::EmptyPages);
            }
        }

        if self.state.reached_earliest() {
            tracing::info!("Reached the earliest message in {}. Stopping.", self.state.channel);
            return WalkPhase::Stopped(StopReason::ReachedEarliest);
        }

        if self.pause().await {
            WalkPhase::Fetching
        } else {
            WalkPhase::Stopped(StopReason::Cancelled)
        }
    }

    /// Waits the politeness delay; returns false if interrupted
    async fn pause(&mut self) -> bool {
        if self.is_cancelled() {
            return false;
        }

        let slept = tokio::select! {
            _ = tokio::time::sleep(self.settings.politeness_delay) => true,
            _ = cancelled(&mut self.cancel) => false,
        };

        slept && !self.is_cancelled()
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    fn finish(self, reason: StopReason) -> WalkReport {
        tracing::info!(
            "Harvest completed for {} ({}). Total messages saved: {}",
            self.state.channel,
            reason,
            self.state.len()
        );

        let summary = WalkSummary {
            channel: self.state.channel.clone(),
            stop_reason: reason,
            records: self.state.len(),
            pages_fetched: self.state.pages_fetched,
            oldest_id: self.state.oldest_id(),
            newest_id: self.state.high_water_mark,
        };

        WalkReport {
            summary,
            records: self.state.into_records(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::fetcher::RetryPolicy;
    use crate::harvest::testing::FeedSource;

    fn settings() -> WalkSettings {
        WalkSettings {
            max_empty_pages: 3,
            politeness_delay: Duration::from_secs(1),
        }
    }

    fn walker(
        source: Arc<FeedSource>,
        channel: &str,
        start_id: Option<u64>,
        max_attempts: u32,
    ) -> (ChannelWalker, watch::Sender<bool>) {
        let policy = RetryPolicy {
            max_attempts,
            delay: Duration::from_secs(2),
        };
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let walker = ChannelWalker::new(
            channel,
            start_id,
            FetchClient::new(source, policy),
            settings(),
            Arc::new(AtomicUsize::new(0)),
            cancel_rx,
        );
        (walker, cancel_tx)
    }

    fn assert_unique_ids(report: &WalkReport) {
        let mut ids: Vec<_> = report.records.iter().map(|r| r.id.clone()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total, "duplicate ids in {}", report.summary.channel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_walks_back_to_earliest_message() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", 1..=45));
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 3);

        let report = walker.run().await;

        assert_eq!(report.summary.stop_reason, StopReason::ReachedEarliest);
        assert_eq!(report.records.len(), 45);
        assert_eq!(report.summary.oldest_id, Some(1));
        assert_eq!(report.summary.newest_id, Some(45));
        assert_eq!(report.summary.pages_fetched, 3);
        assert_unique_ids(&report);

        assert_eq!(source.cursors("alpha"), vec![None, Some(26), Some(6)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_never_increases() {
        let source = Arc::new(FeedSource::new(7).with_channel("alpha", 1..=60));
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 3);

        walker.run().await;

        let cursors: Vec<u64> = source.cursors("alpha").into_iter().flatten().collect();
        assert!(!cursors.is_empty());
        assert!(cursors.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_max_empty_pages() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", Vec::new()));
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 3);

        let report = walker.run().await;

        assert_eq!(report.summary.stop_reason, StopReason::EmptyPages);
        assert!(report.records.is_empty());
        // three empty fetches, never a fourth
        assert_eq!(source.request_count(), 3);
        assert_eq!(source.cursors("alpha"), vec![None, None, None]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pages_are_spaced_by_politeness_delay() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", Vec::new()));
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 3);

        let started = tokio::time::Instant::now();
        walker.run().await;

        // one pause between each pair of the three fetches
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(source.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_pages_count_as_empty() {
        let source = Arc::new(
            FeedSource::new(20)
                .with_channel("alpha", 10..=12)
                .ignoring_cursor(),
        );
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 3);

        let report = walker.run().await;

        assert_eq!(report.summary.stop_reason, StopReason::EmptyPages);
        assert_eq!(report.records.len(), 3);
        // one productive page, then three pages of repeats
        assert_eq!(source.request_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_messages_are_not_stored() {
        let source = Arc::new(
            FeedSource::new(20)
                .with_channel("alpha", 5..=6)
                .with_service_messages(),
        );
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 3);

        let report = walker.run().await;

        assert!(report.records.is_empty());
        assert_eq!(report.summary.stop_reason, StopReason::EmptyPages);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_id_is_first_cursor() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", 1..=300));
        let (walker, _cancel) = walker(source.clone(), "alpha", Some(100), 3);

        let report = walker.run().await;

        let cursors = source.cursors("alpha");
        assert_eq!(cursors[0], Some(100));
        assert!(cursors.iter().all(|cursor| matches!(cursor, Some(c) if *c <= 100)));
        assert_eq!(report.summary.stop_reason, StopReason::ReachedEarliest);
        assert_eq!(report.records.len(), 99);
        assert_eq!(report.summary.newest_id, Some(99));
        assert_eq!(report.summary.oldest_id, Some(1));
        assert!(report.records.iter().all(|r| r.numeric_id().unwrap() < 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_id_below_channel_history() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", 150..=200));
        let (walker, _cancel) = walker(source.clone(), "alpha", Some(100), 3);

        let report = walker.run().await;

        assert!(report.records.is_empty());
        assert_eq!(report.summary.stop_reason, StopReason::EmptyPages);
        assert_eq!(report.summary.oldest_id, None);
        // never asks for anything newer than the start id
        assert_eq!(source.cursors("alpha"), vec![Some(100); 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_transient_failures() {
        let source = Arc::new(
            FeedSource::new(20)
                .with_channel("alpha", 1..=5)
                .failing_first(2),
        );
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 3);

        let report = walker.run().await;

        assert_eq!(report.records.len(), 5);
        assert_eq!(report.summary.stop_reason, StopReason::ReachedEarliest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_end_the_walk() {
        let source = Arc::new(
            FeedSource::new(20)
                .with_channel("alpha", 1..=5)
                .failing_first(2),
        );
        let (walker, _cancel) = walker(source.clone(), "alpha", None, 2);

        let report = walker.run().await;

        assert_eq!(report.summary.stop_reason, StopReason::FetchFailed);
        assert!(report.records.is_empty());
        assert_eq!(report.summary.pages_fetched, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_retry_delay() {
        let source = Arc::new(
            FeedSource::new(20)
                .with_channel("alpha", 1..=5)
                .failing_first(2),
        );
        let (walker, cancel) = walker(source.clone(), "alpha", None, 3);

        let handle = tokio::spawn(walker.run());
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.send(true).unwrap();

        let report = handle.await.unwrap();

        assert_eq!(report.summary.stop_reason, StopReason::Cancelled);
        assert!(report.records.is_empty());
        assert_eq!(source.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", 1..=100));
        let (walker, cancel) = walker(source.clone(), "alpha", None, 3);

        cancel.send(true).unwrap();
        let report = walker.run().await;

        assert_eq!(report.summary.stop_reason, StopReason::Cancelled);
        assert_eq!(source.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_keeps_partial_results() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", 1..=100));
        let (walker, cancel) = walker(source.clone(), "alpha", None, 3);

        let handle = tokio::spawn(walker.run());
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.send(true).unwrap();

        let report = handle.await.unwrap();

        assert_eq!(report.summary.stop_reason, StopReason::Cancelled);
        assert_eq!(report.records.len(), 20);
        assert_eq!(source.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_counter() {
        let source = Arc::new(FeedSource::new(20).with_channel("alpha", 1..=30));
        let policy = RetryPolicy {
            max_attempts: 1,
            delay: Duration::ZERO,
        };
        let progress = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = watch::channel(false);
        let walker = ChannelWalker::new(
            "alpha",
            None,
            FetchClient::new(source, policy),
            settings(),
            progress.clone(),
            rx,
        );

        assert_eq!(walker.phase(), WalkPhase::Fetching);
        walker.run().await;

        assert_eq!(progress.load(Ordering::Relaxed), 30);
    }
}
