//! Harvest module for walking channel history
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with bounded retries
//! - Message extraction with two merged strategies
//! - Per-channel backward pagination with dedup and stop conditions
//! - Fleet coordination across channels

mod coordinator;
mod extractor;
mod fetcher;
#[cfg(test)]
mod testing;
mod walker;

pub use coordinator::{Coordinator, HarvestOutcome};
pub use extractor::{
    background_image_url, extract, extract_pattern, extract_structured, merge, split_fragments,
    PartialRecord,
};
pub use fetcher::{
    build_http_client, page_url, FetchClient, HttpPageSource, PageSource, RetryPolicy,
};
pub use walker::{ChannelWalker, WalkReport, WalkSettings, WalkSummary};

use crate::config::Config;
use crate::HarvestError;
use tokio::sync::watch;

/// Runs a complete harvest over HTTP
///
/// This is the main entry point for a run. It will:
/// 1. Build the shared HTTP client
/// 2. Walk every configured channel concurrently
/// 3. Merge and order the records
///
/// Writing the result is left to [`Coordinator::deliver`].
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `cancel` - Flips to `true` when the run should stop early
///
/// # Returns
///
/// * `Ok(HarvestOutcome)` - Harvest finished, possibly partially
/// * `Err(HarvestError)` - The HTTP client could not be built
pub async fn harvest(
    config: Config,
    cancel: watch::Receiver<bool>,
) -> Result<HarvestOutcome, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run(cancel).await)
}
