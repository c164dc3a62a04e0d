//! Run statistics
//!
//! This module condenses a harvest outcome into per-channel figures and
//! prints them at the end of a run.

use crate::harvest::{HarvestOutcome, WalkSummary};
use crate::state::StopReason;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Records in the merged result set
    pub total_records: usize,

    /// Records carrying a photo
    pub records_with_photo: usize,

    /// Pages requested across all channels
    pub total_pages: u32,

    /// Channels that stopped at their earliest message or an empty streak
    pub channels_completed: usize,

    /// Channels that gave up on a failed fetch
    pub channels_failed: usize,

    /// True if the run was interrupted
    pub interrupted: bool,

    /// Per-channel walk summaries
    pub channels: Vec<WalkSummary>,
}

impl HarvestStatistics {
    pub fn from_outcome(outcome: &HarvestOutcome) -> Self {
        let walks = &outcome.walks;

        Self {
            total_records: outcome.records.len(),
            records_with_photo: outcome.records.iter().filter(|r| r.has_photo()).count(),
            total_pages: walks.iter().map(|w| w.pages_fetched).sum(),
            channels_completed: walks.iter().filter(|w| w.stop_reason.is_complete()).count(),
            channels_failed: walks
                .iter()
                .filter(|w| w.stop_reason == StopReason::FetchFailed)
                .count(),
            interrupted: outcome.interrupted(),
            channels: walks.clone(),
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total messages: {}", stats.total_records);
    println!("  Messages with photo: {}", stats.records_with_photo);
    println!("  Pages fetched: {}", stats.total_pages);
    println!(
        "  Channels completed: {}/{}",
        stats.channels_completed,
        stats.channels.len()
    );
    if stats.channels_failed > 0 {
        println!("  Channels failed: {}", stats.channels_failed);
    }
    if stats.interrupted {
        println!("  Run was interrupted; results are partial");
    }
    println!();

    println!("Channels:");
    for walk in &stats.channels {
        let range = match (walk.oldest_id, walk.newest_id) {
            (Some(oldest), Some(newest)) => format!("ids {}..={}", oldest, newest),
            _ => "no messages".to_string(),
        };
        println!(
            "  {}: {} messages, {} pages, {} ({})",
            walk.channel, walk.records, walk.pages_fetched, range, walk.stop_reason
        );
    }
    println!();
}
