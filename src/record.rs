//! Message record definitions
//!
//! A [`MessageRecord`] is one extracted channel message. Records are built
//! once by the extractor and never mutated afterwards.

use serde::Serialize;

/// A single harvested message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    /// Per-channel message id, a decimal integer encoded as a string
    #[serde(rename = "message_id")]
    pub id: String,

    /// ISO-8601 timestamp from the message's `<time datetime>` attribute
    #[serde(rename = "date")]
    pub timestamp: String,

    /// Plain message text, entity-decoded
    pub text: String,

    /// Photo URL taken from the photo block's background-image
    #[serde(rename = "photo_url")]
    pub photo_ref: String,
}

impl MessageRecord {
    /// Returns true if this record may be stored
    ///
    /// A record needs an id and at least one of text or photo. Service
    /// messages (joins, pins) carry neither and are dropped.
    pub fn is_retainable(&self) -> bool {
        !self.id.is_empty() && (!self.text.is_empty() || !self.photo_ref.is_empty())
    }

    /// The id as an integer, used for cursor arithmetic
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }

    pub fn has_photo(&self) -> bool {
        !self.photo_ref.is_empty()
    }
}

/// Sorts records newest first by timestamp
///
/// ISO-8601 timestamps in a single format compare correctly as strings.
pub fn sort_newest_first(records: &mut [MessageRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
