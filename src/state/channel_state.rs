use crate::record::MessageRecord;
use std::collections::HashMap;

/// Lowest message id a channel can have
const EARLIEST_ID: u64 = 1;

/// Outcome of offering a record to a channel's dedup set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New record, now stored
    Accepted,

    /// Id already stored; the earlier copy is kept
    Duplicate,

    /// Record fails the retention rule or has a non-numeric id
    Rejected,
}

/// Tracks the walk state of a single channel
///
/// Owned and mutated by exactly one walker. Once the walker stops, the state
/// is frozen and only read.
#[derive(Debug, Clone)]
pub struct ChannelState {
    /// Channel username
    pub channel: String,

    /// Oldest id observed so far; the next page is requested "before" it
    pub cursor: Option<u64>,

    /// Configured id the walk starts below, if any
    pub start_id: Option<u64>,

    /// Newest id observed so far
    pub high_water_mark: Option<u64>,

    /// Stored records keyed by id
    pub seen: HashMap<String, MessageRecord>,

    /// Consecutive pages that yielded no newly accepted record
    pub consecutive_empty_pages: u32,

    /// Pages successfully fetched
    pub pages_fetched: u32,
}

impl ChannelState {
    /// Creates the initial state for a channel
    ///
    /// With a start id the first page requested is the one before it;
    /// without one the walk begins at the newest page.
    pub fn new(channel: impl Into<String>, start_id: Option<u64>) -> Self {
        Self {
            channel: channel.into(),
            cursor: start_id,
            start_id,
            high_water_mark: None,
            seen: HashMap::new(),
            consecutive_empty_pages: 0,
            pages_fetched: 0,
        }
    }

    /// Offers a record to the dedup set
    ///
    /// Accepted records move the cursor down and the high-water mark up.
    /// The cursor never increases.
    pub fn accept(&mut self, record: MessageRecord) -> Admission {
        if !record.is_retainable() {
            return Admission::Rejected;
        }

        let Some(id) = record.numeric_id() else {
            return Admission::Rejected;
        };

        if self.seen.contains_key(&record.id) {
            return Admission::Duplicate;
        }

        if self.high_water_mark.map_or(true, |hwm| id > hwm) {
            self.high_water_mark = Some(id);
        }

        if self.cursor.map_or(true, |cursor| id < cursor) {
            self.cursor = Some(id);
        }

        self.seen.insert(record.id.clone(), record);
        Admission::Accepted
    }

    /// Counts a page without new records and returns the updated streak
    pub fn note_empty_page(&mut self) -> u32 {
        self.consecutive_empty_pages += 1;
        self.consecutive_empty_pages
    }

    pub fn reset_empty_pages(&mut self) {
        self.consecutive_empty_pages = 0;
    }

    /// Returns true if the cursor is at the first message of the channel
    pub fn reached_earliest(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor <= EARLIEST_ID)
    }

    /// Lowest stored id; unlike the cursor this ignores the start id
    pub fn oldest_id(&self) -> Option<u64> {
        self.seen.values().filter_map(MessageRecord::numeric_id).min()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Consumes the state and returns its records in no particular order
    pub fn into_records(self) -> Vec<MessageRecord> {
        self.seen.into_values().collect()
    }
}
