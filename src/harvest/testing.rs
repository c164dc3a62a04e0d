//! In-memory page source for walker and coordinator tests

use crate::harvest::fetcher::PageSource;
use crate::HarvestError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Timestamp derived from an id so newer ids sort later
pub(crate) fn timestamp_for(day: u32, id: u64) -> String {
    format!(
        "2024-01-{:02}T{:02}:{:02}:{:02}+00:00",
        day,
        (id / 3600) % 24,
        (id / 60) % 60,
        id % 60
    )
}

pub(crate) fn message_html(channel: &str, id: u64, day: u32) -> String {
    format!(
        r#"<div class="tgme_widget_message_wrap js-widget_message_wrap">
  <div class="tgme_widget_message js-widget_message" data-post="{channel}/{id}">
    <div class="tgme_widget_message_text js-message_text" dir="auto">Message {id} from {channel}</div>
    <a class="tgme_widget_message_date" href="https://t.me/{channel}/{id}"><time datetime="{ts}" class="time">00:00</time></a>
  </div>
</div>"#,
        channel = channel,
        id = id,
        ts = timestamp_for(day, id)
    )
}

pub(crate) fn service_html(channel: &str, id: u64) -> String {
    format!(
        r#"<div class="tgme_widget_message_wrap js-widget_message_wrap">
  <div class="tgme_widget_message service_message" data-post="{channel}/{id}">
    <div class="tgme_widget_message_service_text">Channel photo updated</div>
  </div>
</div>"#,
        channel = channel,
        id = id
    )
}

pub(crate) fn page_html(fragments: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>preview</title></head><body><section class=\"tgme_channel_history\">{}</section></body></html>",
        fragments.concat()
    )
}

/// Serves pages of a fixed message history, newest first, `page_size` at a time
pub(crate) struct FeedSource {
    channels: HashMap<String, (Vec<u64>, u32)>,
    page_size: usize,
    ignore_cursor: bool,
    service_only: bool,
    failures_left: AtomicU32,
    requests: Mutex<Vec<(String, Option<u64>)>>,
}

impl FeedSource {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            channels: HashMap::new(),
            page_size,
            ignore_cursor: false,
            service_only: false,
            failures_left: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_channel(self, channel: &str, ids: impl IntoIterator<Item = u64>) -> Self {
        self.with_channel_on_day(channel, ids, 1)
    }

    /// Like `with_channel`, with every timestamp on the given January day
    pub(crate) fn with_channel_on_day(
        mut self,
        channel: &str,
        ids: impl IntoIterator<Item = u64>,
        day: u32,
    ) -> Self {
        let mut ids: Vec<u64> = ids.into_iter().collect();
        ids.sort_unstable();
        self.channels.insert(channel.to_string(), (ids, day));
        self
    }

    /// Always serve the newest page, whatever the cursor
    pub(crate) fn ignoring_cursor(mut self) -> Self {
        self.ignore_cursor = true;
        self
    }

    /// Render every message as a service message
    pub(crate) fn with_service_messages(mut self) -> Self {
        self.service_only = true;
        self
    }

    /// Fail the first `n` requests with a timeout
    pub(crate) fn failing_first(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Cursors requested for a channel, in request order
    pub(crate) fn cursors(&self, channel: &str) -> Vec<Option<u64>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == channel)
            .map(|(_, cursor)| *cursor)
            .collect()
    }
}

#[async_trait]
impl PageSource for FeedSource {
    async fn fetch_page(&self, channel: &str, cursor: Option<u64>) -> Result<String, HarvestError> {
        self.requests
            .lock()
            .unwrap()
            .push((channel.to_string(), cursor));

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(HarvestError::Timeout {
                url: format!("/s/{}", channel),
            });
        }

        let Some((ids, day)) = self.channels.get(channel) else {
            return Err(HarvestError::Status {
                url: format!("/s/{}", channel),
                status: 404,
            });
        };

        let older: Vec<u64> = ids
            .iter()
            .copied()
            .filter(|id| self.ignore_cursor || cursor.map_or(true, |c| *id < c))
            .collect();
        let start = older.len().saturating_sub(self.page_size);

        let fragments: Vec<String> = older[start..]
            .iter()
            .map(|id| {
                if self.service_only {
                    service_html(channel, *id)
                } else {
                    message_html(channel, *id, *day)
                }
            })
            .collect();

        Ok(page_html(&fragments))
    }
}
