//! JSON writer

use super::traits::{OutputResult, ResultSink};
use crate::record::MessageRecord;

/// Writes records as a pretty-printed JSON array
///
/// Non-ASCII text is written as-is, not escaped.
pub struct JsonSink;

impl ResultSink for JsonSink {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, records: &[MessageRecord], _delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(records)?)
    }
}
