//! Plain text writer

use super::traits::{OutputResult, ResultSink};
use crate::record::MessageRecord;

const DEFAULT_DELIMITER: &str = "\n";

/// Writes one labelled block per record
///
/// Every field line ends with the delimiter and an extra delimiter closes the
/// block. The photo line is only written when the record has a photo.
pub struct TextSink;

impl ResultSink for TextSink {
    fn name(&self) -> &'static str {
        "txt"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, records: &[MessageRecord], delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        let delim = delimiter.unwrap_or(DEFAULT_DELIMITER);
        let mut out = String::new();

        for record in records {
            out.push_str(&format!("ID: {}{}", record.id, delim));
            out.push_str(&format!("Date: {}{}", record.timestamp, delim));
            out.push_str(&format!("Text: {}{}", record.text, delim));
            if record.has_photo() {
                out.push_str(&format!("Photo URL: {}{}", record.photo_ref, delim));
            }
            out.push_str(delim);
        }

        Ok(out.into_bytes())
    }
}
