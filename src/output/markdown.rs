//! Markdown writer

use super::traits::{OutputResult, ResultSink};
use crate::record::MessageRecord;

/// Writes one section per record, separated by horizontal rules
pub struct MarkdownSink;

impl ResultSink for MarkdownSink {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, records: &[MessageRecord], _delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        let mut md = String::new();

        for record in records {
            md.push_str(&format!("## Message ID: {}\n\n", record.id));
            md.push_str(&format!("**Date:** {}\n\n", record.timestamp));
            md.push_str(&format!("**Text:**\n\n{}\n\n", record.text));
            if record.has_photo() {
                md.push_str(&format!("**Photo:** ![Photo]({})\n\n", record.photo_ref));
            }
            md.push_str("---\n\n");
        }

        Ok(md.into_bytes())
    }
}
