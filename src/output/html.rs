//! HTML writer

use super::traits::{OutputResult, ResultSink};
use crate::record::MessageRecord;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Writes a minimal standalone HTML document
///
/// Message text is escaped so stray markup in a post can't alter the page.
pub struct HtmlSink;

impl ResultSink for HtmlSink {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, records: &[MessageRecord], _delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        let mut html = String::from("<html><head><meta charset=\"utf-8\"></head><body>\n");

        for record in records {
            html.push_str(&format!("<h2>Message ID: {}</h2>\n", encode_text(&record.id)));
            html.push_str(&format!(
                "<p><strong>Date:</strong> {}</p>\n",
                encode_text(&record.timestamp)
            ));
            let text = encode_text(&record.text).replace('\n', "<br>");
            html.push_str(&format!("<p><strong>Text:</strong><br>{}</p>\n", text));
            if record.has_photo() {
                html.push_str(&format!(
                    "<p><strong>Photo:</strong><br><img src=\"{}\" alt=\"Photo\"></p>\n",
                    encode_double_quoted_attribute(&record.photo_ref)
                ));
            }
            html.push_str("<hr>\n");
        }

        html.push_str("</body></html>\n");
        Ok(html.into_bytes())
    }
}
