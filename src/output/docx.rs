//! Word document writer

use super::traits::{OutputError, OutputResult, ResultSink};
use crate::record::MessageRecord;
use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use std::io::Cursor;

const HEADING_STYLE: &str = "Heading2";

/// Writes one heading per record followed by its field paragraphs and a
/// `---` separator
pub struct DocxSink;

impl ResultSink for DocxSink {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extension(&self) -> &'static str {
        "docx"
    }

    fn render(&self, records: &[MessageRecord], _delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        let mut doc = Docx::new().add_style(
            Style::new(HEADING_STYLE, StyleType::Paragraph)
                .name("Heading 2")
                .bold()
                .size(26),
        );

        for record in records {
            doc = doc
                .add_paragraph(
                    paragraph(&format!("Message ID: {}", record.id)).style(HEADING_STYLE),
                )
                .add_paragraph(paragraph(&format!("Date: {}", record.timestamp)))
                .add_paragraph(paragraph(&format!("Text: {}", record.text)));
            if record.has_photo() {
                doc = doc.add_paragraph(paragraph(&format!("Photo URL: {}", record.photo_ref)));
            }
            doc = doc.add_paragraph(paragraph("---"));
        }

        let mut buffer = Cursor::new(Vec::new());
        doc.build()
            .pack(&mut buffer)
            .map_err(|e| OutputError::Format(format!("docx: {}", e)))?;

        Ok(buffer.into_inner())
    }
}

/// One paragraph, with line breaks in `text` kept as breaks
fn paragraph(text: &str) -> Paragraph {
    let mut run = Run::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Paragraph::new().add_run(run)
}
