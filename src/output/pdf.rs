//! PDF writer
//!
//! Uses the built-in Helvetica face, so no font files are needed. Built-in
//! PDF fonts only cover ASCII; any other character is printed as `?`.

use super::traits::{OutputError, OutputResult, ResultSink};
use crate::record::MessageRecord;
use printpdf::{BuiltinFont, Mm, PdfDocument};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const LINE_HEIGHT: f32 = 7.0;
const FONT_SIZE: f32 = 12.0;
/// Characters per line at 12pt Helvetica on an A4 page
const WRAP_WIDTH: usize = 90;

/// Writes the labelled fields of each record, one line per field, with the
/// text wrapped to the page width and a blank line between records
pub struct PdfSink;

impl ResultSink for PdfSink {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, records: &[MessageRecord], _delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            "Harvested messages",
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| OutputError::Format(format!("pdf font: {:?}", e)))?;

        let mut current = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT - MARGIN;

        for line in page_lines(records) {
            if y < MARGIN {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                current = doc.get_page(page).get_layer(layer);
                y = PAGE_HEIGHT - MARGIN;
            }
            if !line.is_empty() {
                current.use_text(line, FONT_SIZE, Mm(MARGIN), Mm(y), &font);
            }
            y -= LINE_HEIGHT;
        }

        doc.save_to_bytes()
            .map_err(|e| OutputError::Format(format!("pdf: {:?}", e)))
    }
}

/// Lays out every record as printable lines; empty strings are spacing
fn page_lines(records: &[MessageRecord]) -> Vec<String> {
    let mut lines = Vec::new();

    for record in records {
        lines.push(printable(&format!("Message ID: {}", record.id)));
        lines.push(printable(&format!("Date: {}", record.timestamp)));
        for paragraph in format!("Text: {}", record.text).split('\n') {
            lines.extend(wrap(&printable(paragraph), WRAP_WIDTH));
        }
        if record.has_photo() {
            lines.push(printable(&format!("Photo URL: {}", record.photo_ref)));
        }
        lines.push(String::new());
    }

    lines
}

fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Greedy word wrap; words longer than `width` are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let (head, tail) = word.split_at(width);
            lines.push(head.to_string());
            word = tail;
        }

        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}
