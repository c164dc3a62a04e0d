//! CSV writer

use super::traits::{OutputError, OutputResult, ResultSink};
use crate::record::MessageRecord;

const DEFAULT_DELIMITER: &str = ",";
const HEADER: [&str; 4] = ["Message ID", "Date", "Text", "Photo URL"];

/// Writes a header row and one row per record
///
/// Fields containing the delimiter, a quote, or a line break are quoted and
/// inner quotes doubled. Rows end with CRLF.
pub struct CsvSink;

impl ResultSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, records: &[MessageRecord], delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        let delim = delimiter.unwrap_or(DEFAULT_DELIMITER);
        if delim.is_empty() || delim.contains('"') || delim.contains(['\r', '\n']) {
            return Err(OutputError::Format(format!(
                "unusable CSV delimiter {:?}",
                delim
            )));
        }

        let mut out = String::new();
        push_row(&mut out, &HEADER, delim);
        for record in records {
            push_row(
                &mut out,
                &[&record.id, &record.timestamp, &record.text, &record.photo_ref],
                delim,
            );
        }

        Ok(out.into_bytes())
    }
}

fn push_row(out: &mut String, fields: &[&str], delim: &str) {
    let row: Vec<String> = fields.iter().map(|field| quote(field, delim)).collect();
    out.push_str(&row.join(delim));
    out.push_str("\r\n");
}

fn quote(field: &str, delim: &str) -> String {
    if field.contains(delim) || field.contains(['"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
