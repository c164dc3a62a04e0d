//! Output module for writing harvested records
//!
//! This module handles:
//! - Mapping format names onto result writers
//! - Naming output files
//! - Summarising a run for the console

mod csv;
mod docx;
mod html;
mod json;
mod markdown;
mod pdf;
pub mod stats;
mod text;
mod traits;
mod xlsx;

pub use csv::CsvSink;
pub use docx::DocxSink;
pub use html::HtmlSink;
pub use json::JsonSink;
pub use markdown::MarkdownSink;
pub use pdf::PdfSink;
pub use stats::{print_statistics, HarvestStatistics};
pub use text::TextSink;
pub use traits::{OutputError, OutputResult, ResultSink};
pub use xlsx::XlsxSink;

use chrono::{DateTime, TimeZone};
use std::fmt;
use std::str::FromStr;

/// Output format names accepted in config and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Txt,
    Markdown,
    Pdf,
    Html,
    Xlsx,
    Docx,
    Csv,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 8] = [
        OutputFormat::Json,
        OutputFormat::Txt,
        OutputFormat::Markdown,
        OutputFormat::Pdf,
        OutputFormat::Html,
        OutputFormat::Xlsx,
        OutputFormat::Docx,
        OutputFormat::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Html => "html",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Docx => "docx",
            OutputFormat::Csv => "csv",
        }
    }

    /// Parses a format name, falling back to JSON for unknown names
    pub fn from_name_or_default(name: &str) -> Self {
        match name.parse() {
            Ok(format) => format,
            Err(_) => {
                tracing::warn!("Unknown output format '{}', using json", name);
                OutputFormat::Json
            }
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == lower)
            .ok_or_else(|| OutputError::UnknownFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the writer for a format
pub fn sink_for(format: OutputFormat) -> Box<dyn ResultSink> {
    match format {
        OutputFormat::Json => Box::new(JsonSink),
        OutputFormat::Txt => Box::new(TextSink),
        OutputFormat::Markdown => Box::new(MarkdownSink),
        OutputFormat::Html => Box::new(HtmlSink),
        OutputFormat::Csv => Box::new(CsvSink),
        OutputFormat::Pdf => Box::new(PdfSink),
        OutputFormat::Xlsx => Box::new(XlsxSink),
        OutputFormat::Docx => Box::new(DocxSink),
    }
}

/// Builds the output file name for a run
///
/// # Example
///
/// ```
/// use channel_harvester::output::output_filename;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
/// assert_eq!(output_filename("json", now), "telegram_posts_20240305_140709.json");
/// ```
pub fn output_filename<Tz: TimeZone>(extension: &str, now: DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "telegram_posts_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        extension
    )
}
