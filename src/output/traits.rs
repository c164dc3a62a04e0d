//! Output writer traits and errors
//!
//! This module defines the trait interface every result writer implements.

use crate::record::MessageRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for result writers
///
/// A sink turns the final, ordered record set into one document, text or
/// binary. Sinks are stateless so a single instance can be shared across runs.
pub trait ResultSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// File extension without the leading dot
    fn extension(&self) -> &'static str;

    /// Renders the records into the document bytes
    ///
    /// # Arguments
    ///
    /// * `records` - Records in the order they should appear
    /// * `delimiter` - Optional separator override; writers that have no
    ///   use for one ignore it
    fn render(&self, records: &[MessageRecord], delimiter: Option<&str>) -> OutputResult<Vec<u8>>;

    /// Renders the records and writes them to `path`
    fn save(
        &self,
        records: &[MessageRecord],
        path: &Path,
        delimiter: Option<&str>,
    ) -> OutputResult<()> {
        let body = self.render(records, delimiter)?;
        std::fs::write(path, body)?;
        Ok(())
    }
}
