//! Excel workbook writer

use super::traits::{OutputError, OutputResult, ResultSink};
use crate::record::MessageRecord;
use rust_xlsxwriter::{Workbook, XlsxError};

const HEADER: [&str; 4] = ["Message ID", "Date", "Text", "Photo URL"];

/// Writes one worksheet: a header row, then one row per record
pub struct XlsxSink;

impl ResultSink for XlsxSink {
    fn name(&self) -> &'static str {
        "xlsx"
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn render(&self, records: &[MessageRecord], _delimiter: Option<&str>) -> OutputResult<Vec<u8>> {
        build_workbook(records).map_err(|e| OutputError::Format(format!("xlsx: {}", e)))
    }
}

fn build_workbook(records: &[MessageRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, title) in HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, record.id.as_str())?;
        worksheet.write_string(row, 1, record.timestamp.as_str())?;
        worksheet.write_string(row, 2, record.text.as_str())?;
        worksheet.write_string(row, 3, record.photo_ref.as_str())?;
    }

    workbook.save_to_buffer()
}
