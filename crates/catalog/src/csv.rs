//! CSV import/export of SKU lists.
//!
//! Format: one code per line in the first column, optional `SKU` header line.
//! Exports add a `Timestamp` column; imports only read the code column.

use chrono::{NaiveDate, SecondsFormat};
use thiserror::Error;

use crate::record::SkuRecord;
use crate::registry::HEADER_TOKEN;

/// Header cell of the export's second column.
pub const TIMESTAMP_HEADER: &str = "Timestamp";

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("malformed csv: {0}")]
    Read(#[from] ::csv::Error),

    #[error("failed to write csv: {0}")]
    Write(String),
}

/// Extract candidate codes (first column) from CSV text.
///
/// Header and blank filtering is left to `Registry::import_batch`, which owns
/// that rule; rows are returned as read.
pub fn parse_import(text: &str) -> Result<Vec<String>, CsvError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut codes = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(code) = row.get(0) {
            codes.push(code.to_string());
        }
    }
    Ok(codes)
}

/// Render records as `SKU,Timestamp` CSV, in the order given.
pub fn write_export<'a>(records: impl IntoIterator<Item = &'a SkuRecord>) -> Result<String, CsvError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record([HEADER_TOKEN, TIMESTAMP_HEADER])?;

    for record in records {
        let stamp = record.issued_at().to_rfc3339_opts(SecondsFormat::Secs, true);
        writer.write_record([record.code(), stamp.as_str()])?;
    }

    let bytes = writer.into_inner().map_err(|e| CsvError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CsvError::Write(e.to_string()))
}

/// Download name for an export taken on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("SKU_List_{}.csv", date.format("%Y-%m-%d"))
}
