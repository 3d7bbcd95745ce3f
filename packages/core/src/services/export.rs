//! Decoding and parsing of the portal's CSV export.
//!
//! The portal serves Shift_JIS (Windows-31J) files; UTF-8 exports, with or
//! without a BOM, are accepted as well.

use std::borrow::Cow;

use encoding_rs::{SHIFT_JIS, UTF_8};

use crate::monitor::FetchError;
use crate::table::Table;

/// Decode raw export bytes to text.
///
/// A UTF-8 BOM or valid UTF-8 wins; otherwise the bytes must decode cleanly
/// as Shift_JIS.
pub fn decode_export(bytes: &[u8]) -> Result<Cow<'_, str>, FetchError> {
    if let Some(stripped) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return UTF_8
            .decode_without_bom_handling_and_without_replacement(stripped)
            .ok_or_else(|| FetchError::extraction("export has a UTF-8 BOM but invalid UTF-8"));
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }

    SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| FetchError::extraction("export is neither UTF-8 nor Shift_JIS"))
}

/// Parse CSV text into a table. Every record becomes a row, the header
/// included; blank lines are dropped and ragged rows are kept as-is.
pub fn parse_csv(text: &str) -> Result<Table, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| FetchError::extraction(format!("malformed CSV: {}", e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(rows))
}

/// Decode and parse in one step.
pub fn table_from_export(bytes: &[u8]) -> Result<Table, FetchError> {
    parse_csv(&decode_export(bytes)?)
}
