//! JSON format handler

use crate::errors::ConverterError;
use crate::model::Report;
use log::debug;
use std::io::{Read, Write};

/// Parse a report from JSON.
///
/// Cross-references are not checked here; see [`crate::formats::decode`].
pub fn parse<R: Read>(reader: R) -> Result<Report, ConverterError> {
    let report: Report = serde_json::from_reader(reader).map_err(|e| {
        ConverterError::parse(
            format!("line {}, column {}", e.line(), e.column()),
            format!("Failed to parse report JSON: {}", e),
        )
    })?;

    let tracking = &report.document.tracking;
    if tracking.id.trim().is_empty() {
        return Err(ConverterError::parse(
            "document.tracking.id",
            "document tracking id is empty",
        ));
    }
    if tracking.revision_history.is_empty() {
        return Err(ConverterError::parse(
            "document.tracking.revision_history",
            "revision history must contain at least one revision",
        ));
    }

    debug!(
        "Parsed JSON report {} with {} vulnerabilities",
        tracking.id,
        report.vulnerabilities.len()
    );
    Ok(report)
}

/// Write a report as JSON.
pub fn write<W: Write>(mut writer: W, report: &Report) -> Result<(), ConverterError> {
    report.check_encodable()?;
    report.validate()?;

    let mut bytes = serde_json::to_vec_pretty(report)
        .map_err(|e| ConverterError::Encode(format!("Failed to serialize report JSON: {}", e)))?;
    bytes.push(b'\n');

    writer
        .write_all(&bytes)
        .map_err(|e| ConverterError::Io(e, "Failed to write JSON document".to_string()))
}
