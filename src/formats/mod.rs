//! Format definition and the decode/encode entry points.
//!
//! The caller picks the [`Format`] explicitly for both directions; nothing
//! in here looks at file names or sniffs content.

pub mod json;
pub mod xml;

use crate::errors::ConverterError;
use crate::model::Report;
use clap::ValueEnum;
use std::io::{Read, Write};
use std::path::Path;

/// Supported report formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// CSAF-style JSON
    Json,
    /// CVRF 1.2 XML
    Xml,
}

impl Format {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Result<Self, ConverterError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ConverterError::InvalidInput(format!(
                    "Could not determine file extension for: {}",
                    path.display()
                ))
            })?;

        match extension.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            ext => Err(ConverterError::InvalidInput(format!(
                "Unsupported file format: .{}. Supported formats: .json, .xml",
                ext
            ))),
        }
    }

    /// Get the typical file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }
}

/// Decodes one complete document and validates its cross-references.
pub fn decode<R: Read>(format: Format, reader: R) -> Result<Report, ConverterError> {
    let report = decode_lenient(format, reader)?;
    report.validate()?;
    Ok(report)
}

/// Decodes one complete document without the cross-reference checks.
///
/// Structural problems still fail with [`ConverterError::Parse`].
pub fn decode_lenient<R: Read>(format: Format, reader: R) -> Result<Report, ConverterError> {
    match format {
        Format::Json => json::parse(reader),
        Format::Xml => xml::parse(reader),
    }
}

/// Encodes `report` as one complete document.
///
/// Nothing is written to `writer` when encoding fails.
pub fn encode<W: Write>(format: Format, report: &Report, writer: W) -> Result<(), ConverterError> {
    match format {
        Format::Json => json::write(writer, report),
        Format::Xml => xml::write(writer, report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_extension() {
        assert_eq!(
            Format::from_extension(&PathBuf::from("test.json")).unwrap(),
            Format::Json
        );
        assert_eq!(
            Format::from_extension(&PathBuf::from("test.xml")).unwrap(),
            Format::Xml
        );
        assert_eq!(
            Format::from_extension(&PathBuf::from("TEST.JSON")).unwrap(),
            Format::Json
        );
        assert!(Format::from_extension(&PathBuf::from("test.txt")).is_err());
        assert!(Format::from_extension(&PathBuf::from("test")).is_err());
    }

    #[test]
    fn test_extension_method() {
        assert_eq!(Format::Json.extension(), "json");
        assert_eq!(Format::Xml.extension(), "xml");
    }
}
