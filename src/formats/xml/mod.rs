//! CVRF 1.2 XML format handler
//!
//! Decoding goes through a namespace-resolved element tree ([`tree`]) that is
//! then mapped onto the model ([`decode`]). Encoding walks the model and
//! writes quick-xml events ([`encode`]).

pub mod decode;
pub mod encode;
pub mod tree;

use crate::errors::ConverterError;
use crate::model::Report;
use std::io::{BufReader, Read, Write};

/// Namespace of the document-level elements.
pub const CVRF_NS: &str = "http://www.icasi.org/CVRF/schema/cvrf/1.2";
/// Namespace of the product tree.
pub const PROD_NS: &str = "http://www.icasi.org/CVRF/schema/prod/1.2";
/// Namespace of vulnerability elements.
pub const VULN_NS: &str = "http://www.icasi.org/CVRF/schema/vuln/1.2";
/// Namespace bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix used for `namespace` when the source gave no spelling to replay.
pub fn default_prefix(namespace: &str) -> &'static str {
    match namespace {
        PROD_NS => "prod",
        VULN_NS => "vuln",
        _ => "cvrf",
    }
}

/// Parse a report from CVRF XML.
///
/// Cross-references are not checked here; see [`crate::formats::decode`].
pub fn parse<R: Read>(reader: R) -> Result<Report, ConverterError> {
    let root = tree::parse_document(BufReader::new(reader))?;
    decode::report_from_tree(&root)
}

/// Write a report as CVRF XML.
pub fn write<W: Write>(mut writer: W, report: &Report) -> Result<(), ConverterError> {
    let bytes = encode::encode_report(report)?;
    writer
        .write_all(&bytes)
        .map_err(|e| ConverterError::Io(e, "Failed to write XML document".to_string()))
}
