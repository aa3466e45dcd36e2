//! The unified report model.
//!
//! One [`Report`] holds everything either format can express. Both decoders
//! produce it and both encoders consume it; nothing here knows about XML or
//! JSON beyond the `serde` attributes, which spell the JSON field names.

pub mod common;
pub mod document;
pub mod product_tree;
pub mod vocabulary;
pub mod vulnerability;

pub use common::{Acknowledgment, Note, Reference, Timestamp, Translations};
pub use document::{AggregateSeverity, DocumentMeta, Generator, Publisher, Revision, Tracking};
pub use product_tree::{Branch, FullProductName, ProductGroup, ProductTree, Relationship};
pub use vocabulary::{
    BranchType, CvssVersion, DocumentStatus, InvolvementStatus, NoteType, PartyType,
    ProductStatusType, ReferenceType, RelationType, RemediationType, ThreatType,
};
pub use vulnerability::{
    Cwe, Involvement, ProductStatus, Remediation, ScoreSet, Threat, Vulnerability,
    VulnerabilityId,
};

use crate::errors::ConverterError;
use crate::fidelity::{XmlFidelity, XmlLayout};
use crate::validation;
use log::warn;
use serde::{Deserialize, Serialize};

/// Root of a vulnerability report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub document: DocumentMeta,

    #[serde(default, skip_serializing_if = "ProductTree::is_empty")]
    pub product_tree: ProductTree,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vulnerabilities: Vec<Vulnerability>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acknowledgments: Vec<Acknowledgment>,

    #[serde(skip)]
    pub xml: XmlFidelity,

    /// Spellings of decoded elements that have no model node.
    #[serde(skip)]
    pub xml_layout: XmlLayout,
}

impl Report {
    /// Checks cross-references and ordering rules.
    ///
    /// Warnings are logged; the first error becomes
    /// [`ConverterError::Validation`].
    pub fn validate(&self) -> Result<(), ConverterError> {
        let report = validation::validate_report(self);
        for issue in report.warnings() {
            warn!("{}", issue.format_plain().trim_end());
        }
        match report.first_error() {
            Some(issue) => Err(ConverterError::validation(
                issue.location.clone().unwrap_or_else(|| "report".to_string()),
                issue.message.clone(),
            )),
            None => Ok(()),
        }
    }

    /// Fails with [`ConverterError::Encode`] when a field every output
    /// format requires is empty.
    pub fn check_encodable(&self) -> Result<(), ConverterError> {
        let tracking = &self.document.tracking;
        let required = [
            ("document.title", self.document.title.as_str()),
            ("document.type", self.document.doc_type.as_str()),
            ("document.tracking.id", tracking.id.as_str()),
            ("document.tracking.version", tracking.version.as_str()),
            (
                "document.tracking.initial_release_date",
                tracking.initial_release_date.as_str(),
            ),
            (
                "document.tracking.current_release_date",
                tracking.current_release_date.as_str(),
            ),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConverterError::Encode(format!(
                    "required field {} is empty",
                    field
                )));
            }
        }
        if tracking.revision_history.is_empty() {
            return Err(ConverterError::Encode(
                "document.tracking.revision_history must contain at least one revision"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// True when any title or note carries a translation.
    pub fn has_translations(&self) -> bool {
        !self.document.title_translations.is_empty()
            || !self.document.distribution_translations.is_empty()
            || self.document.notes.iter().any(Note::has_translations)
            || self.vulnerabilities.iter().any(Vulnerability::has_translations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Report {
        Report {
            document: DocumentMeta {
                title: "Advisory".into(),
                doc_type: "Security Advisory".into(),
                tracking: Tracking {
                    id: "ADV-1".into(),
                    version: "1".into(),
                    revision_history: vec![Revision {
                        number: "1".into(),
                        date: "2021-01-01T00:00:00Z".into(),
                        description: "Initial".into(),
                    }],
                    initial_release_date: "2021-01-01T00:00:00Z".into(),
                    current_release_date: "2021-01-01T00:00:00Z".into(),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_report_is_encodable() {
        let report = minimal();
        assert!(report.check_encodable().is_ok());
        assert!(report.validate().is_ok());
        assert!(!report.has_translations());
    }

    #[test]
    fn test_missing_id_is_encode_error() {
        let mut report = minimal();
        report.document.tracking.id.clear();
        let err = report.check_encodable().unwrap_err();
        assert!(err.is_encode());
        assert!(err.to_string().contains("tracking.id"));
    }

    #[test]
    fn test_empty_revision_history_is_encode_error() {
        let mut report = minimal();
        report.document.tracking.revision_history.clear();
        assert!(report.check_encodable().unwrap_err().is_encode());
    }

    #[test]
    fn test_translation_detection() {
        let mut report = minimal();
        let mut note = Note::new(NoteType::Summary, "Summary");
        note.translations.insert("de", "Zusammenfassung");
        report.vulnerabilities.push(Vulnerability {
            notes: vec![note],
            ..Default::default()
        });
        assert!(report.has_translations());
    }
}
