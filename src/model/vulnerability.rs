//! Per-vulnerability content.

use crate::fidelity::XmlFidelity;
use crate::model::common::{Acknowledgment, Note, Reference, Timestamp, Translations};
use crate::model::vocabulary::{
    CvssVersion, InvolvementStatus, PartyType, ProductStatusType, RemediationType, ThreatType,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Translations::is_empty")]
    pub title_translations: Translations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VulnerabilityId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_date: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub involvements: Vec<Involvement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cwe: Vec<Cwe>,

    #[serde(rename = "product_status", default, skip_serializing_if = "Vec::is_empty")]
    pub product_statuses: Vec<ProductStatus>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub threats: Vec<Threat>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<ScoreSet>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediations: Vec<Remediation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acknowledgments: Vec<Acknowledgment>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

/// A tracking id assigned by some other system, e.g. a vendor bug tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityId {
    pub system_name: String,
    pub text: String,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Involvement {
    pub party: PartyType,
    pub status: InvolvementStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cwe {
    pub id: String,
    pub text: String,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStatus {
    #[serde(rename = "type")]
    pub status: ProductStatusType,

    pub product_ids: Vec<String>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    #[serde(rename = "type")]
    pub threat_type: ThreatType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,

    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_ids: Vec<String>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

/// One CVSS scoring, scoped to a set of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub version: CvssVersion,

    pub base_score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environmental_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<String>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remediation {
    #[serde(rename = "type")]
    pub remediation_type: RemediationType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,

    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entitlements: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_ids: Vec<String>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

impl ProductStatus {
    pub fn new(status: ProductStatusType, product_ids: Vec<String>) -> Self {
        Self {
            status,
            product_ids,
            xml: XmlFidelity::none(),
        }
    }
}

impl ScoreSet {
    pub fn new(version: CvssVersion, base_score: f64) -> Self {
        Self {
            version,
            base_score,
            temporal_score: None,
            environmental_score: None,
            vector: None,
            product_ids: Vec::new(),
            xml: XmlFidelity::none(),
        }
    }
}

impl Vulnerability {
    /// Product ids this vulnerability refers to, each with the field it
    /// came from, in document order.
    pub fn referenced_product_ids(&self) -> Vec<(String, &str)> {
        let mut refs = Vec::new();
        for (i, status) in self.product_statuses.iter().enumerate() {
            for id in &status.product_ids {
                refs.push((format!("product_status[{}]", i), id.as_str()));
            }
        }
        for (i, threat) in self.threats.iter().enumerate() {
            for id in &threat.product_ids {
                refs.push((format!("threats[{}]", i), id.as_str()));
            }
        }
        for (i, score) in self.scores.iter().enumerate() {
            for id in &score.product_ids {
                refs.push((format!("scores[{}]", i), id.as_str()));
            }
        }
        for (i, remediation) in self.remediations.iter().enumerate() {
            for id in &remediation.product_ids {
                refs.push((format!("remediations[{}]", i), id.as_str()));
            }
        }
        refs
    }

    pub fn referenced_group_ids(&self) -> Vec<(String, &str)> {
        let mut refs = Vec::new();
        for (i, threat) in self.threats.iter().enumerate() {
            for id in &threat.group_ids {
                refs.push((format!("threats[{}]", i), id.as_str()));
            }
        }
        for (i, remediation) in self.remediations.iter().enumerate() {
            for id in &remediation.group_ids {
                refs.push((format!("remediations[{}]", i), id.as_str()));
            }
        }
        refs
    }

    pub fn has_translations(&self) -> bool {
        !self.title_translations.is_empty() || self.notes.iter().any(Note::has_translations)
    }
}
