//! Document-level metadata.

use crate::fidelity::XmlFidelity;
use crate::model::common::{Note, Reference, Timestamp, Translations};
use crate::model::vocabulary::{DocumentStatus, PartyType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,

    #[serde(default, skip_serializing_if = "Translations::is_empty")]
    pub title_translations: Translations,

    /// Document category, e.g. "Security Advisory".
    #[serde(rename = "type")]
    pub doc_type: String,

    pub publisher: Publisher,

    pub tracking: Tracking,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,

    #[serde(default, skip_serializing_if = "Translations::is_empty")]
    pub distribution_translations: Translations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_severity: Option<AggregateSeverity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(rename = "type")]
    pub publisher_type: PartyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_details: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuing_authority: Option<String>,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracking {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    pub status: DocumentStatus,

    pub version: String,

    pub revision_history: Vec<Revision>,

    pub initial_release_date: Timestamp,

    pub current_release_date: Timestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<Generator>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub number: String,
    pub date: Timestamp,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSeverity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub text: String,

    #[serde(skip)]
    pub xml: XmlFidelity,
}
