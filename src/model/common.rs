//! Building blocks shared by the document, the product tree and
//! vulnerabilities.

use crate::fidelity::XmlFidelity;
use crate::model::vocabulary::{NoteType, ReferenceType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Localized variants of a text field, keyed by language tag.
///
/// Only the JSON format can carry these. The map is sorted so output never
/// depends on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(BTreeMap<String, String>);

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Translations {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A date/time as written in the source document.
///
/// The original text is kept so re-encoding never reformats it; [`parse`]
/// interprets it when ordering matters.
///
/// [`parse`]: Timestamp::parse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts RFC 3339, a zone-less `xs:dateTime` (read as UTC) or a bare date.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        let value = self.0.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Free-form text attached to the document or to a vulnerability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub category: NoteType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Translations::is_empty")]
    pub title_translations: Translations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,

    pub text: String,

    #[serde(default, skip_serializing_if = "Translations::is_empty")]
    pub translations: Translations,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

impl Note {
    pub fn new(category: NoteType, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn has_translations(&self) -> bool {
        !self.translations.is_empty() || !self.title_translations.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ReferenceType>,

    pub url: String,

    pub description: String,

    #[serde(skip)]
    pub xml: XmlFidelity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_formats() {
        let rfc = Timestamp::new("2021-03-04T10:00:00Z").parse().unwrap();
        let naive = Timestamp::new("2021-03-04T10:00:00").parse().unwrap();
        assert_eq!(rfc, naive);

        let offset = Timestamp::new("2021-03-04T12:00:00+02:00").parse().unwrap();
        assert_eq!(offset, rfc);

        let date = Timestamp::new("2021-03-04").parse().unwrap();
        assert!(date < rfc);

        assert!(Timestamp::new("yesterday").parse().is_none());
    }

    #[test]
    fn test_translations_are_sorted() {
        let translations: Translations = [("fr", "Bonjour"), ("de", "Hallo")].into_iter().collect();
        let json = serde_json::to_string(&translations).unwrap();
        assert_eq!(json, r#"{"de":"Hallo","fr":"Bonjour"}"#);
    }

    #[test]
    fn test_note_omits_empty_fields() {
        let note = Note::new(NoteType::Summary, "text");
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value, serde_json::json!({"type": "summary", "text": "text"}));
    }
}
