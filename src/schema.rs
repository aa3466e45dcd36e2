//! Optional JSON Schema check of JSON input.
//!
//! This uses the `jsonschema` crate against the bundled
//! `schemas/report.schema.json`. It only covers the shape of the JSON
//! document; cross-references are checked by [`crate::validation`].

use crate::errors::ConverterError;
use log::info;
use serde_json::Value;

/// Schema describing the JSON report layout.
pub const REPORT_SCHEMA: &str = include_str!("../schemas/report.schema.json");

/// Validates raw JSON bytes against a schema string.
pub fn validate_json_schema(schema_str: &str, json: &[u8]) -> Result<(), ConverterError> {
    info!("Loading schema...");
    let schema_json: Value = serde_json::from_str(schema_str)
        .map_err(|e| ConverterError::SchemaValidation(format!("Invalid schema: {}", e)))?;
    let compiled_schema = jsonschema::validator_for(&schema_json)
        .map_err(|e| ConverterError::SchemaValidation(e.to_string()))?;

    let instance: Value = serde_json::from_slice(json).map_err(|e| {
        ConverterError::parse(
            format!("line {}, column {}", e.line(), e.column()),
            format!("Failed to parse report JSON: {}", e),
        )
    })?;

    info!("Validating instance against schema...");
    let problems: Vec<String> = compiled_schema
        .iter_errors(&instance)
        .map(|e| e.to_string())
        .collect();

    if problems.is_empty() {
        info!("Schema validation successful");
        Ok(())
    } else {
        Err(ConverterError::SchemaValidation(format!(
            "Input does not conform to the report schema: {}",
            problems.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "document": {
            "title": "Example",
            "type": "Security Advisory",
            "publisher": { "type": "vendor" },
            "tracking": {
                "id": "EX-1",
                "status": "final",
                "version": "1",
                "revision_history": [
                    { "number": "1", "date": "2021-01-01T00:00:00Z", "description": "Initial" }
                ],
                "initial_release_date": "2021-01-01T00:00:00Z",
                "current_release_date": "2021-01-01T00:00:00Z"
            }
        }
    }"#;

    #[test]
    fn test_bundled_schema_accepts_minimal_report() {
        assert!(validate_json_schema(REPORT_SCHEMA, MINIMAL.as_bytes()).is_ok());
    }

    #[test]
    fn test_bundled_schema_rejects_unknown_status() {
        let bad = MINIMAL.replace(r#""status": "final""#, r#""status": "published""#);
        let err = validate_json_schema(REPORT_SCHEMA, bad.as_bytes()).unwrap_err();
        assert!(matches!(err, ConverterError::SchemaValidation(_)));
    }

    #[test]
    fn test_bundled_schema_rejects_out_of_range_score() {
        let bad = MINIMAL.replacen(
            "\"document\"",
            r#""vulnerabilities": [{"scores": [{"version": "v3", "base_score": 11.0}]}], "document""#,
            1,
        );
        assert!(validate_json_schema(REPORT_SCHEMA, bad.as_bytes()).is_err());
    }
}
