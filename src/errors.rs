//! Error type shared by the decoders, encoders and the driver.
//!
//! Parse and validation errors carry a location: an element path for XML,
//! a field path or line/column for JSON.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    /// Malformed syntax or a missing required element in the source document.
    #[error("Parse Error at {location}: {message}")]
    Parse { location: String, message: String },

    /// Well-formed document that breaks a cross-reference or ordering rule.
    #[error("Validation Error at {location}: {message}")]
    Validation { location: String, message: String },

    /// The model cannot be serialized in the requested format.
    #[error("Encode Error: {0}")]
    Encode(String),

    #[error("I/O Error: {1} - {0}")]
    Io(#[source] std::io::Error, String),

    #[error("JSON Schema Validation Error: {0}")]
    SchemaValidation(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),
}

impl ConverterError {
    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConverterError::Parse {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn validation(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConverterError::Validation {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ConverterError::Parse { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ConverterError::Validation { .. })
    }

    pub fn is_encode(&self) -> bool {
        matches!(self, ConverterError::Encode(_))
    }
}

// Implement From<io::Error> for easier error handling
impl From<std::io::Error> for ConverterError {
    fn from(err: std::io::Error) -> Self {
        ConverterError::Io(err, "IO operation failed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_location() {
        let err = ConverterError::validation(
            "vulnerabilities[0].product_statuses[0]",
            "unknown product id 'CSAFPID-9999'",
        );
        let msg = err.to_string();
        assert!(msg.contains("vulnerabilities[0]"));
        assert!(msg.contains("CSAFPID-9999"));
        assert!(err.is_validation());
        assert!(!err.is_parse());
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err = ConverterError::from(io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
