//! Validation events: one entry per deviation found in an instance
//! document.

use std::fmt;

use iso20022_core::SourceLocation;
use serde::{Deserialize, Serialize};

/// How serious a validation event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document does not conform.
    Error,
    /// The document could not be fully checked.
    Warning,
}

impl Severity {
    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single deviation reported while validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvent {
    severity: Severity,
    message: String,
    location: Option<SourceLocation>,
}

impl ValidationEvent {
    /// Build an event.
    pub fn new(severity: Severity, message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            severity,
            message: message.into(),
            location,
        }
    }

    /// An error at `location`.
    pub fn error(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self::new(Severity::Error, message, location)
    }

    /// A warning at `location`.
    pub fn warning(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self::new(Severity::Warning, message, location)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<SourceLocation> {
        self.location
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(location) = self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_when_known() {
        let event = ValidationEvent::error(
            "The 'urn:x:MsgId' element is invalid.",
            Some(SourceLocation { line: 4, column: 7 }),
        );
        assert_eq!(
            event.to_string(),
            "error: The 'urn:x:MsgId' element is invalid. (line 4, position 7)"
        );
        let warning = ValidationEvent::warning("no schema", None);
        assert_eq!(warning.to_string(), "warning: no schema");
        assert!(warning.is_warning());
        assert!(!warning.is_error());
    }

    #[test]
    fn serializes_severity_lowercase() {
        let event = ValidationEvent::warning("w", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["location"], serde_json::Value::Null);
    }
}
