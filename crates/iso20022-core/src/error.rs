//! # Error Types
//!
//! Errors shared across the workspace. All errors use `thiserror`.
//!
//! ## Design
//!
//! - `ConfigurationError` is the only class allowed to fail loudly. It marks
//!   a programming mistake (a root document type that cannot be built), never
//!   a data problem, and always names the offending type.
//! - `MarkupError` carries the source location of the fault when the parser
//!   knows it, so callers can surface it in diagnostics.

use thiserror::Error;

use crate::markup::SourceLocation;

/// Fatal setup error raised while building a document wrapper.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The root document type exposes no zero-argument construction path.
    #[error("root document type '{type_name}' has no zero-argument constructor")]
    NoConstructor {
        /// Fully qualified name of the root document type.
        type_name: &'static str,
    },

    /// The construction path exists but yielded no usable instance.
    #[error("constructor of root document type '{type_name}' produced no document")]
    NoDocumentCreated {
        /// Fully qualified name of the root document type.
        type_name: &'static str,
    },
}

impl ConfigurationError {
    /// Name of the root document type the error is about.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NoConstructor { type_name } | Self::NoDocumentCreated { type_name } => type_name,
        }
    }
}

/// An encoding name that matches neither wire encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown encoding: {0:?} (expected \"markup\"/\"xml\" or \"object-notation\"/\"json\")")]
pub struct UnknownEncoding(pub String);

/// Error while parsing markup text into an element tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// The input held no root element.
    #[error("document has no root element")]
    Empty,

    /// The input is not well-formed.
    #[error("malformed markup at {location}: {reason}")]
    Malformed {
        /// Where the parser stopped.
        location: SourceLocation,
        /// Parser diagnostic.
        reason: String,
    },

    /// A qualified name uses a prefix with no namespace declaration in scope.
    #[error("namespace prefix '{prefix}' is not declared (at {location})")]
    UnboundPrefix {
        /// The undeclared prefix.
        prefix: String,
        /// Element or attribute position.
        location: SourceLocation,
    },
}

impl MarkupError {
    /// Source location of the fault, when known.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Empty => None,
            Self::Malformed { location, .. } | Self::UnboundPrefix { location, .. } => {
                Some(*location)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_type() {
        let err = ConfigurationError::NoConstructor {
            type_name: "pacs008::Document",
        };
        assert_eq!(err.type_name(), "pacs008::Document");
        assert!(err.to_string().contains("pacs008::Document"));
        assert!(err.to_string().contains("zero-argument"));

        let err = ConfigurationError::NoDocumentCreated {
            type_name: "pacs002::Document",
        };
        assert!(err.to_string().contains("produced no document"));
    }

    #[test]
    fn markup_error_location() {
        let location = SourceLocation { line: 3, column: 7 };
        let err = MarkupError::Malformed {
            location,
            reason: "bad".to_string(),
        };
        assert_eq!(err.location(), Some(location));
        assert!(err.to_string().contains("line 3, position 7"));
        assert_eq!(MarkupError::Empty.location(), None);
    }
}
