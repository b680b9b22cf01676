//! Errors raised while loading a schema definition into the aggregate.
//!
//! Validation problems in instance documents are never errors of this
//! type; they are recorded as [`ValidationEvent`](crate::ValidationEvent)s.

use iso20022_core::MarkupError;
use thiserror::Error;

/// A schema definition could not be added to the aggregate.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The source could not be read.
    #[error("cannot read schema source '{source_name}': {error}")]
    Io {
        /// Path or name of the source.
        source_name: String,
        /// Underlying I/O failure.
        #[source]
        error: std::io::Error,
    },

    /// The source is not well-formed markup.
    #[error("schema source '{source_name}' is not well-formed: {error}")]
    Malformed {
        /// Path or name of the source.
        source_name: String,
        /// Parser failure with its location.
        #[source]
        error: MarkupError,
    },

    /// The markup is well-formed but is not a usable schema definition.
    #[error("schema source '{source_name}' is invalid: {reason}")]
    Invalid {
        /// Path or name of the source.
        source_name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A global component is already declared by another definition with
    /// the same target namespace.
    #[error("schema source '{source_name}' redeclares {kind} '{name}' already declared by '{existing}'")]
    Duplicate {
        /// Path or name of the rejected source.
        source_name: String,
        /// Component kind (`element`, `type`, `attribute`, ...).
        kind: &'static str,
        /// Qualified component name.
        name: String,
        /// Source that declared it first.
        existing: String,
    },

    /// A named resource was not found in its provider.
    #[error("schema resource '{name}' not found")]
    MissingResource {
        /// Resource name requested.
        name: String,
    },
}

/// Why a document was not accepted by [`SchemaAggregator::try_validate`](crate::SchemaAggregator::try_validate).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// The document is not well-formed markup.
    #[error("document is not well-formed: {0}")]
    Malformed(#[from] MarkupError),

    /// The document parsed but the validation policy rejects its events.
    #[error("document rejected with {errors} error(s) and {warnings} warning(s)")]
    Rejected {
        /// Errors found in this document.
        errors: usize,
        /// Warnings found in this document.
        warnings: usize,
    },
}

impl SchemaError {
    pub(crate) fn invalid(source_name: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the source the error concerns.
    pub fn source_name(&self) -> &str {
        match self {
            Self::Io { source_name, .. }
            | Self::Malformed { source_name, .. }
            | Self::Invalid { source_name, .. }
            | Self::Duplicate { source_name, .. } => source_name,
            Self::MissingResource { name } => name,
        }
    }
}
