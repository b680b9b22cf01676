//! Errors raised while building message bindings from caller input.

use thiserror::Error;

/// A message could not be built, or a code value is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// BIC is not 8 or 11 alphanumeric characters.
    #[error("invalid BIC: {0}")]
    InvalidBic(String),

    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Amount is zero, negative, or out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A code list value outside the list.
    #[error("unknown {kind} code '{code}'")]
    UnknownCode {
        /// Code list name, e.g. `ChargeBearerType1Code`.
        kind: &'static str,
        /// The rejected value.
        code: String,
    },
}
