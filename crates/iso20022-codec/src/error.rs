//! Faults raised inside the codec.
//!
//! The public `serialize`/`deserialize` entry points never return these;
//! they log them and yield `None`. The `try_*` entry points return them
//! for callers that want the reason.

use iso20022_core::{Encoding, MarkupError};
use thiserror::Error;

/// Why a codec operation produced no result.
#[derive(Error, Debug)]
pub enum CodecError {
    /// `serialize` was called with no value.
    #[error("nothing to serialize for {type_name}")]
    NothingToSerialize {
        /// Rust type the caller asked for.
        type_name: &'static str,
    },

    /// The input was empty or whitespace only. No parse was attempted.
    #[error("empty {encoding} input for {type_name}")]
    EmptyInput {
        /// Rust type the caller asked for.
        type_name: &'static str,
        /// Encoding the caller stated.
        encoding: Encoding,
    },

    /// Byte input is not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The markup text is not well-formed.
    #[error("markup is not well-formed: {0}")]
    Malformed(#[from] MarkupError),

    /// The document root does not match the requested type.
    #[error("document root '{found}' does not match {type_name} (expected '{expected}')")]
    RootMismatch {
        /// Rust type the caller asked for.
        type_name: &'static str,
        /// Root the type declares, `{namespace}local` when namespaced.
        expected: String,
        /// Root the document carries.
        found: String,
    },

    /// The markup back end rejected the value or the text.
    #[error("markup {direction} failed for {type_name}: {reason}")]
    Markup {
        /// Rust type the caller asked for.
        type_name: &'static str,
        /// `serialization` or `deserialization`.
        direction: &'static str,
        /// Diagnostic from `quick-xml`.
        reason: String,
    },

    /// The object-notation back end rejected the value or the text.
    #[error("object-notation {direction} failed for {type_name}: {error}")]
    ObjectNotation {
        /// Rust type the caller asked for.
        type_name: &'static str,
        /// `serialization` or `deserialization`.
        direction: &'static str,
        /// Diagnostic from `serde_json`.
        #[source]
        error: serde_json::Error,
    },
}

impl CodecError {
    /// True for faults caused by absent input rather than bad input.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::NothingToSerialize { .. } | Self::EmptyInput { .. })
    }
}
