//! The generic serialize/deserialize entry points.

use iso20022_core::Encoding;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::options::CodecOptions;
use crate::{markup, object_notation};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serializes and deserializes any serde type in either encoding.
///
/// `serialize` and `deserialize` never fail loudly: every fault is logged
/// through `tracing` and surfaces as `None`. Input faults (nothing to
/// serialize, empty text) log at `warn`; format faults log at `error`.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    options: CodecOptions,
}

impl Codec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut CodecOptions {
        &mut self.options
    }

    /// Encode `value`, or explain why nothing was produced.
    ///
    /// # Errors
    ///
    /// `CodecError::NothingToSerialize` when `value` is `None`; otherwise
    /// the back end's fault.
    pub fn try_serialize<T: Serialize>(&self, value: Option<&T>, encoding: Encoding) -> Result<String, CodecError> {
        let value = value.ok_or(CodecError::NothingToSerialize {
            type_name: std::any::type_name::<T>(),
        })?;
        match encoding {
            Encoding::Markup => markup::to_text(value, &self.options.markup),
            Encoding::ObjectNotation => object_notation::to_text(value, &self.options.object_notation),
        }
    }

    /// Encode `value`. `None` in means `None` out, after a warning.
    pub fn serialize<T: Serialize>(&self, value: Option<&T>, encoding: Encoding) -> Option<String> {
        self.try_serialize(value, encoding)
            .map_err(|error| report(&error, encoding, "serialize"))
            .ok()
    }

    /// Decode `text` as a `T`.
    ///
    /// Empty or whitespace-only input short-circuits without a parse. A
    /// leading byte-order mark is ignored.
    ///
    /// # Errors
    ///
    /// `CodecError::EmptyInput` for blank text; otherwise the back end's
    /// fault, including a root that does not match `T`.
    pub fn try_deserialize<T: DeserializeOwned>(&self, text: &str, encoding: Encoding) -> Result<T, CodecError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        if text.trim().is_empty() {
            return Err(CodecError::EmptyInput {
                type_name: std::any::type_name::<T>(),
                encoding,
            });
        }
        match encoding {
            Encoding::Markup => markup::from_text(text, &self.options.markup),
            Encoding::ObjectNotation => object_notation::from_text(text, &self.options.object_notation),
        }
    }

    /// Decode `text` as a `T`, or `None` if it does not decode.
    ///
    /// Safe for speculative use: asking for the wrong type yields `None`.
    pub fn deserialize<T: DeserializeOwned>(&self, text: &str, encoding: Encoding) -> Option<T> {
        self.try_deserialize(text, encoding)
            .map_err(|error| report(&error, encoding, "deserialize"))
            .ok()
    }

    /// Decode `text`, falling back to `T::default()`.
    pub fn deserialize_or_default<T: DeserializeOwned + Default>(&self, text: &str, encoding: Encoding) -> T {
        self.deserialize(text, encoding).unwrap_or_default()
    }

    /// Decode UTF-8 bytes. A UTF-8 byte-order mark is ignored.
    ///
    /// # Errors
    ///
    /// `CodecError::InvalidUtf8` for bytes that are not UTF-8; otherwise as
    /// [`try_deserialize`](Self::try_deserialize).
    pub fn try_deserialize_bytes<T: DeserializeOwned>(&self, bytes: &[u8], encoding: Encoding) -> Result<T, CodecError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)?;
        self.try_deserialize(text, encoding)
    }

    /// Decode UTF-8 bytes, or `None` if they do not decode.
    pub fn deserialize_bytes<T: DeserializeOwned>(&self, bytes: &[u8], encoding: Encoding) -> Option<T> {
        self.try_deserialize_bytes(bytes, encoding)
            .map_err(|error| report(&error, encoding, "deserialize"))
            .ok()
    }
}

fn report(error: &CodecError, encoding: Encoding, operation: &'static str) {
    if error.is_input_error() {
        tracing::warn!(%encoding, operation, %error, "codec produced no result");
    } else {
        tracing::error!(%encoding, operation, %error, "codec produced no result");
    }
}
