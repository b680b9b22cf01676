//! # Document Wrapper
//!
//! [`DocumentWrapper`] owns exactly one root document of a
//! [`MessageDefinition`] and exposes the embedded message as a view derived
//! from it on every access.
//!
//! ## Lifecycle
//!
//! Construction runs the definition's root constructor and fails loudly
//! with a [`ConfigurationError`] if there is none or it yields nothing.
//! After that, nothing fails loudly: `serialize` and `deserialize` collapse
//! faults into `None`/`false` after logging, and assigning a root of the
//! wrong runtime type silently clears the root.
//!
//! A successful `deserialize` replaces the root wholesale. A failed one
//! leaves it untouched.
//!
//! ## Validation
//!
//! With a [`SchemaAggregator`] attached and validation switched on, markup
//! leaving or entering the wrapper must also pass the aggregator. The text
//! checked always carries the definition's namespace, so the aggregate can
//! find its schema even when the codec suppresses the namespace on output.

use std::marker::PhantomData;

use iso20022_codec::{qualify_markup, Codec, CodecError, CodecOptions};
use iso20022_core::{resolve_concrete_type, ConfigurationError, Encoding, OpaqueValue};
use iso20022_schema::SchemaAggregator;

use crate::definition::MessageDefinition;

/// One root document of `D`, with codec and optional schema validation.
pub struct DocumentWrapper<D: MessageDefinition> {
    root: Option<D::Root>,
    codec: Codec,
    schemas: Option<SchemaAggregator>,
    use_validation: bool,
    _definition: PhantomData<D>,
}

impl<D: MessageDefinition> std::fmt::Debug for DocumentWrapper<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWrapper")
            .field("message_id", &D::MESSAGE_ID)
            .field("has_root", &self.root.is_some())
            .field("use_validation", &self.use_validation)
            .finish_non_exhaustive()
    }
}

impl<D: MessageDefinition> DocumentWrapper<D> {
    /// Build a wrapper around a freshly constructed root, with codec
    /// options that expect `D::NAMESPACE` on input.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::NoConstructor` when `D` offers no constructor;
    /// `ConfigurationError::NoDocumentCreated` when it yields nothing.
    pub fn new() -> Result<Self, ConfigurationError> {
        Self::with_codec(Codec::new(Self::codec_options()))
    }

    /// As [`new`](Self::new), with a caller-supplied codec.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_codec(codec: Codec) -> Result<Self, ConfigurationError> {
        let type_name = std::any::type_name::<D::Root>();
        let construct = D::constructor().ok_or(ConfigurationError::NoConstructor { type_name })?;
        let root = construct().ok_or(ConfigurationError::NoDocumentCreated { type_name })?;
        tracing::debug!(message_id = D::MESSAGE_ID, root = type_name, "document wrapper constructed");
        Ok(Self {
            root: Some(root),
            codec,
            schemas: None,
            use_validation: false,
            _definition: PhantomData,
        })
    }

    /// Codec options for `D`: namespace expected on input, suppressed on
    /// output.
    pub fn codec_options() -> CodecOptions {
        let mut options = CodecOptions::default();
        options.markup.namespace = Some(D::NAMESPACE.to_string());
        options
    }

    pub fn message_id(&self) -> &'static str {
        D::MESSAGE_ID
    }

    pub fn namespace(&self) -> &'static str {
        D::NAMESPACE
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn codec_mut(&mut self) -> &mut Codec {
        &mut self.codec
    }

    /// Current root, absent after a rejected assignment.
    pub fn root(&self) -> Option<&D::Root> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut D::Root> {
        self.root.as_mut()
    }

    pub fn set_root(&mut self, root: D::Root) {
        self.root = Some(root);
    }

    /// Assign a root held in a type-erased slot.
    ///
    /// A value whose runtime type is exactly `D::Root` becomes the root.
    /// Anything else clears the root. Returns whether the value was taken.
    pub fn assign_root(&mut self, value: OpaqueValue) -> bool {
        let found = resolve_concrete_type(Some(&value));
        match value.downcast::<D::Root>() {
            Ok(root) => {
                self.root = Some(root);
                true
            }
            Err(_) => {
                tracing::debug!(
                    message_id = D::MESSAGE_ID,
                    found = found.map(|t| t.name()).unwrap_or("none"),
                    "root of another type rejected"
                );
                self.root = None;
                false
            }
        }
    }

    pub fn take_root(&mut self) -> Option<D::Root> {
        self.root.take()
    }

    pub fn into_root(self) -> Option<D::Root> {
        self.root
    }

    /// The embedded message, derived from the current root.
    pub fn message(&self) -> Option<&D::Message> {
        self.root.as_ref().and_then(D::message)
    }

    /// Attach a schema aggregate and switch validation on.
    pub fn attach_schemas(&mut self, schemas: SchemaAggregator) {
        self.schemas = Some(schemas);
        self.use_validation = true;
    }

    pub fn schemas(&self) -> Option<&SchemaAggregator> {
        self.schemas.as_ref()
    }

    pub fn schemas_mut(&mut self) -> Option<&mut SchemaAggregator> {
        self.schemas.as_mut()
    }

    /// Switch validation of markup on or off. Has no effect until schemas
    /// are attached.
    pub fn set_use_validation(&mut self, on: bool) {
        self.use_validation = on;
    }

    /// True if markup passes through the attached schemas.
    pub fn uses_validation(&self) -> bool {
        self.use_validation && self.schemas.is_some()
    }

    /// Encode the root. `None` when there is no root, the codec fails, or
    /// validation rejects the markup.
    pub fn serialize(&mut self, encoding: Encoding) -> Option<String> {
        let text = self.codec.serialize(self.root.as_ref(), encoding)?;
        if encoding == Encoding::Markup && !self.passes_validation(&text) {
            return None;
        }
        Some(text)
    }

    /// Decode `text` and replace the root with the result.
    ///
    /// Returns `true` if the root was replaced. On `false` the root is
    /// unchanged.
    pub fn deserialize(&mut self, text: &str, encoding: Encoding) -> bool {
        match self.try_deserialize(text, encoding) {
            Ok(()) => true,
            Err(error) => {
                if error.is_input_error() {
                    tracing::warn!(message_id = D::MESSAGE_ID, %encoding, %error, "document not replaced");
                } else {
                    tracing::error!(message_id = D::MESSAGE_ID, %encoding, %error, "document not replaced");
                }
                false
            }
        }
    }

    /// Decode UTF-8 bytes and replace the root with the result.
    pub fn deserialize_bytes(&mut self, bytes: &[u8], encoding: Encoding) -> bool {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.deserialize(text, encoding),
            Err(error) => {
                tracing::error!(message_id = D::MESSAGE_ID, %encoding, %error, "document not replaced");
                false
            }
        }
    }

    /// Decode `text` and replace the root, or say why not.
    ///
    /// # Errors
    ///
    /// The codec's fault. Markup rejected by validation is reported as
    /// `CodecError::Markup`; the validation events are in the attached
    /// aggregator.
    pub fn try_deserialize(&mut self, text: &str, encoding: Encoding) -> Result<(), CodecError> {
        let root = self.codec.try_deserialize::<D::Root>(text, encoding)?;
        if encoding == Encoding::Markup && !self.passes_validation(text) {
            return Err(CodecError::Markup {
                type_name: std::any::type_name::<D::Root>(),
                direction: "deserialization",
                reason: "document rejected by schema validation".to_string(),
            });
        }
        self.root = Some(root);
        Ok(())
    }

    fn passes_validation(&mut self, text: &str) -> bool {
        if !self.use_validation {
            return true;
        }
        let Some(schemas) = self.schemas.as_mut() else {
            return true;
        };
        match qualify_markup(text, D::NAMESPACE) {
            Ok(qualified) => schemas.validate(&qualified).is_some(),
            Err(error) => {
                tracing::error!(message_id = D::MESSAGE_ID, %error, "markup could not be prepared for validation");
                false
            }
        }
    }
}
