//! # Message Registry
//!
//! Decoding when the message type is not known up front. Each registered
//! [`MessageKind`] carries a monomorphized decode function; [`MessageRegistry::decode`]
//! tries them in registration order and hands back the first success as a
//! type-erased [`OpaqueValue`] tagged with its message identifier.
//!
//! Markup input is checked against each kind's namespace, so a qualified
//! document can only match its own binding. Unqualified markup and object
//! notation are told apart by content alone: the first kind whose root
//! accepts the text wins.

use iso20022_codec::{Codec, CodecError, CodecOptions};
use iso20022_core::{resolve_concrete_type, Encoding, OpaqueValue, TypeToken};

use crate::definition::MessageDefinition;
use crate::{pacs002, pacs008};

type DecodeFn = fn(&Codec, &str, Encoding) -> Result<OpaqueValue, CodecError>;
type EncodeFn = fn(&Codec, &OpaqueValue, Encoding) -> Result<String, CodecError>;

/// One registered message binding.
#[derive(Clone, Copy)]
pub struct MessageKind {
    pub message_id: &'static str,
    pub namespace: &'static str,
    /// Runtime type of the root values this kind decodes to.
    pub root_type: TypeToken,
    decode: DecodeFn,
    encode: EncodeFn,
}

impl MessageKind {
    pub fn of<D: MessageDefinition>() -> Self {
        Self {
            message_id: D::MESSAGE_ID,
            namespace: D::NAMESPACE,
            root_type: TypeToken::of::<D::Root>(),
            decode: decode_as::<D>,
            encode: encode_as::<D>,
        }
    }

    fn codec(&self, base: &CodecOptions) -> Codec {
        let mut options = base.clone();
        options.markup.namespace = Some(self.namespace.to_string());
        Codec::new(options)
    }

    /// Decode `text` as this kind, expecting its namespace on markup input.
    ///
    /// # Errors
    ///
    /// The codec's fault when the text is not a document of this kind.
    pub fn decode(&self, base: &CodecOptions, text: &str, encoding: Encoding) -> Result<OpaqueValue, CodecError> {
        (self.decode)(&self.codec(base), text, encoding)
    }

    /// Encode a root of this kind held type-erased. Markup carries the
    /// kind's namespace when `base` asks for one.
    ///
    /// # Errors
    ///
    /// `CodecError::NothingToSerialize` when `value` is not this kind's
    /// root; otherwise the codec's fault.
    pub fn encode(&self, base: &CodecOptions, value: &OpaqueValue, encoding: Encoding) -> Result<String, CodecError> {
        (self.encode)(&self.codec(base), value, encoding)
    }

    /// True if `value` holds a root of this kind.
    pub fn matches(&self, value: &OpaqueValue) -> bool {
        resolve_concrete_type(Some(value)) == Some(self.root_type)
    }
}

impl std::fmt::Debug for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageKind")
            .field("message_id", &self.message_id)
            .field("namespace", &self.namespace)
            .field("root_type", &self.root_type)
            .finish()
    }
}

fn decode_as<D: MessageDefinition>(codec: &Codec, text: &str, encoding: Encoding) -> Result<OpaqueValue, CodecError> {
    codec.try_deserialize::<D::Root>(text, encoding).map(OpaqueValue::new)
}

fn encode_as<D: MessageDefinition>(codec: &Codec, value: &OpaqueValue, encoding: Encoding) -> Result<String, CodecError> {
    codec.try_serialize(value.downcast_ref::<D::Root>(), encoding)
}

/// A successfully decoded document of a registered kind.
#[derive(Debug)]
pub struct DecodedMessage {
    pub message_id: &'static str,
    pub value: OpaqueValue,
}

/// Ordered set of message kinds to try when decoding unknown input.
#[derive(Debug, Default)]
pub struct MessageRegistry {
    kinds: Vec<MessageKind>,
    options: CodecOptions,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry decoding with `options`; the markup namespace is
    /// overridden per kind.
    pub fn with_options(options: CodecOptions) -> Self {
        Self {
            kinds: Vec::new(),
            options,
        }
    }

    /// Registry with the bundled pacs.008 and pacs.002 bindings.
    pub fn bundled() -> Self {
        let mut registry = Self::new();
        registry.register::<pacs008::Pacs008>();
        registry.register::<pacs002::Pacs002>();
        registry
    }

    /// Add `D`. Registering a message identifier twice keeps the first.
    pub fn register<D: MessageDefinition>(&mut self) -> &mut Self {
        if self.find(D::MESSAGE_ID).is_some() {
            tracing::debug!(message_id = D::MESSAGE_ID, "message kind already registered");
        } else {
            self.kinds.push(MessageKind::of::<D>());
        }
        self
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Replace the codec options used for every kind.
    pub fn set_options(&mut self, options: CodecOptions) {
        self.options = options;
    }

    pub fn kinds(&self) -> &[MessageKind] {
        &self.kinds
    }

    pub fn find(&self, message_id: &str) -> Option<&MessageKind> {
        self.kinds.iter().find(|k| k.message_id == message_id)
    }

    /// Kind bound to a markup namespace.
    pub fn find_by_namespace(&self, namespace: &str) -> Option<&MessageKind> {
        self.kinds.iter().find(|k| k.namespace == namespace)
    }

    /// Kind whose root type `value` holds.
    pub fn kind_of(&self, value: &OpaqueValue) -> Option<&MessageKind> {
        self.kinds.iter().find(|k| k.matches(value))
    }

    /// Encode a decoded value with the registry's options.
    ///
    /// `None` when the value's kind is not registered or encoding fails,
    /// after logging.
    pub fn encode(&self, value: &OpaqueValue, encoding: Encoding) -> Option<String> {
        let Some(kind) = self.kind_of(value) else {
            tracing::warn!(found = %value.declared_type(), "value is not a registered message root");
            return None;
        };
        match kind.encode(&self.options, value, encoding) {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::error!(message_id = kind.message_id, %encoding, %error, "encoding failed");
                None
            }
        }
    }

    /// Decode `text` as the first registered kind that accepts it.
    ///
    /// `None` when no kind does; each rejection is logged at debug level.
    pub fn decode(&self, text: &str, encoding: Encoding) -> Option<DecodedMessage> {
        for kind in &self.kinds {
            match kind.decode(&self.options, text, encoding) {
                Ok(value) => {
                    tracing::debug!(message_id = kind.message_id, %encoding, "decoded");
                    return Some(DecodedMessage {
                        message_id: kind.message_id,
                        value,
                    });
                }
                Err(error) => {
                    tracing::debug!(message_id = kind.message_id, %encoding, %error, "not this kind");
                }
            }
        }
        tracing::warn!(%encoding, kinds = self.kinds.len(), "input matched no registered message kind");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_registry_lists_both_bindings() {
        let registry = MessageRegistry::bundled();
        let ids: Vec<_> = registry.kinds().iter().map(|k| k.message_id).collect();
        assert_eq!(ids, ["pacs.008.001.10", "pacs.002.001.12"]);
        assert!(registry.find("pacs.002.001.12").unwrap().root_type.is::<pacs002::Document>());
        assert_eq!(
            registry.find_by_namespace(pacs008::NAMESPACE).map(|k| k.message_id),
            Some(pacs008::MESSAGE_ID)
        );
        assert!(registry.find("camt.053.001.08").is_none());
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut registry = MessageRegistry::bundled();
        registry.register::<pacs008::Pacs008>();
        assert_eq!(registry.kinds().len(), 2);
    }

    #[test]
    fn decodes_object_notation_by_content() {
        let registry = MessageRegistry::bundled();
        let json = r#"{"FIToFIPmtStsRpt":{"GrpHdr":{"MsgId":"STS-1","CreDtTm":"2026-03-14T10:00:00"}}}"#;
        let decoded = registry.decode(json, Encoding::ObjectNotation).unwrap();
        assert_eq!(decoded.message_id, pacs002::MESSAGE_ID);
        let doc = decoded.value.downcast_ref::<pacs002::Document>().unwrap();
        assert_eq!(doc.status_report.group_header.message_id, "STS-1");
    }

    #[test]
    fn qualified_markup_matches_only_its_namespace() {
        let registry = MessageRegistry::bundled();
        let foreign = r#"<Document xmlns="urn:iso:std:iso:20022:tech:xsd:camt.053.001.08"><FIToFIPmtStsRpt><GrpHdr><MsgId>STS-1</MsgId></GrpHdr></FIToFIPmtStsRpt></Document>"#;
        assert!(registry.decode(foreign, Encoding::Markup).is_none());

        let own = foreign.replace("camt.053.001.08", "pacs.002.001.12");
        assert_eq!(registry.decode(&own, Encoding::Markup).map(|d| d.message_id), Some(pacs002::MESSAGE_ID));
    }

    #[test]
    fn decoded_values_encode_back() {
        let registry = MessageRegistry::bundled();
        let json = r#"{"FIToFIPmtStsRpt":{"GrpHdr":{"MsgId":"STS-1","CreDtTm":"2026-03-14T10:00:00"}}}"#;
        let decoded = registry.decode(json, Encoding::ObjectNotation).unwrap();
        assert_eq!(registry.kind_of(&decoded.value).map(|k| k.message_id), Some(pacs002::MESSAGE_ID));
        assert_eq!(
            registry.encode(&decoded.value, Encoding::Markup).as_deref(),
            Some("<Document><FIToFIPmtStsRpt><GrpHdr><MsgId>STS-1</MsgId><CreDtTm>2026-03-14T10:00:00</CreDtTm></GrpHdr></FIToFIPmtStsRpt></Document>")
        );

        let pacs008 = registry.find(pacs008::MESSAGE_ID).unwrap();
        let err = pacs008
            .encode(registry.options(), &decoded.value, Encoding::Markup)
            .unwrap_err();
        assert!(matches!(err, CodecError::NothingToSerialize { .. }));
        assert_eq!(registry.encode(&OpaqueValue::new(7u8), Encoding::ObjectNotation), None);
    }

    #[test]
    fn empty_registry_decodes_nothing() {
        assert!(MessageRegistry::new().decode("{}", Encoding::ObjectNotation).is_none());
    }
}
