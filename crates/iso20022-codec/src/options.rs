//! Encoding-specific codec options.
//!
//! Every struct here is plain data with a `Default` and `#[serde(default)]`,
//! so a configuration file may name only the fields it changes.

use serde::{Deserialize, Serialize};

/// Options for the markup (XML) encoding.
///
/// Output never carries an XML declaration and is never indented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupOptions {
    /// Prefix serialized text with a UTF-8 byte-order mark.
    pub byte_order_mark: bool,
    /// Declare `namespace` as the default namespace of the root element.
    /// When false, any default namespace declaration on the root is removed.
    pub include_namespace: bool,
    /// Namespace of the document root. On deserialize, a document whose
    /// root declares a different namespace is rejected; a root with no
    /// namespace is accepted.
    pub namespace: Option<String>,
}

impl MarkupOptions {
    /// Options that emit and expect `namespace`.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            include_namespace: true,
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }
}

/// Options for the object-notation (JSON) encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectNotationOptions {
    /// Drop members whose value is null when writing, and treat null
    /// members as absent when reading.
    pub omit_null: bool,
}

impl Default for ObjectNotationOptions {
    fn default() -> Self {
        Self { omit_null: true }
    }
}

/// Options for both encodings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    pub markup: MarkupOptions,
    pub object_notation: ObjectNotationOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_suppress_namespace_and_omit_nulls() {
        let options = CodecOptions::default();
        assert!(!options.markup.byte_order_mark);
        assert!(!options.markup.include_namespace);
        assert_eq!(options.markup.namespace, None);
        assert!(options.object_notation.omit_null);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let options: CodecOptions =
            serde_json::from_str(r#"{"markup": {"byte_order_mark": true}}"#).unwrap();
        assert!(options.markup.byte_order_mark);
        assert!(!options.markup.include_namespace);
        assert!(options.object_notation.omit_null);
    }

    #[test]
    fn with_namespace_turns_declaration_on() {
        let markup = MarkupOptions::with_namespace("urn:x");
        assert!(markup.include_namespace);
        assert_eq!(markup.namespace.as_deref(), Some("urn:x"));
    }
}
