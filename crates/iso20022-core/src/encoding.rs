//! # Wire Encodings
//!
//! A document travels in exactly one of two encodings at any time. Encoded
//! text never describes itself: the caller always states which encoding a
//! blob is in, or is to be produced in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownEncoding;

/// The two wire encodings of an ISO 20022 document.
///
/// `ObjectNotation` is the default, matching the compact key/value form most
/// counterparties exchange. `Markup` is the tag-based form that schema
/// definitions validate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// Tag-based, schema-validatable encoding (XML).
    Markup,
    /// Compact, schema-less key/value encoding (JSON).
    #[default]
    ObjectNotation,
}

impl Encoding {
    /// Both encodings, markup first.
    pub fn all() -> &'static [Encoding] {
        &[Encoding::Markup, Encoding::ObjectNotation]
    }

    /// Returns the kebab-case identifier, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::ObjectNotation => "object-notation",
        }
    }

    /// IANA media type of the encoding.
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Markup => "application/xml",
            Self::ObjectNotation => "application/json",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Markup => "xml",
            Self::ObjectNotation => "json",
        }
    }

    /// Map a file extension to an encoding.
    ///
    /// This is a caller-side convenience for tools that name files by
    /// encoding; the codec itself never guesses.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "xml" => Some(Self::Markup),
            "json" => Some(Self::ObjectNotation),
            _ => None,
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    /// Accepts the kebab-case identifiers and the short `xml` / `json` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markup" | "xml" => Ok(Self::Markup),
            "object-notation" | "json" => Ok(Self::ObjectNotation),
            other => Err(UnknownEncoding(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_object_notation() {
        assert_eq!(Encoding::default(), Encoding::ObjectNotation);
    }

    #[test]
    fn as_str_roundtrip() {
        for encoding in Encoding::all() {
            let parsed: Encoding = encoding.as_str().parse().unwrap();
            assert_eq!(*encoding, parsed);
        }
    }

    #[test]
    fn short_aliases() {
        assert_eq!("xml".parse::<Encoding>().unwrap(), Encoding::Markup);
        assert_eq!("json".parse::<Encoding>().unwrap(), Encoding::ObjectNotation);
    }

    #[test]
    fn from_str_invalid() {
        let err = "yaml".parse::<Encoding>().unwrap_err();
        assert_eq!(err, UnknownEncoding("yaml".to_string()));
        assert!("XML".parse::<Encoding>().is_err());
    }

    #[test]
    fn serde_format_matches_as_str() {
        for encoding in Encoding::all() {
            let json = serde_json::to_string(encoding).unwrap();
            assert_eq!(json, format!("\"{}\"", encoding.as_str()));
        }
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(Encoding::from_extension("XML"), Some(Encoding::Markup));
        assert_eq!(Encoding::from_extension("json"), Some(Encoding::ObjectNotation));
        assert_eq!(Encoding::from_extension("xsd"), None);
        for encoding in Encoding::all() {
            assert_eq!(Encoding::from_extension(encoding.file_extension()), Some(*encoding));
        }
    }
}
