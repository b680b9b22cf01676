//! Recovers the container name a type declares to serde.
//!
//! `quick-xml` ignores the root element name when deserializing, so a
//! `<Report>` would happily fill a `Document` with the same fields. The
//! markup back end asks the target type for its serde name up front and
//! compares it with the document root instead.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};

/// Serde name of `T` if it deserializes as a struct, unit struct or
/// newtype struct; `None` for maps, sequences and primitives.
pub fn container_name<'de, T: Deserialize<'de>>() -> Option<&'static str> {
    match T::deserialize(Probe) {
        Err(Found::Container(name)) => Some(name),
        Err(Found::Other) | Ok(_) => None,
    }
}

struct Probe;

#[derive(Debug)]
enum Found {
    Container(&'static str),
    Other,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(name) => write!(f, "container {name}"),
            Self::Other => f.write_str("not a named container"),
        }
    }
}

impl std::error::Error for Found {}

impl de::Error for Found {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self::Other
    }
}

impl<'de> Deserializer<'de> for Probe {
    type Error = Found;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Found> {
        Err(Found::Other)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Found> {
        Err(Found::Container(name))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Found> {
        Err(Found::Container(name))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Found> {
        Err(Found::Container(name))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit seq tuple tuple_struct map enum identifier
        ignored_any
    }
}
