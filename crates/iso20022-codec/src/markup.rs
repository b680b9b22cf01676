//! Markup (XML) back end.
//!
//! Serialization runs `quick-xml`'s serde serializer, then reparses its
//! output into the core element tree so the root's default namespace can
//! be set or removed before the canonical text is written. No declaration
//! is emitted and nothing is indented.
//!
//! Deserialization parses into the element tree first, which drops
//! comments, processing instructions and insignificant whitespace, checks
//! the root against the target type, and then hands prefix-free canonical
//! text to `quick-xml`'s deserializer.

use iso20022_core::{parse_document, XmlAttribute, XmlElement, XmlNode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::options::MarkupOptions;
use crate::probe::container_name;

const BYTE_ORDER_MARK: char = '\u{feff}';

pub(crate) fn to_text<T: Serialize>(value: &T, options: &MarkupOptions) -> Result<String, CodecError> {
    let type_name = std::any::type_name::<T>();
    let raw = quick_xml::se::to_string(value)
        .or_else(|_| quick_xml::se::to_string_with_root(builtin_root_name(type_name), value))
        .map_err(|e| CodecError::Markup {
            type_name,
            direction: "serialization",
            reason: e.to_string(),
        })?;
    let mut root = parse_document(&raw)?;
    set_default_namespace(&mut root, options);

    let mut out = String::with_capacity(raw.len() + 64);
    if options.byte_order_mark {
        out.push(BYTE_ORDER_MARK);
    }
    out.push_str(&root.to_xml_string());
    Ok(out)
}

/// Root element for a value with no container name of its own: the XSD
/// builtin name for primitives, the bare type name otherwise. Top-level
/// sequences still fail, as they would need one root per item.
fn builtin_root_name(type_name: &str) -> &str {
    match type_name {
        "bool" => "boolean",
        "i8" => "byte",
        "i16" => "short",
        "i32" => "int",
        "i64" => "long",
        "u8" => "unsignedByte",
        "u16" => "unsignedShort",
        "u32" => "unsignedInt",
        "u64" => "unsignedLong",
        "f32" => "float",
        "f64" => "double",
        "&str" | "str" | "alloc::string::String" => "string",
        other => {
            let path = other.split('<').next().unwrap_or(other);
            path.rsplit("::").next().unwrap_or(path)
        }
    }
}

pub(crate) fn from_text<T: DeserializeOwned>(text: &str, options: &MarkupOptions) -> Result<T, CodecError> {
    let mut root = parse_document(text)?;
    check_root::<T>(&root, options)?;
    strip_namespaces(&mut root);
    quick_xml::de::from_str(&root.to_xml_string()).map_err(|e| CodecError::Markup {
        type_name: std::any::type_name::<T>(),
        direction: "deserialization",
        reason: e.to_string(),
    })
}

/// Canonicalize markup and give an unqualified root `namespace` as its
/// default namespace. A root that already has a namespace keeps it.
///
/// # Errors
///
/// `CodecError::Malformed` when the text does not parse.
pub fn qualify_markup(text: &str, namespace: &str) -> Result<String, CodecError> {
    let mut root = parse_document(text)?;
    if root.namespace.is_none() && !root.attributes.iter().any(|a| a.name == "xmlns") {
        root.attributes.insert(0, XmlAttribute::new("xmlns", namespace));
    }
    Ok(root.to_xml_string())
}

fn set_default_namespace(root: &mut XmlElement, options: &MarkupOptions) {
    root.attributes.retain(|a| a.name != "xmlns");
    if !options.include_namespace {
        return;
    }
    if let Some(namespace) = options.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        root.attributes.insert(0, XmlAttribute::new("xmlns", namespace));
    }
}

fn check_root<T: DeserializeOwned>(root: &XmlElement, options: &MarkupOptions) -> Result<(), CodecError> {
    let expected = container_name::<T>();
    let name_matches = expected.map_or(true, |name| name == root.local_name);
    let namespace_matches = match (options.namespace.as_deref(), root.namespace.as_deref()) {
        (Some(wanted), Some(found)) => wanted == found,
        _ => true,
    };
    if name_matches && namespace_matches {
        return Ok(());
    }
    Err(CodecError::RootMismatch {
        type_name: std::any::type_name::<T>(),
        expected: expanded_name(
            options.namespace.as_deref(),
            expected.unwrap_or(root.local_name.as_str()),
        ),
        found: expanded_name(root.namespace.as_deref(), &root.local_name),
    })
}

fn expanded_name(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(ns) => format!("{{{ns}}}{local}"),
        None => local.to_string(),
    }
}

/// Rename every element and attribute to its local name and drop namespace
/// declarations. The root check has already run, and the deserializer
/// matches on names only.
fn strip_namespaces(element: &mut XmlElement) {
    element.name = element.local_name.clone();
    element.attributes.retain(|a| !a.is_namespace_declaration());
    for attribute in &mut element.attributes {
        attribute.name = attribute.local_name.clone();
    }
    for child in &mut element.children {
        if let XmlNode::Element(child) = child {
            strip_namespaces(child);
        }
    }
}
