//! # Markup Tree
//!
//! An owned element tree built from `quick-xml` reader events. Both the
//! codec (namespace rewriting, canonical output) and the schema engine
//! (definition parsing, instance validation) work on this tree.
//!
//! ## Parsing Rules
//!
//! - Comments, processing instructions, the declaration and any doctype
//!   are dropped.
//! - Whitespace-only text between elements is insignificant and dropped.
//!   Text with content is kept verbatim, entities unescaped.
//! - A leading byte-order mark is ignored.
//! - Namespace prefixes are resolved while parsing; every element and
//!   attribute records its namespace URI next to the name as written.
//! - Elements nest at most [`MAX_DEPTH`] levels deep. Deeper input is
//!   rejected as malformed, which bounds the recursion of every tree walk.
//!
//! ## Output
//!
//! [`XmlElement::to_xml_string`] writes compact markup with no declaration
//! and no indentation. Parsing that output yields an equal tree.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::MarkupError;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// Namespace of `xmlns` declarations.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
/// Namespace of schema-instance attributes (`xsi:type`, `xsi:schemaLocation`).
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Deepest element nesting `parse_document` accepts.
pub const MAX_DEPTH: usize = 512;

/// In-scope prefix bindings. The default namespace is stored under `""`.
pub type NamespaceScope = Arc<BTreeMap<String, String>>;

/// One-based line and column in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column in characters, starting at 1.
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, position {}", self.line, self.column)
    }
}

/// An attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Qualified name as written (`Ccy`, `xsi:type`, `xmlns:ds`).
    pub name: String,
    /// Namespace URI. Unprefixed attributes have none.
    pub namespace: Option<String>,
    /// Name without prefix.
    pub local_name: String,
    /// Unescaped value.
    pub value: String,
}

impl XmlAttribute {
    /// Build an unprefixed attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            local_name: name.clone(),
            name,
            namespace: None,
            value: value.into(),
        }
    }

    /// True for `xmlns` and `xmlns:*` declarations.
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// A child of an element.
#[derive(Debug, Clone)]
pub enum XmlNode {
    /// Nested element.
    Element(XmlElement),
    /// Character data, entities already unescaped.
    Text(String),
}

/// An element with its attributes, children, and namespace context.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// Qualified name as written.
    pub name: String,
    /// Resolved namespace URI, if any.
    pub namespace: Option<String>,
    /// Name without prefix.
    pub local_name: String,
    /// Attributes in document order, namespace declarations included.
    pub attributes: Vec<XmlAttribute>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
    /// Prefix bindings in scope at this element.
    pub scope: NamespaceScope,
    /// Position of the start tag in the source text.
    pub location: SourceLocation,
}

impl XmlElement {
    /// Create an empty element with no namespace.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let (_, local) = split_qname(&name);
        Self {
            local_name: local.to_string(),
            name,
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
            scope: root_scope(),
            location: SourceLocation::default(),
        }
    }

    /// Prefix of the element name, if written with one.
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// Value of an unprefixed attribute.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Value of a namespaced attribute.
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute by qualified name, replacing an existing one.
    pub fn set_attribute(&mut self, attribute: XmlAttribute) {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct text content, concatenated.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// True if any direct text child holds non-whitespace characters.
    pub fn has_text(&self) -> bool {
        self.children
            .iter()
            .any(|c| matches!(c, XmlNode::Text(t) if !t.trim().is_empty()))
    }

    /// Append a text child.
    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Resolve a QName-valued string (`xs:string`, `Document`) against the
    /// prefix bindings in scope at this element.
    ///
    /// Unprefixed names take the default namespace.
    pub fn resolve_qname(&self, qname: &str) -> Result<(Option<String>, String), MarkupError> {
        let (prefix, local) = split_qname(qname.trim());
        let namespace = match prefix {
            Some(p) => Some(self.scope.get(p).cloned().ok_or_else(|| {
                MarkupError::UnboundPrefix {
                    prefix: p.to_string(),
                    location: self.location,
                }
            })?),
            None => self.scope.get("").cloned(),
        };
        Ok((namespace, local.to_string()))
    }

    /// Compact markup: no declaration, no indentation.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

/// Split `prefix:local` into its parts.
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

fn root_scope() -> NamespaceScope {
    let mut bindings = BTreeMap::new();
    bindings.insert("xml".to_string(), XML_NAMESPACE.to_string());
    Arc::new(bindings)
}

fn write_element(element: &XmlElement, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for attribute in &element.attributes {
        out.push(' ');
        out.push_str(&attribute.name);
        out.push_str("=\"");
        out.push_str(&quick_xml::escape::escape(attribute.value.as_str()));
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(e, out),
            XmlNode::Text(t) => out.push_str(&quick_xml::escape::escape(t.as_str())),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Byte offset to line/column mapping over the source text.
struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    /// Locate the first non-whitespace character at or after `offset`.
    fn locate(&self, offset: usize) -> SourceLocation {
        let mut offset = offset.min(self.text.len());
        while let Some(c) = self.text.get(offset..).and_then(|s| s.chars().next()) {
            if !c.is_whitespace() {
                break;
            }
            offset += c.len_utf8();
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .text
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0);
        SourceLocation {
            line: line + 1,
            column: column + 1,
        }
    }
}

/// Parse markup text into its root element.
///
/// # Errors
///
/// Returns `MarkupError::Empty` when the text holds no element,
/// `MarkupError::Malformed` when it is not well-formed (unbalanced tags,
/// several roots, text outside the root, bad entities), and
/// `MarkupError::UnboundPrefix` when a prefix has no declaration in scope.
pub fn parse_document(text: &str) -> Result<XmlElement, MarkupError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines = LineIndex::new(text);
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let offset = usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX);
        let location = lines.locate(offset);
        let malformed = |reason: String| MarkupError::Malformed { location, reason };

        let event = reader.read_event().map_err(|e| malformed(e.to_string()))?;
        match event {
            Event::Start(start) => {
                check_depth(stack.len(), location)?;
                let parent = stack.last().map(|e| Arc::clone(&e.scope)).unwrap_or_else(root_scope);
                stack.push(open_element(&start, &parent, location)?);
            }
            Event::Empty(start) => {
                check_depth(stack.len(), location)?;
                let parent = stack.last().map(|e| Arc::clone(&e.scope)).unwrap_or_else(root_scope);
                let element = open_element(&start, &parent, location)?;
                attach(&mut stack, &mut root, element, location)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("end tag without start tag".to_string()))?;
                attach(&mut stack, &mut root, element, location)?;
            }
            Event::Text(chars) => {
                let chars = chars.unescape().map_err(|e| malformed(e.to_string()))?;
                push_text(&mut stack, &chars, location)?;
            }
            Event::CData(data) => {
                let chars = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| malformed(e.to_string()))?;
                push_text(&mut stack, &chars, location)?;
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(MarkupError::Malformed {
            location: open.location,
            reason: format!("element '{}' is never closed", open.name),
        });
    }
    root.ok_or(MarkupError::Empty)
}

fn check_depth(open: usize, location: SourceLocation) -> Result<(), MarkupError> {
    if open < MAX_DEPTH {
        return Ok(());
    }
    Err(MarkupError::Malformed {
        location,
        reason: format!("element nesting exceeds {MAX_DEPTH} levels"),
    })
}

fn open_element(
    start: &BytesStart<'_>,
    parent: &NamespaceScope,
    location: SourceLocation,
) -> Result<XmlElement, MarkupError> {
    let malformed = |reason: String| MarkupError::Malformed { location, reason };
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| malformed(e.to_string()))?
        .to_string();

    let mut raw = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(e.to_string()))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| malformed(e.to_string()))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| malformed(e.to_string()))?
            .into_owned();
        raw.push((key, value));
    }

    let declarations: Vec<(&str, &str)> = raw
        .iter()
        .filter_map(|(key, value)| {
            if key == "xmlns" {
                Some(("", value.as_str()))
            } else {
                key.strip_prefix("xmlns:").map(|p| (p, value.as_str()))
            }
        })
        .collect();
    let scope = if declarations.is_empty() {
        Arc::clone(parent)
    } else {
        let mut bindings = (**parent).clone();
        for (prefix, uri) in declarations {
            if uri.is_empty() {
                bindings.remove(prefix);
            } else {
                bindings.insert(prefix.to_string(), uri.to_string());
            }
        }
        Arc::new(bindings)
    };

    let (prefix, local) = split_qname(&name);
    let namespace = match prefix {
        Some(p) => Some(scope.get(p).cloned().ok_or_else(|| MarkupError::UnboundPrefix {
            prefix: p.to_string(),
            location,
        })?),
        None => scope.get("").cloned(),
    };

    let mut attributes = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let (attr_prefix, attr_local) = split_qname(&key);
        let attr_namespace = if key == "xmlns" || attr_prefix == Some("xmlns") {
            Some(XMLNS_NAMESPACE.to_string())
        } else {
            match attr_prefix {
                Some(p) => Some(scope.get(p).cloned().ok_or_else(|| {
                    MarkupError::UnboundPrefix {
                        prefix: p.to_string(),
                        location,
                    }
                })?),
                None => None,
            }
        };
        attributes.push(XmlAttribute {
            local_name: attr_local.to_string(),
            namespace: attr_namespace,
            name: key,
            value,
        });
    }

    Ok(XmlElement {
        local_name: local.to_string(),
        namespace,
        name,
        attributes,
        children: Vec::new(),
        scope,
        location,
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    location: SourceLocation,
) -> Result<(), MarkupError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(MarkupError::Malformed {
            location,
            reason: format!("second root element '{}'", element.name),
        });
    }
    *root = Some(element);
    Ok(())
}

fn push_text(
    stack: &mut [XmlElement],
    text: &str,
    location: SourceLocation,
) -> Result<(), MarkupError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(element) => {
            element.push_text(text);
            Ok(())
        }
        None => Err(MarkupError::Malformed {
            location,
            reason: "text outside the root element".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- settlement batch -->
<Document xmlns="urn:iso:std:iso:20022:tech:xsd:pacs.008.001.10"
          xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <?render mode="compact"?>
  <FIToFICstmrCdtTrf>
    <GrpHdr>
      <MsgId>MSG&amp;001</MsgId>
      <NbOfTxs>1</NbOfTxs>
    </GrpHdr>
    <CdtTrfTxInf>
      <IntrBkSttlmAmt Ccy="USD">1000.00</IntrBkSttlmAmt>
    </CdtTrfTxInf>
  </FIToFICstmrCdtTrf>
</Document>"#;

    fn nested(depth: usize) -> String {
        format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn nesting_is_bounded() {
        assert!(parse_document(&nested(MAX_DEPTH)).is_ok());

        let err = parse_document(&nested(20_000)).unwrap_err();
        assert!(err.to_string().contains("nesting exceeds 512"), "{err}");
        assert_eq!(err.location().map(|l| l.column), Some(3 * MAX_DEPTH + 1));

        let empty_leaf = format!("{}<b/>{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert!(parse_document(&empty_leaf).is_err());
    }

    #[test]
    fn parses_and_resolves_default_namespace() {
        let root = parse_document(PACS).unwrap();
        assert_eq!(root.local_name, "Document");
        assert_eq!(
            root.namespace.as_deref(),
            Some("urn:iso:std:iso:20022:tech:xsd:pacs.008.001.10")
        );
        let tx = root.child_elements().next().unwrap();
        assert_eq!(tx.local_name, "FIToFICstmrCdtTrf");
        assert_eq!(tx.namespace, root.namespace);
    }

    #[test]
    fn drops_comments_processing_instructions_and_whitespace() {
        let root = parse_document(PACS).unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(!root.has_text());
    }

    #[test]
    fn unescapes_text_and_attributes() {
        let root = parse_document(PACS).unwrap();
        let header = root.child_elements().next().unwrap().child_elements().next().unwrap();
        let msg_id = header.child_elements().next().unwrap();
        assert_eq!(msg_id.text(), "MSG&001");

        let amount = root
            .child_elements()
            .next()
            .unwrap()
            .child_elements()
            .nth(1)
            .unwrap()
            .child_elements()
            .next()
            .unwrap();
        assert_eq!(amount.attribute("Ccy"), Some("USD"));
        assert_eq!(amount.text(), "1000.00");
    }

    #[test]
    fn records_locations() {
        let root = parse_document(PACS).unwrap();
        assert_eq!(root.location.line, 3);
        assert_eq!(root.location.column, 1);
        let tx = root.child_elements().next().unwrap();
        assert_eq!(tx.location.line, 6);
        assert_eq!(tx.location.column, 3);
    }

    #[test]
    fn compact_output_reparses_to_same_text() {
        let root = parse_document(PACS).unwrap();
        let compact = root.to_xml_string();
        assert!(!compact.starts_with("<?xml"));
        assert!(!compact.contains('\n'));
        assert!(compact.contains("<MsgId>MSG&amp;001</MsgId>"));
        let again = parse_document(&compact).unwrap();
        assert_eq!(again.to_xml_string(), compact);
    }

    #[test]
    fn prefixed_names_and_attributes() {
        let xml = r#"<a:Root xmlns:a="urn:a" xmlns:b="urn:b" b:flag="1" plain="2"><a:Child/></a:Root>"#;
        let root = parse_document(xml).unwrap();
        assert_eq!(root.prefix(), Some("a"));
        assert_eq!(root.namespace.as_deref(), Some("urn:a"));
        assert_eq!(root.attribute_ns("urn:b", "flag"), Some("1"));
        assert_eq!(root.attribute("plain"), Some("2"));
        assert!(root.attributes[0].is_namespace_declaration());
        let (ns, local) = root.resolve_qname("b:Thing").unwrap();
        assert_eq!(ns.as_deref(), Some("urn:b"));
        assert_eq!(local, "Thing");
    }

    #[test]
    fn default_namespace_can_be_undeclared() {
        let xml = r#"<Root xmlns="urn:a"><Inner xmlns=""/></Root>"#;
        let root = parse_document(xml).unwrap();
        let inner = root.child_elements().next().unwrap();
        assert_eq!(inner.namespace, None);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let root = parse_document("\u{feff}<Root/>").unwrap();
        assert_eq!(root.name, "Root");
    }

    #[test]
    fn rejects_unbound_prefix() {
        let err = parse_document("<x:Root/>").unwrap_err();
        assert!(matches!(err, MarkupError::UnboundPrefix { ref prefix, .. } if prefix == "x"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            parse_document("<Root><A></Root>"),
            Err(MarkupError::Malformed { .. })
        ));
        assert!(matches!(
            parse_document("<Root/><Other/>"),
            Err(MarkupError::Malformed { .. })
        ));
        assert!(matches!(
            parse_document("<Root>"),
            Err(MarkupError::Malformed { .. })
        ));
        assert!(matches!(
            parse_document("{\"Document\":{}}"),
            Err(MarkupError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse_document("").unwrap_err(), MarkupError::Empty);
        assert_eq!(parse_document("<!-- nothing -->").unwrap_err(), MarkupError::Empty);
    }

    #[test]
    fn cdata_is_text() {
        let root = parse_document("<Root><![CDATA[a < b]]></Root>").unwrap();
        assert_eq!(root.text(), "a < b");
        assert_eq!(root.to_xml_string(), "<Root>a &lt; b</Root>");
    }

    proptest::proptest! {
        #[test]
        fn escaped_text_and_attributes_survive_a_reparse(
            text in "[A-Za-z0-9&<>'\"][A-Za-z0-9 &<>'\"/;#]{0,30}[A-Za-z0-9&<>'\"]",
            value in "[A-Za-z0-9 &<>'\"/;#]{0,30}",
        ) {
            let mut root = XmlElement::new("Root");
            root.set_attribute(XmlAttribute::new("Ccy", value.clone()));
            root.push_text(text.clone());

            let reparsed = parse_document(&root.to_xml_string());
            proptest::prop_assert!(reparsed.is_ok(), "{:?}", reparsed);
            let reparsed = reparsed.unwrap_or_else(|_| XmlElement::new("Failed"));
            proptest::prop_assert_eq!(reparsed.text(), text);
            proptest::prop_assert_eq!(reparsed.attribute("Ccy"), Some(value.as_str()));
            proptest::prop_assert_eq!(reparsed.to_xml_string(), root.to_xml_string());
        }
    }

    #[test]
    fn set_attribute_replaces() {
        let mut root = XmlElement::new("Root");
        root.set_attribute(XmlAttribute::new("xmlns", "urn:a"));
        root.set_attribute(XmlAttribute::new("xmlns", "urn:b"));
        assert_eq!(root.attributes.len(), 1);
        assert_eq!(root.to_xml_string(), r#"<Root xmlns="urn:b"/>"#);
    }
}
