//! # Schema Component Model
//!
//! The parsed form of one schema definition: its global components keyed
//! by local name, all sharing the definition's target namespace.
//!
//! References between components (`type=`, `ref=`, `base=`) are kept as
//! qualified names and resolved only at validation time, against the whole
//! aggregate. A definition can therefore refer to components another file
//! supplies, and load order does not matter.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::datatypes::WhiteSpace;

/// Namespace of the XML Schema vocabulary and its built-in datatypes.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// A namespace-qualified component name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Namespace URI; `None` for unqualified names.
    pub namespace: Option<String>,
    /// Local part.
    pub local: String,
}

impl QualifiedName {
    /// Build a name from its parts.
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.into(),
        }
    }

    /// Name of a built-in datatype.
    pub fn builtin(local: &str) -> Self {
        Self::new(Some(XSD_NAMESPACE), local)
    }

    /// True if the name lives in the XML Schema namespace.
    pub fn is_builtin(&self) -> bool {
        self.namespace.as_deref() == Some(XSD_NAMESPACE)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Everything one `xs:schema` document declares at top level.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    /// Path or name the definition was loaded from.
    pub source_name: String,
    /// Hex SHA-256 of the source text.
    pub digest: String,
    /// `targetNamespace` of the definition.
    pub target_namespace: Option<String>,
    /// Global element declarations.
    pub elements: BTreeMap<String, ElementDecl>,
    /// Named complex types.
    pub complex_types: BTreeMap<String, ComplexType>,
    /// Named simple types.
    pub simple_types: BTreeMap<String, SimpleType>,
    /// Global attribute declarations.
    pub attributes: BTreeMap<String, AttributeDecl>,
    /// Named model groups.
    pub groups: BTreeMap<String, Particle>,
    /// Named attribute groups.
    pub attribute_groups: BTreeMap<String, AttributeGroup>,
}

impl SchemaDefinition {
    pub(crate) fn empty(source_name: &str, digest: String, target_namespace: Option<String>) -> Self {
        Self {
            source_name: source_name.to_string(),
            digest,
            target_namespace,
            elements: BTreeMap::new(),
            complex_types: BTreeMap::new(),
            simple_types: BTreeMap::new(),
            attributes: BTreeMap::new(),
            groups: BTreeMap::new(),
            attribute_groups: BTreeMap::new(),
        }
    }

    /// Qualified names of every global component, tagged with its kind.
    ///
    /// Types share one symbol space, so simple and complex types both
    /// report the kind `type`.
    pub fn global_components(&self) -> impl Iterator<Item = (&'static str, QualifiedName)> + '_ {
        let ns = self.target_namespace.as_deref();
        let name = move |local: &String| QualifiedName::new(ns, local.as_str());
        self.elements
            .keys()
            .map(move |k| ("element", name(k)))
            .chain(self.complex_types.keys().map(move |k| ("type", name(k))))
            .chain(self.simple_types.keys().map(move |k| ("type", name(k))))
            .chain(self.attributes.keys().map(move |k| ("attribute", name(k))))
            .chain(self.groups.keys().map(move |k| ("group", name(k))))
            .chain(
                self.attribute_groups
                    .keys()
                    .map(move |k| ("attribute group", name(k))),
            )
    }

    /// Number of global components.
    pub fn component_count(&self) -> usize {
        self.elements.len()
            + self.complex_types.len()
            + self.simple_types.len()
            + self.attributes.len()
            + self.groups.len()
            + self.attribute_groups.len()
    }
}

/// Reference to a type definition.
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// A named type, built-in or declared somewhere in the aggregate.
    Named(QualifiedName),
    /// An anonymous simple type declared inline.
    AnonymousSimple(Box<SimpleType>),
    /// An anonymous complex type declared inline.
    AnonymousComplex(Box<ComplexType>),
}

impl TypeRef {
    /// `xs:anyType`, the type of an element declared without one.
    pub fn any_type() -> Self {
        Self::Named(QualifiedName::builtin("anyType"))
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            Self::Named(name) => name.to_string(),
            Self::AnonymousSimple(_) | Self::AnonymousComplex(_) => "anonymous type".to_string(),
        }
    }
}

/// An element declaration, global or local.
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Name the element must carry in instances.
    pub name: QualifiedName,
    /// Its type.
    pub type_ref: TypeRef,
    /// `nillable="true"`.
    pub nillable: bool,
    /// Required value, if `fixed` is set.
    pub fixed: Option<String>,
    /// `abstract="true"`; never valid in an instance.
    pub is_abstract: bool,
}

/// Bounds on how often a particle may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum count.
    pub min: u32,
    /// Maximum count; `None` for `unbounded`.
    pub max: Option<u32>,
}

impl Occurs {
    /// Exactly once.
    pub const ONCE: Self = Self { min: 1, max: Some(1) };

    /// True if zero occurrences are allowed.
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::ONCE
    }
}

/// A term with its occurrence bounds.
#[derive(Debug, Clone)]
pub struct Particle {
    /// What may occur.
    pub term: Term,
    /// How often.
    pub occurs: Occurs,
}

/// The thing a particle matches.
#[derive(Debug, Clone)]
pub enum Term {
    /// A local element declaration.
    Element(ElementDecl),
    /// A reference to a global element.
    ElementRef(QualifiedName),
    /// Children in order.
    Sequence(Vec<Particle>),
    /// Exactly one of the alternatives.
    Choice(Vec<Particle>),
    /// Each child at most once, any order.
    All(Vec<Particle>),
    /// A reference to a named model group.
    GroupRef(QualifiedName),
    /// An element wildcard.
    Any(Wildcard),
}

impl Term {
    /// An empty sequence, matching nothing.
    pub fn empty() -> Self {
        Self::Sequence(Vec::new())
    }
}

/// Namespaces a wildcard admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
    /// `##any`.
    Any,
    /// `##other`: any namespace except the declaring target namespace and
    /// no-namespace.
    Other(Option<String>),
    /// An explicit list; `None` entries stand for `##local`.
    List(Vec<Option<String>>),
}

impl NamespaceConstraint {
    /// True if a name in `namespace` is admitted.
    pub fn allows(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Other(target) => namespace.is_some() && namespace != target.as_deref(),
            Self::List(list) => list.iter().any(|n| n.as_deref() == namespace),
        }
    }
}

impl fmt::Display for NamespaceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("##any"),
            Self::Other(_) => f.write_str("##other"),
            Self::List(list) => {
                let names: Vec<&str> = list
                    .iter()
                    .map(|n| n.as_deref().unwrap_or("##local"))
                    .collect();
                f.write_str(&names.join(" "))
            }
        }
    }
}

/// How strictly wildcard-matched content is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// A declaration must exist and must be satisfied.
    #[default]
    Strict,
    /// Check against a declaration when one exists.
    Lax,
    /// Accept anything.
    Skip,
}

/// An `xs:any` or `xs:anyAttribute` wildcard.
#[derive(Debug, Clone)]
pub struct Wildcard {
    /// Admitted namespaces.
    pub namespaces: NamespaceConstraint,
    /// Processing mode.
    pub process: ProcessContents,
}

/// An attribute declaration.
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    /// Name the attribute must carry.
    pub name: QualifiedName,
    /// Its simple type.
    pub type_ref: TypeRef,
    /// Required value, if `fixed` is set.
    pub fixed: Option<String>,
}

/// How an attribute takes part in a complex type.
#[derive(Debug, Clone)]
pub enum AttributeUse {
    /// Declared in place.
    Local {
        /// The declaration.
        decl: AttributeDecl,
        /// `use="required"`.
        required: bool,
        /// `use="prohibited"`.
        prohibited: bool,
    },
    /// A reference to a global attribute.
    Ref {
        /// Global attribute name.
        name: QualifiedName,
        /// `use="required"`.
        required: bool,
    },
    /// A reference to a named attribute group.
    Group(QualifiedName),
}

/// A named, reusable set of attribute uses.
#[derive(Debug, Clone, Default)]
pub struct AttributeGroup {
    /// Member attribute uses.
    pub uses: Vec<AttributeUse>,
    /// Attribute wildcard of the group.
    pub any_attribute: Option<Wildcard>,
}

/// How a complex type was derived from its base.
#[derive(Debug, Clone)]
pub enum Derivation {
    /// Base content followed by the type's own particle; attributes merged.
    Extension(QualifiedName),
    /// The type's own content replaces the base's.
    Restriction(QualifiedName),
}

impl Derivation {
    /// The base type name.
    pub fn base(&self) -> &QualifiedName {
        match self {
            Self::Extension(b) | Self::Restriction(b) => b,
        }
    }
}

/// What a complex type allows inside its element.
#[derive(Debug, Clone)]
pub enum ContentType {
    /// No children, no text.
    Empty,
    /// Character data only, constrained by a simple type.
    Simple {
        /// Named simple type, or complex type with simple content, the
        /// value is drawn from.
        base: QualifiedName,
        /// Additional facets from a `simpleContent` restriction.
        restriction: Option<Facets>,
    },
    /// Child elements per a model group, with text allowed if `mixed`.
    Elements {
        /// Content model.
        particle: Particle,
        /// Text may appear between children.
        mixed: bool,
    },
}

/// A complex type definition.
#[derive(Debug, Clone)]
pub struct ComplexType {
    /// Name, or `None` when anonymous.
    pub name: Option<QualifiedName>,
    /// Derivation from a base complex type, if any.
    pub derivation: Option<Derivation>,
    /// The type's own content.
    pub content: ContentType,
    /// The type's own attribute uses.
    pub attributes: Vec<AttributeUse>,
    /// The type's own attribute wildcard.
    pub any_attribute: Option<Wildcard>,
    /// `abstract="true"`.
    pub is_abstract: bool,
}

/// A simple type definition.
#[derive(Debug, Clone)]
pub struct SimpleType {
    /// Name, or `None` when anonymous.
    pub name: Option<QualifiedName>,
    /// How the value space is built.
    pub variety: Variety,
}

/// The three ways a simple type is built.
#[derive(Debug, Clone)]
pub enum Variety {
    /// The base type narrowed by facets.
    Restriction {
        /// Base type.
        base: TypeRef,
        /// Facets applied on top of the base.
        facets: Facets,
    },
    /// Whitespace-separated items of one type.
    List {
        /// Item type.
        item: TypeRef,
    },
    /// A value of any member type.
    Union {
        /// Member types, tried in order.
        members: Vec<TypeRef>,
    },
}

/// A compiled `pattern` facet.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The pattern as written in the schema.
    pub source: String,
    /// Anchored translation of it.
    pub regex: Regex,
}

/// Constraining facets of one restriction step.
#[derive(Debug, Clone, Default)]
pub struct Facets {
    /// `length`.
    pub length: Option<usize>,
    /// `minLength`.
    pub min_length: Option<usize>,
    /// `maxLength`.
    pub max_length: Option<usize>,
    /// `pattern`; a value must match at least one.
    pub patterns: Vec<Pattern>,
    /// `enumeration`; a value must equal one, if any are given.
    pub enumeration: Vec<String>,
    /// `minInclusive`.
    pub min_inclusive: Option<String>,
    /// `maxInclusive`.
    pub max_inclusive: Option<String>,
    /// `minExclusive`.
    pub min_exclusive: Option<String>,
    /// `maxExclusive`.
    pub max_exclusive: Option<String>,
    /// `totalDigits`.
    pub total_digits: Option<u32>,
    /// `fractionDigits`.
    pub fraction_digits: Option<u32>,
    /// `whiteSpace`.
    pub white_space: Option<WhiteSpace>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_display() {
        let name = QualifiedName::new(Some("urn:x"), "Document");
        assert_eq!(name.to_string(), "urn:x:Document");
        assert_eq!(QualifiedName::new(None, "Ccy").to_string(), "Ccy");
        assert!(QualifiedName::builtin("string").is_builtin());
    }

    #[test]
    fn other_constraint_excludes_target_and_local() {
        let other = NamespaceConstraint::Other(Some("urn:x".into()));
        assert!(other.allows(Some("urn:y")));
        assert!(!other.allows(Some("urn:x")));
        assert!(!other.allows(None));
        assert!(NamespaceConstraint::Any.allows(None));

        let list = NamespaceConstraint::List(vec![None, Some("urn:z".into())]);
        assert!(list.allows(None));
        assert!(list.allows(Some("urn:z")));
        assert!(!list.allows(Some("urn:x")));
        assert_eq!(list.to_string(), "##local urn:z");
    }

    #[test]
    fn global_components_share_type_symbol_space() {
        let mut def = SchemaDefinition::empty("a.xsd", String::new(), Some("urn:x".into()));
        def.simple_types.insert(
            "Max35Text".into(),
            SimpleType {
                name: None,
                variety: Variety::List {
                    item: TypeRef::Named(QualifiedName::builtin("string")),
                },
            },
        );
        let kinds: Vec<_> = def.global_components().collect();
        assert_eq!(kinds, vec![("type", QualifiedName::new(Some("urn:x"), "Max35Text"))]);
        assert_eq!(def.component_count(), 1);
    }
}
