//! # Instance Validation
//!
//! Checks a parsed instance document against every definition in the
//! aggregate and reports each deviation as a [`ValidationEvent`].
//!
//! ## Content Models
//!
//! Children are matched against the content model greedily, left to
//! right. A child that matches an element particle is consumed and
//! validated immediately; once a particle has consumed input the match is
//! committed. Schemas that satisfy the Unique Particle Attribution rule,
//! as ISO 20022 message schemas do, never need backtracking.
//!
//! After the first content-model violation inside an element, the rest of
//! that element's children are not matched, so one misplaced child yields
//! one event rather than a cascade.

use iso20022_core::markup::XSI_NAMESPACE;
use iso20022_core::{SourceLocation, XmlElement};

use crate::datatypes::{Builtin, WhiteSpace};
use crate::event::ValidationEvent;
use crate::facets::{check_facets, ValueKind};
use crate::model::{
    AttributeDecl, AttributeGroup, AttributeUse, ComplexType, ContentType, Derivation,
    ElementDecl, Facets, Particle, ProcessContents, QualifiedName, SchemaDefinition, SimpleType,
    Term, TypeRef, Variety, Wildcard,
};

/// Bound on type derivation chains and group nesting; deeper chains are
/// reported as circular.
const MAX_DEPTH: usize = 32;

/// Validate a document root against the definitions, returning the
/// events found in document order.
pub fn validate_document(definitions: &[SchemaDefinition], root: &XmlElement) -> Vec<ValidationEvent> {
    let mut validator = Validator {
        components: Components { definitions },
        events: Vec::new(),
        group_depth: 0,
    };
    validator.validate_root(root);
    validator.events
}

/// Lookup of global components across all definitions.
#[derive(Clone, Copy)]
struct Components<'a> {
    definitions: &'a [SchemaDefinition],
}

/// A type reference after lookup.
#[derive(Clone, Copy)]
enum Resolved<'a> {
    Builtin(Builtin),
    Simple(&'a SimpleType),
    Complex(&'a ComplexType),
}

impl<'a> Components<'a> {
    fn find_in<T>(
        &self,
        namespace: Option<&str>,
        lookup: impl FnMut(&'a SchemaDefinition) -> Option<T>,
    ) -> Option<T> {
        let definitions: &'a [SchemaDefinition] = self.definitions;
        definitions
            .iter()
            .filter(|d| d.target_namespace.as_deref() == namespace)
            .find_map(lookup)
    }

    fn has_namespace(&self, namespace: Option<&str>) -> bool {
        self.definitions
            .iter()
            .any(|d| d.target_namespace.as_deref() == namespace)
    }

    fn element(&self, name: &QualifiedName) -> Option<&'a ElementDecl> {
        self.find_in(name.namespace.as_deref(), |d| d.elements.get(&name.local))
    }

    fn attribute(&self, name: &QualifiedName) -> Option<&'a AttributeDecl> {
        self.find_in(name.namespace.as_deref(), |d| d.attributes.get(&name.local))
    }

    fn group(&self, name: &QualifiedName) -> Option<&'a Particle> {
        self.find_in(name.namespace.as_deref(), |d| d.groups.get(&name.local))
    }

    fn attribute_group(&self, name: &QualifiedName) -> Option<&'a AttributeGroup> {
        self.find_in(name.namespace.as_deref(), |d| d.attribute_groups.get(&name.local))
    }

    fn resolve_name(&self, name: &QualifiedName) -> Option<Resolved<'a>> {
        if name.is_builtin() {
            return Builtin::from_local_name(&name.local).map(Resolved::Builtin);
        }
        self.find_in(name.namespace.as_deref(), |d| {
            d.complex_types
                .get(&name.local)
                .map(Resolved::Complex)
                .or_else(|| d.simple_types.get(&name.local).map(Resolved::Simple))
        })
    }

    fn resolve(&self, type_ref: &'a TypeRef) -> Option<Resolved<'a>> {
        match type_ref {
            TypeRef::Named(name) => self.resolve_name(name),
            TypeRef::AnonymousSimple(simple) => Some(Resolved::Simple(simple)),
            TypeRef::AnonymousComplex(complex) => Some(Resolved::Complex(complex)),
        }
    }
}

/// Why a simple value was rejected.
enum SimpleError {
    /// A type in the derivation chain is not declared anywhere.
    Undeclared(String),
    /// The value is outside the type's value space.
    Invalid(String),
}

/// Content and attributes of a complex type with its derivation chain
/// applied.
struct Effective<'a> {
    content: EffectiveContent<'a>,
    attributes: Vec<&'a AttributeUse>,
    any_attribute: Option<&'a Wildcard>,
}

enum EffectiveContent<'a> {
    Empty,
    /// Character data checked against the given type's simple content.
    Simple(&'a ComplexType),
    /// Children matched as a sequence of the parts.
    Elements { parts: Vec<&'a Particle>, mixed: bool },
    /// `xs:anyType` content; unchecked.
    Any,
}

impl Effective<'_> {
    fn empty() -> Self {
        Self {
            content: EffectiveContent::Empty,
            attributes: Vec::new(),
            any_attribute: None,
        }
    }
}

struct AttributeSlot<'a> {
    decl: &'a AttributeDecl,
    required: bool,
    prohibited: bool,
}

/// Children consumed so far, and the names that could still come next.
struct Matched {
    position: usize,
    expected: Vec<String>,
}

/// The child at `position` (or the end of content) fits nothing; these
/// names were possible there.
struct Mismatch {
    position: usize,
    expected: Vec<String>,
}

type MatchResult = Result<Matched, Mismatch>;

fn merge(into: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !into.contains(&name) {
            into.push(name);
        }
    }
}

fn merged(mut first: Vec<String>, then: Vec<String>) -> Vec<String> {
    merge(&mut first, then);
    first
}

fn instance_name(element: &XmlElement) -> QualifiedName {
    QualifiedName {
        namespace: element.namespace.clone(),
        local: element.local_name.clone(),
    }
}

fn names_match(element: &XmlElement, name: &QualifiedName) -> bool {
    element.local_name == name.local && element.namespace == name.namespace
}

fn normalize(facets: &Facets, kind: ValueKind, raw: &str) -> String {
    let mode = facets.white_space.unwrap_or(match kind {
        ValueKind::Atomic(builtin) => builtin.white_space(),
        ValueKind::List => WhiteSpace::Collapse,
    });
    mode.apply(raw)
}

struct Validator<'a> {
    components: Components<'a>,
    events: Vec<ValidationEvent>,
    group_depth: usize,
}

impl<'a> Validator<'a> {
    fn error(&mut self, message: String, location: SourceLocation) {
        self.events.push(ValidationEvent::error(message, Some(location)));
    }

    fn warning(&mut self, message: String, location: SourceLocation) {
        self.events.push(ValidationEvent::warning(message, Some(location)));
    }

    fn validate_root(&mut self, root: &XmlElement) {
        let name = instance_name(root);
        match self.components.element(&name) {
            Some(decl) => self.validate_element(root, decl),
            None if self.components.has_namespace(name.namespace.as_deref()) => {
                self.error(format!("The '{name}' element is not declared."), root.location);
            }
            None => self.warning(
                format!("Could not find schema information for the element '{name}'."),
                root.location,
            ),
        }
    }

    fn validate_element(&mut self, element: &XmlElement, decl: &'a ElementDecl) {
        let name = instance_name(element);
        if decl.is_abstract {
            self.error(
                format!("The element '{name}' is abstract or its type is abstract."),
                element.location,
            );
            return;
        }

        let nil = element
            .attribute_ns(XSI_NAMESPACE, "nil")
            .is_some_and(|v| matches!(v.trim(), "true" | "1"));
        if nil {
            if !decl.nillable {
                self.error(
                    format!("If the 'nillable' attribute is false in the schema, the 'xsi:nil' attribute must not be present in the instance of '{name}'."),
                    element.location,
                );
            } else if element.child_elements().next().is_some() || element.has_text() {
                self.error(
                    format!("Element '{name}' must have no character or element information item children, because 'xsi:nil' is 'true'."),
                    element.location,
                );
            }
            return;
        }

        let (resolved, type_name) = match element.attribute_ns(XSI_NAMESPACE, "type") {
            Some(xsi_type) => {
                let target = element
                    .resolve_qname(xsi_type)
                    .ok()
                    .map(|(namespace, local)| QualifiedName { namespace, local });
                match target.as_ref().and_then(|t| self.components.resolve_name(t)) {
                    Some(resolved) => (resolved, xsi_type.to_string()),
                    None => {
                        self.error(
                            format!("This is an invalid xsi:type '{xsi_type}'."),
                            element.location,
                        );
                        return;
                    }
                }
            }
            None => match self.components.resolve(&decl.type_ref) {
                Some(resolved) => (resolved, decl.type_ref.display_name()),
                None => {
                    self.error(
                        format!("The type '{}' is not declared.", decl.type_ref.display_name()),
                        element.location,
                    );
                    return;
                }
            },
        };

        match resolved {
            Resolved::Builtin(Builtin::AnyType) => {}
            Resolved::Complex(ty) if ty.is_abstract => self.error(
                format!("The element '{name}' is abstract or its type is abstract."),
                element.location,
            ),
            Resolved::Complex(ty) => self.validate_complex(element, decl, ty),
            Resolved::Builtin(_) | Resolved::Simple(_) => {
                self.check_attributes(element, &[], None);
                if let Some(child) = element.child_elements().next() {
                    self.error(
                        format!(
                            "The element '{name}' cannot contain child element '{}' because the parent element's content model is text only.",
                            instance_name(child)
                        ),
                        child.location,
                    );
                    return;
                }
                self.check_element_value(element, decl, resolved, &type_name);
            }
        }
    }

    fn validate_complex(&mut self, element: &XmlElement, decl: &'a ElementDecl, ty: &'a ComplexType) {
        let name = instance_name(element);
        let effective = match self.effective(ty, 0) {
            Ok(effective) => effective,
            Err(reason) => {
                self.error(reason, element.location);
                return;
            }
        };
        self.check_attributes(element, &effective.attributes, effective.any_attribute);

        match effective.content {
            EffectiveContent::Any => {}
            EffectiveContent::Empty => {
                if let Some(child) = element.child_elements().next() {
                    self.error(
                        format!(
                            "The element '{name}' cannot contain child element '{}' because the parent element's content model is empty.",
                            instance_name(child)
                        ),
                        child.location,
                    );
                } else if element.has_text() {
                    self.error(
                        format!("The element '{name}' cannot contain text because the content model is empty."),
                        element.location,
                    );
                }
            }
            EffectiveContent::Simple(owner) => {
                if let Some(child) = element.child_elements().next() {
                    self.error(
                        format!(
                            "The element '{name}' cannot contain child element '{}' because the parent element's content model is text only.",
                            instance_name(child)
                        ),
                        child.location,
                    );
                    return;
                }
                let type_name = owner
                    .name
                    .as_ref()
                    .map_or_else(|| "anonymous type".to_string(), ToString::to_string);
                self.check_element_value(element, decl, Resolved::Complex(owner), &type_name);
            }
            EffectiveContent::Elements { parts, mixed } => {
                let children: Vec<&XmlElement> = element.child_elements().collect();
                if !mixed && element.has_text() {
                    let expected = self.first_names(&parts);
                    self.error(
                        format!("The element '{name}' cannot contain text. List of possible elements expected: {expected}."),
                        element.location,
                    );
                }
                self.check_content(element, &parts, &children);
            }
        }
    }

    /// Names a content model could start with, for diagnostics.
    fn first_names(&mut self, parts: &[&'a Particle]) -> String {
        let events = self.events.len();
        let names = match self.match_sequence(parts.iter().copied(), &[], 0) {
            Ok(m) => m.expected,
            Err(e) => e.expected,
        };
        self.events.truncate(events);
        format!("'{}'", names.join(", "))
    }

    fn check_content(&mut self, element: &XmlElement, parts: &[&'a Particle], children: &[&XmlElement]) {
        let name = instance_name(element);
        let outcome = self.match_sequence(parts.iter().copied(), children, 0);
        let (position, expected) = match outcome {
            Ok(m) if m.position == children.len() => return,
            Ok(m) => (m.position, m.expected),
            Err(e) => (e.position, e.expected),
        };
        let expectation = if expected.is_empty() {
            String::new()
        } else {
            format!(" List of possible elements expected: '{}'.", expected.join(", "))
        };
        match children.get(position) {
            Some(child) => self.error(
                format!(
                    "The element '{name}' has invalid child element '{}'.{expectation}",
                    instance_name(child)
                ),
                child.location,
            ),
            None => self.error(
                format!("The element '{name}' has incomplete content.{expectation}"),
                element.location,
            ),
        }
    }

    fn effective(&mut self, ty: &'a ComplexType, depth: usize) -> Result<Effective<'a>, String> {
        if depth > MAX_DEPTH {
            return Err(format!(
                "The derivation of type '{}' is circular.",
                ty.name.as_ref().map_or_else(|| "anonymous type".to_string(), ToString::to_string)
            ));
        }
        let mut effective = match &ty.derivation {
            Some(derivation) => match self.components.resolve_name(derivation.base()) {
                Some(Resolved::Complex(base)) => {
                    let mut inherited = self.effective(base, depth + 1)?;
                    if matches!(derivation, Derivation::Restriction(_)) {
                        inherited.content = EffectiveContent::Empty;
                    }
                    inherited
                }
                Some(Resolved::Builtin(Builtin::AnyType)) => Effective {
                    content: EffectiveContent::Any,
                    ..Effective::empty()
                },
                Some(Resolved::Builtin(_) | Resolved::Simple(_)) => Effective::empty(),
                None => {
                    return Err(format!("The type '{}' is not declared.", derivation.base()));
                }
            },
            None => Effective::empty(),
        };

        let extends = matches!(ty.derivation, Some(Derivation::Extension(_)));
        match &ty.content {
            ContentType::Empty if extends => {}
            ContentType::Empty => effective.content = EffectiveContent::Empty,
            ContentType::Simple { .. } => effective.content = EffectiveContent::Simple(ty),
            ContentType::Elements { particle, mixed } => {
                effective.content = match effective.content {
                    EffectiveContent::Elements { mut parts, mixed: inherited } if extends => {
                        parts.push(particle);
                        EffectiveContent::Elements {
                            parts,
                            mixed: inherited || *mixed,
                        }
                    }
                    _ => EffectiveContent::Elements {
                        parts: vec![particle],
                        mixed: *mixed,
                    },
                };
            }
        }
        effective.attributes.extend(ty.attributes.iter());
        if ty.any_attribute.is_some() {
            effective.any_attribute = ty.any_attribute.as_ref();
        }
        Ok(effective)
    }

    // ---- simple values ----

    fn check_element_value(
        &mut self,
        element: &XmlElement,
        decl: &ElementDecl,
        resolved: Resolved<'a>,
        type_name: &str,
    ) {
        let name = instance_name(element);
        let text = element.text();
        match self.value_of(resolved, &text, 0) {
            Ok(kind) => {
                if let Some(fixed) = &decl.fixed {
                    let same = match kind {
                        ValueKind::Atomic(builtin) => {
                            builtin.same_value(&builtin.white_space().apply(&text), fixed)
                        }
                        ValueKind::List => {
                            text.split_whitespace().eq(fixed.split_whitespace())
                        }
                    };
                    if !same {
                        self.error(
                            format!("The value of the '{name}' element does not equal its fixed value."),
                            element.location,
                        );
                    }
                }
            }
            Err(SimpleError::Undeclared(missing)) => {
                self.error(format!("The type '{missing}' is not declared."), element.location);
            }
            Err(SimpleError::Invalid(reason)) => self.error(
                format!("The '{name}' element is invalid - The value '{text}' is invalid according to its datatype '{type_name}' - {reason}"),
                element.location,
            ),
        }
    }

    fn value_of_type(&self, type_ref: &'a TypeRef, raw: &str, depth: usize) -> Result<ValueKind, SimpleError> {
        let resolved = self
            .components
            .resolve(type_ref)
            .ok_or_else(|| SimpleError::Undeclared(type_ref.display_name()))?;
        self.value_of(resolved, raw, depth)
    }

    fn value_of_name(&self, name: &QualifiedName, raw: &str, depth: usize) -> Result<ValueKind, SimpleError> {
        let resolved = self
            .components
            .resolve_name(name)
            .ok_or_else(|| SimpleError::Undeclared(name.to_string()))?;
        self.value_of(resolved, raw, depth)
    }

    fn value_of(&self, resolved: Resolved<'a>, raw: &str, depth: usize) -> Result<ValueKind, SimpleError> {
        if depth > MAX_DEPTH {
            return Err(SimpleError::Invalid(
                "The type derivation is circular.".to_string(),
            ));
        }
        match resolved {
            Resolved::Builtin(builtin) => {
                let value = builtin.white_space().apply(raw);
                builtin.check(&value).map_err(SimpleError::Invalid)?;
                Ok(if builtin.is_list() {
                    ValueKind::List
                } else {
                    ValueKind::Atomic(builtin)
                })
            }
            Resolved::Simple(simple) => match &simple.variety {
                Variety::Restriction { base, facets } => {
                    let kind = self.value_of_type(base, raw, depth + 1)?;
                    let value = normalize(facets, kind, raw);
                    check_facets(facets, &value, kind).map_err(SimpleError::Invalid)?;
                    Ok(kind)
                }
                Variety::List { item } => {
                    for token in raw.split_whitespace() {
                        self.value_of_type(item, token, depth + 1)?;
                    }
                    Ok(ValueKind::List)
                }
                Variety::Union { members } => {
                    let mut last = None;
                    for member in members {
                        match self.value_of_type(member, raw, depth + 1) {
                            Ok(kind) => return Ok(kind),
                            Err(e) => last = Some(e),
                        }
                    }
                    Err(last.unwrap_or_else(|| {
                        SimpleError::Invalid("The union has no member types.".to_string())
                    }))
                }
            },
            Resolved::Complex(complex) => match &complex.content {
                ContentType::Simple { base, restriction } => {
                    let kind = self.value_of_name(base, raw, depth + 1)?;
                    if let Some(facets) = restriction {
                        let value = normalize(facets, kind, raw);
                        check_facets(facets, &value, kind).map_err(SimpleError::Invalid)?;
                    }
                    Ok(kind)
                }
                _ => Err(SimpleError::Invalid(
                    "The type does not have simple content.".to_string(),
                )),
            },
        }
    }

    // ---- attributes ----

    fn check_attributes(
        &mut self,
        element: &XmlElement,
        uses: &[&'a AttributeUse],
        wildcard: Option<&'a Wildcard>,
    ) {
        let mut slots = Vec::new();
        let mut wildcard = wildcard;
        self.flatten_attributes(element, uses.iter().copied(), &mut slots, &mut wildcard, 0);
        let owner = instance_name(element);

        for attribute in &element.attributes {
            if attribute.is_namespace_declaration()
                || attribute.namespace.as_deref() == Some(XSI_NAMESPACE)
            {
                continue;
            }
            let name = QualifiedName {
                namespace: attribute.namespace.clone(),
                local: attribute.local_name.clone(),
            };
            match slots.iter().find(|s| s.decl.name == name) {
                Some(slot) if slot.prohibited => self.error(
                    format!("The '{}' attribute is not allowed.", attribute.name),
                    element.location,
                ),
                Some(slot) => {
                    let decl = slot.decl;
                    self.check_attribute_value(element, &attribute.name, &attribute.value, decl);
                }
                None => match wildcard {
                    Some(w) if w.namespaces.allows(name.namespace.as_deref()) => {
                        match (w.process, self.components.attribute(&name)) {
                            (ProcessContents::Skip, _) | (ProcessContents::Lax, None) => {}
                            (_, Some(decl)) => {
                                self.check_attribute_value(element, &attribute.name, &attribute.value, decl);
                            }
                            (ProcessContents::Strict, None) => self.error(
                                format!("The '{}' attribute is not declared.", attribute.name),
                                element.location,
                            ),
                        }
                    }
                    _ => self.error(
                        format!("The '{}' attribute is not declared.", attribute.name),
                        element.location,
                    ),
                },
            }
        }

        for slot in slots.iter().filter(|s| s.required && !s.prohibited) {
            let present = element.attributes.iter().any(|a| {
                a.local_name == slot.decl.name.local && a.namespace == slot.decl.name.namespace
            });
            if !present {
                self.error(
                    format!(
                        "The required attribute '{}' is missing from element '{owner}'.",
                        slot.decl.name
                    ),
                    element.location,
                );
            }
        }
    }

    fn flatten_attributes(
        &mut self,
        element: &XmlElement,
        uses: impl Iterator<Item = &'a AttributeUse>,
        slots: &mut Vec<AttributeSlot<'a>>,
        wildcard: &mut Option<&'a Wildcard>,
        depth: usize,
    ) {
        for usage in uses {
            match usage {
                AttributeUse::Local { decl, required, prohibited } => slots.push(AttributeSlot {
                    decl,
                    required: *required,
                    prohibited: *prohibited,
                }),
                AttributeUse::Ref { name, required } => match self.components.attribute(name) {
                    Some(decl) => slots.push(AttributeSlot {
                        decl,
                        required: *required,
                        prohibited: false,
                    }),
                    None => self.error(
                        format!("The attribute '{name}' is not declared."),
                        element.location,
                    ),
                },
                AttributeUse::Group(name) => match self.components.attribute_group(name) {
                    Some(_) if depth > MAX_DEPTH => self.error(
                        format!("The attribute group '{name}' is circular."),
                        element.location,
                    ),
                    Some(group) => {
                        self.flatten_attributes(element, group.uses.iter(), slots, wildcard, depth + 1);
                        if wildcard.is_none() {
                            *wildcard = group.any_attribute.as_ref();
                        }
                    }
                    None => self.error(
                        format!("The attribute group '{name}' is not declared."),
                        element.location,
                    ),
                },
            }
        }
    }

    fn check_attribute_value(
        &mut self,
        element: &XmlElement,
        written_name: &str,
        value: &str,
        decl: &'a AttributeDecl,
    ) {
        match self.value_of_type(&decl.type_ref, value, 0) {
            Ok(kind) => {
                if let Some(fixed) = &decl.fixed {
                    let same = match kind {
                        ValueKind::Atomic(builtin) => {
                            builtin.same_value(&builtin.white_space().apply(value), fixed)
                        }
                        ValueKind::List => value.split_whitespace().eq(fixed.split_whitespace()),
                    };
                    if !same {
                        self.error(
                            format!("The value of the '{written_name}' attribute does not equal its fixed value."),
                            element.location,
                        );
                    }
                }
            }
            Err(SimpleError::Undeclared(missing)) => {
                self.error(format!("The type '{missing}' is not declared."), element.location);
            }
            Err(SimpleError::Invalid(reason)) => self.error(
                format!(
                    "The '{written_name}' attribute is invalid - The value '{value}' is invalid according to its datatype '{}' - {reason}",
                    decl.type_ref.display_name()
                ),
                element.location,
            ),
        }
    }

    // ---- content model matching ----

    fn match_particle(&mut self, particle: &'a Particle, children: &[&XmlElement], start: usize) -> MatchResult {
        let mut position = start;
        let mut count = 0u32;
        let mut follow = Vec::new();
        loop {
            if particle.occurs.max.is_some_and(|max| count >= max) {
                break;
            }
            match self.match_term(&particle.term, children, position) {
                Ok(m) if m.position == position => {
                    merge(&mut follow, m.expected);
                    break;
                }
                Ok(m) => {
                    position = m.position;
                    count += 1;
                    follow = m.expected;
                }
                Err(mut e) => {
                    if e.position == position {
                        e.expected = merged(std::mem::take(&mut follow), e.expected);
                    }
                    if e.position > position || count < particle.occurs.min {
                        return Err(e);
                    }
                    follow = e.expected;
                    break;
                }
            }
        }
        Ok(Matched { position, expected: follow })
    }

    fn match_term(&mut self, term: &'a Term, children: &[&XmlElement], position: usize) -> MatchResult {
        match term {
            Term::Element(decl) => self.match_element(decl, children, position),
            Term::ElementRef(name) => match self.components.element(name) {
                Some(decl) => self.match_element(decl, children, position),
                None => match children.get(position) {
                    Some(child) if names_match(child, name) => {
                        self.error(format!("The '{name}' element is not declared."), child.location);
                        Ok(Matched { position: position + 1, expected: Vec::new() })
                    }
                    _ => Err(Mismatch { position, expected: vec![name.local.clone()] }),
                },
            },
            Term::Sequence(items) => self.match_sequence(items.iter(), children, position),
            Term::Choice(items) => self.match_choice(items, children, position),
            Term::All(items) => self.match_all(items, children, position),
            Term::GroupRef(name) => match self.components.group(name) {
                Some(_) if self.group_depth > MAX_DEPTH => {
                    if let Some(child) = children.get(position) {
                        self.error(format!("The group '{name}' is circular."), child.location);
                    }
                    Ok(Matched { position, expected: Vec::new() })
                }
                Some(group) => {
                    self.group_depth += 1;
                    let outcome = self.match_particle(group, children, position);
                    self.group_depth -= 1;
                    outcome
                }
                None => {
                    if let Some(child) = children.get(position) {
                        self.error(format!("The group '{name}' is not declared."), child.location);
                    }
                    Ok(Matched { position, expected: Vec::new() })
                }
            },
            Term::Any(wildcard) => self.match_wildcard(wildcard, children, position),
        }
    }

    fn match_element(&mut self, decl: &'a ElementDecl, children: &[&XmlElement], position: usize) -> MatchResult {
        match children.get(position) {
            Some(child) if names_match(child, &decl.name) => {
                self.validate_element(child, decl);
                Ok(Matched { position: position + 1, expected: Vec::new() })
            }
            _ => Err(Mismatch { position, expected: vec![decl.name.local.clone()] }),
        }
    }

    fn match_sequence(
        &mut self,
        items: impl IntoIterator<Item = &'a Particle>,
        children: &[&XmlElement],
        start: usize,
    ) -> MatchResult {
        let mut position = start;
        let mut follow: Vec<String> = Vec::new();
        for item in items {
            match self.match_particle(item, children, position) {
                Ok(m) => {
                    if m.position == position {
                        merge(&mut follow, m.expected);
                    } else {
                        follow = m.expected;
                    }
                    position = m.position;
                }
                Err(mut e) => {
                    if e.position == position {
                        e.expected = merged(follow, e.expected);
                    }
                    return Err(e);
                }
            }
        }
        Ok(Matched { position, expected: follow })
    }

    fn match_choice(&mut self, items: &'a [Particle], children: &[&XmlElement], start: usize) -> MatchResult {
        let mut expected = Vec::new();
        let mut emptiable = false;
        for item in items {
            match self.match_particle(item, children, start) {
                Ok(m) if m.position > start => return Ok(m),
                Ok(m) => {
                    emptiable = true;
                    merge(&mut expected, m.expected);
                }
                Err(e) if e.position > start => return Err(e),
                Err(e) => merge(&mut expected, e.expected),
            }
        }
        if emptiable {
            Ok(Matched { position: start, expected })
        } else {
            Err(Mismatch { position: start, expected })
        }
    }

    fn match_all(&mut self, items: &'a [Particle], children: &[&XmlElement], start: usize) -> MatchResult {
        let mut seen = vec![false; items.len()];
        let mut position = start;
        while let Some(child) = children.get(position) {
            let slot = items.iter().enumerate().position(|(i, item)| {
                !seen[i]
                    && match &item.term {
                        Term::Element(decl) => names_match(child, &decl.name),
                        Term::ElementRef(name) => names_match(child, name),
                        _ => false,
                    }
            });
            let Some(i) = slot else { break };
            seen[i] = true;
            position = self.match_term(&items[i].term, children, position)?.position;
        }

        let label = |item: &Particle| match &item.term {
            Term::Element(decl) => decl.name.local.clone(),
            Term::ElementRef(name) => name.local.clone(),
            _ => String::new(),
        };
        let missing: Vec<String> = items
            .iter()
            .zip(&seen)
            .filter(|(item, seen)| !**seen && !item.occurs.is_optional())
            .map(|(item, _)| label(item))
            .collect();
        let remaining: Vec<String> = items
            .iter()
            .zip(&seen)
            .filter(|(_, seen)| !**seen)
            .map(|(item, _)| label(item))
            .collect();
        if missing.is_empty() {
            Ok(Matched { position, expected: remaining })
        } else {
            Err(Mismatch { position, expected: merged(missing, remaining) })
        }
    }

    fn match_wildcard(&mut self, wildcard: &'a Wildcard, children: &[&XmlElement], position: usize) -> MatchResult {
        match children.get(position) {
            Some(child) if wildcard.namespaces.allows(child.namespace.as_deref()) => {
                let name = instance_name(child);
                match (wildcard.process, self.components.element(&name)) {
                    (ProcessContents::Skip, _) => {}
                    (_, Some(decl)) => self.validate_element(child, decl),
                    (ProcessContents::Lax, None) => self.warning(
                        format!("Could not find schema information for the element '{name}'."),
                        child.location,
                    ),
                    (ProcessContents::Strict, None) => {
                        self.error(format!("The '{name}' element is not declared."), child.location);
                    }
                }
                Ok(Matched { position: position + 1, expected: Vec::new() })
            }
            _ => Err(Mismatch {
                position,
                expected: vec![format!("any element in namespace '{}'", wildcard.namespaces)],
            }),
        }
    }
}
