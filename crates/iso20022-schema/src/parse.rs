//! # Definition Parsing
//!
//! Turns the element tree of one `xs:schema` document into a
//! [`SchemaDefinition`]. The whole definition is built before anything is
//! added to the aggregate, so a faulty file never leaves a partial
//! definition behind.
//!
//! Cross-file references are not checked here. `xs:import` and
//! `xs:include` are accepted and ignored; the aggregate supplies the
//! components they would bring in.

use iso20022_core::XmlElement;

use crate::datatypes::{Builtin, WhiteSpace};
use crate::error::SchemaError;
use crate::facets::compile_pattern;
use crate::model::{
    AttributeDecl, AttributeGroup, AttributeUse, ComplexType, ContentType, Derivation,
    ElementDecl, Facets, NamespaceConstraint, Occurs, Particle, ProcessContents,
    QualifiedName, SchemaDefinition, SimpleType, Term, TypeRef, Variety, Wildcard, XSD_NAMESPACE,
};

/// Parse a schema document's root element into a definition.
///
/// # Errors
///
/// Returns `SchemaError::Invalid` when the root is not `xs:schema`, a
/// component is malformed, a facet value or pattern does not parse, a
/// built-in type name is unknown, or a global name is declared twice.
pub fn parse_definition(
    source_name: &str,
    digest: String,
    root: &XmlElement,
) -> Result<SchemaDefinition, SchemaError> {
    if !is_xsd(root, "schema") {
        return Err(SchemaError::invalid(
            source_name,
            format!("root element '{}' is not xs:schema", root.name),
        ));
    }
    let target_namespace = root
        .attribute("targetNamespace")
        .filter(|ns| !ns.is_empty())
        .map(str::to_string);
    let parser = DefinitionParser {
        source_name,
        target: target_namespace.clone(),
        elements_qualified: root.attribute("elementFormDefault") == Some("qualified"),
        attributes_qualified: root.attribute("attributeFormDefault") == Some("qualified"),
    };
    let mut definition = SchemaDefinition::empty(source_name, digest, target_namespace);

    for child in xsd_children(root) {
        match child.local_name.as_str() {
            "element" => {
                let decl = parser.element_decl(child, true)?;
                insert_unique(&parser, &mut definition.elements, "element", decl.name.local.clone(), decl)?;
            }
            "complexType" => {
                let name = parser.required_name(child)?;
                let ty = parser.complex_type(child, Some(name.clone()))?;
                insert_unique(&parser, &mut definition.complex_types, "complex type", name.local, ty)?;
            }
            "simpleType" => {
                let name = parser.required_name(child)?;
                let ty = parser.simple_type(child, Some(name.clone()))?;
                insert_unique(&parser, &mut definition.simple_types, "simple type", name.local, ty)?;
            }
            "attribute" => {
                let decl = parser.attribute_decl(child, true)?;
                insert_unique(&parser, &mut definition.attributes, "attribute", decl.name.local.clone(), decl)?;
            }
            "group" => {
                let name = parser.required_name(child)?;
                let particle = parser
                    .group_content(child)?
                    .unwrap_or(Particle { term: Term::empty(), occurs: Occurs::ONCE });
                insert_unique(&parser, &mut definition.groups, "group", name.local, particle)?;
            }
            "attributeGroup" => {
                let name = parser.required_name(child)?;
                let group = parser.attribute_group(child)?;
                insert_unique(&parser, &mut definition.attribute_groups, "attribute group", name.local, group)?;
            }
            "import" | "include" | "annotation" | "notation" => {}
            other => {
                return Err(parser.invalid(format!("unsupported top-level component xs:{other}")));
            }
        }
    }

    let types_clash = definition
        .simple_types
        .keys()
        .find(|k| definition.complex_types.contains_key(*k));
    if let Some(name) = types_clash {
        return Err(parser.invalid(format!("type '{name}' is declared twice")));
    }
    Ok(definition)
}

fn insert_unique<T>(
    parser: &DefinitionParser<'_>,
    map: &mut std::collections::BTreeMap<String, T>,
    kind: &str,
    name: String,
    value: T,
) -> Result<(), SchemaError> {
    if map.contains_key(&name) {
        return Err(parser.invalid(format!("{kind} '{name}' is declared twice")));
    }
    map.insert(name, value);
    Ok(())
}

fn is_xsd(element: &XmlElement, local: &str) -> bool {
    element.namespace.as_deref() == Some(XSD_NAMESPACE) && element.local_name == local
}

/// Schema-vocabulary children, skipping annotations.
fn xsd_children(element: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    element.child_elements().filter(|c| {
        c.namespace.as_deref() == Some(XSD_NAMESPACE) && c.local_name != "annotation"
    })
}

struct DefinitionParser<'a> {
    source_name: &'a str,
    target: Option<String>,
    elements_qualified: bool,
    attributes_qualified: bool,
}

impl DefinitionParser<'_> {
    fn invalid(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::invalid(self.source_name, reason)
    }

    fn at(&self, element: &XmlElement, reason: impl std::fmt::Display) -> SchemaError {
        self.invalid(format!("{reason} ({})", element.location))
    }

    fn required_name(&self, element: &XmlElement) -> Result<QualifiedName, SchemaError> {
        let name = element
            .attribute("name")
            .ok_or_else(|| self.at(element, format!("xs:{} without a name", element.local_name)))?;
        Ok(QualifiedName::new(self.target.as_deref(), name))
    }

    fn qname(&self, element: &XmlElement, value: &str) -> Result<QualifiedName, SchemaError> {
        let (namespace, local) = element
            .resolve_qname(value)
            .map_err(|e| self.at(element, e))?;
        let name = QualifiedName { namespace, local };
        if name.is_builtin() && Builtin::from_local_name(&name.local).is_none() {
            return Err(self.at(element, format!("unknown built-in type 'xs:{}'", name.local)));
        }
        Ok(name)
    }

    fn occurs(&self, element: &XmlElement) -> Result<Occurs, SchemaError> {
        let min = match element.attribute("minOccurs") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .map_err(|_| self.at(element, format!("invalid minOccurs '{v}'")))?,
            None => 1,
        };
        let max = match element.attribute("maxOccurs").map(str::trim) {
            Some("unbounded") => None,
            Some(v) => Some(
                v.parse::<u32>()
                    .map_err(|_| self.at(element, format!("invalid maxOccurs '{v}'")))?,
            ),
            None => Some(1),
        };
        if max.is_some_and(|max| max < min) {
            return Err(self.at(element, "maxOccurs is less than minOccurs"));
        }
        Ok(Occurs { min, max })
    }

    fn element_decl(&self, element: &XmlElement, global: bool) -> Result<ElementDecl, SchemaError> {
        let local = element
            .attribute("name")
            .ok_or_else(|| self.at(element, "xs:element without a name"))?;
        let qualified = match element.attribute("form") {
            Some(form) => form == "qualified",
            None => global || self.elements_qualified,
        };
        let namespace = if qualified { self.target.as_deref() } else { None };

        let type_ref = match element.attribute("type") {
            Some(t) => TypeRef::Named(self.qname(element, t)?),
            None => self.anonymous_type(element)?.unwrap_or_else(TypeRef::any_type),
        };
        Ok(ElementDecl {
            name: QualifiedName::new(namespace, local),
            type_ref,
            nillable: element.attribute("nillable") == Some("true"),
            fixed: element.attribute("fixed").map(str::to_string),
            is_abstract: element.attribute("abstract") == Some("true"),
        })
    }

    fn anonymous_type(&self, element: &XmlElement) -> Result<Option<TypeRef>, SchemaError> {
        for child in xsd_children(element) {
            match child.local_name.as_str() {
                "complexType" => {
                    return Ok(Some(TypeRef::AnonymousComplex(Box::new(
                        self.complex_type(child, None)?,
                    ))))
                }
                "simpleType" => {
                    return Ok(Some(TypeRef::AnonymousSimple(Box::new(
                        self.simple_type(child, None)?,
                    ))))
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn particle(&self, element: &XmlElement) -> Result<Option<Particle>, SchemaError> {
        let occurs = self.occurs(element)?;
        let term = match element.local_name.as_str() {
            "element" => match element.attribute("ref") {
                Some(r) => Term::ElementRef(self.qname(element, r)?),
                None => Term::Element(self.element_decl(element, false)?),
            },
            "sequence" => Term::Sequence(self.particles(element)?),
            "choice" => Term::Choice(self.particles(element)?),
            "all" => {
                let members = self.particles(element)?;
                if members.iter().any(|p| !matches!(p.term, Term::Element(_) | Term::ElementRef(_))) {
                    return Err(self.at(element, "xs:all may only contain elements"));
                }
                Term::All(members)
            }
            "group" => {
                let r = element
                    .attribute("ref")
                    .ok_or_else(|| self.at(element, "local xs:group without ref"))?;
                Term::GroupRef(self.qname(element, r)?)
            }
            "any" => Term::Any(self.wildcard(element)?),
            _ => return Ok(None),
        };
        Ok(Some(Particle { term, occurs }))
    }

    fn particles(&self, element: &XmlElement) -> Result<Vec<Particle>, SchemaError> {
        let mut out = Vec::new();
        for child in xsd_children(element) {
            if let Some(p) = self.particle(child)? {
                out.push(p);
            }
        }
        Ok(out)
    }

    /// The model group inside a named `xs:group`.
    fn group_content(&self, element: &XmlElement) -> Result<Option<Particle>, SchemaError> {
        for child in xsd_children(element) {
            if matches!(child.local_name.as_str(), "sequence" | "choice" | "all") {
                return self.particle(child);
            }
        }
        Ok(None)
    }

    fn wildcard(&self, element: &XmlElement) -> Result<Wildcard, SchemaError> {
        let namespaces = match element.attribute("namespace").map(str::trim) {
            None | Some("##any") => NamespaceConstraint::Any,
            Some("##other") => NamespaceConstraint::Other(self.target.clone()),
            Some(list) => NamespaceConstraint::List(
                list.split_whitespace()
                    .map(|token| match token {
                        "##targetNamespace" => self.target.clone(),
                        "##local" => None,
                        uri => Some(uri.to_string()),
                    })
                    .collect(),
            ),
        };
        let process = match element.attribute("processContents") {
            None | Some("strict") => ProcessContents::Strict,
            Some("lax") => ProcessContents::Lax,
            Some("skip") => ProcessContents::Skip,
            Some(other) => {
                return Err(self.at(element, format!("invalid processContents '{other}'")));
            }
        };
        Ok(Wildcard { namespaces, process })
    }

    fn attribute_decl(&self, element: &XmlElement, global: bool) -> Result<AttributeDecl, SchemaError> {
        let local = element
            .attribute("name")
            .ok_or_else(|| self.at(element, "xs:attribute without a name"))?;
        let qualified = match element.attribute("form") {
            Some(form) => form == "qualified",
            None => global || self.attributes_qualified,
        };
        let namespace = if qualified { self.target.as_deref() } else { None };
        let type_ref = match element.attribute("type") {
            Some(t) => TypeRef::Named(self.qname(element, t)?),
            None => match self.anonymous_type(element)? {
                Some(TypeRef::AnonymousComplex(_)) => {
                    return Err(self.at(element, "attribute with a complex type"));
                }
                Some(other) => other,
                None => TypeRef::Named(QualifiedName::builtin("anySimpleType")),
            },
        };
        Ok(AttributeDecl {
            name: QualifiedName::new(namespace, local),
            type_ref,
            fixed: element.attribute("fixed").map(str::to_string),
        })
    }

    fn attribute_use(&self, element: &XmlElement) -> Result<AttributeUse, SchemaError> {
        let usage = element.attribute("use").unwrap_or("optional");
        if !matches!(usage, "optional" | "required" | "prohibited") {
            return Err(self.at(element, format!("invalid attribute use '{usage}'")));
        }
        match element.attribute("ref") {
            Some(r) => Ok(AttributeUse::Ref {
                name: self.qname(element, r)?,
                required: usage == "required",
            }),
            None => Ok(AttributeUse::Local {
                decl: self.attribute_decl(element, false)?,
                required: usage == "required",
                prohibited: usage == "prohibited",
            }),
        }
    }

    /// Attribute uses and wildcard among an element's children.
    fn attribute_content(&self, element: &XmlElement) -> Result<AttributeGroup, SchemaError> {
        let mut group = AttributeGroup::default();
        for child in xsd_children(element) {
            match child.local_name.as_str() {
                "attribute" => group.uses.push(self.attribute_use(child)?),
                "attributeGroup" => {
                    let r = child
                        .attribute("ref")
                        .ok_or_else(|| self.at(child, "local xs:attributeGroup without ref"))?;
                    group.uses.push(AttributeUse::Group(self.qname(child, r)?));
                }
                "anyAttribute" => group.any_attribute = Some(self.wildcard(child)?),
                _ => {}
            }
        }
        Ok(group)
    }

    fn attribute_group(&self, element: &XmlElement) -> Result<AttributeGroup, SchemaError> {
        self.attribute_content(element)
    }

    fn complex_type(
        &self,
        element: &XmlElement,
        name: Option<QualifiedName>,
    ) -> Result<ComplexType, SchemaError> {
        let mixed = element.attribute("mixed") == Some("true");
        let is_abstract = element.attribute("abstract") == Some("true");

        for child in xsd_children(element) {
            match child.local_name.as_str() {
                "simpleContent" => return self.simple_content(child, name, is_abstract),
                "complexContent" => {
                    let mixed = child.attribute("mixed").map_or(mixed, |m| m == "true");
                    return self.complex_content(child, name, mixed, is_abstract);
                }
                _ => {}
            }
        }

        let particle = self.first_model_group(element)?;
        let attributes = self.attribute_content(element)?;
        Ok(ComplexType {
            name,
            derivation: None,
            content: element_content(particle, mixed),
            attributes: attributes.uses,
            any_attribute: attributes.any_attribute,
            is_abstract,
        })
    }

    fn first_model_group(&self, element: &XmlElement) -> Result<Option<Particle>, SchemaError> {
        for child in xsd_children(element) {
            if matches!(child.local_name.as_str(), "sequence" | "choice" | "all" | "group") {
                return self.particle(child);
            }
        }
        Ok(None)
    }

    fn derivation_step<'e>(&self, element: &'e XmlElement) -> Result<(&'e XmlElement, QualifiedName), SchemaError> {
        let step = xsd_children(element)
            .find(|c| matches!(c.local_name.as_str(), "extension" | "restriction"))
            .ok_or_else(|| self.at(element, format!("xs:{} without derivation", element.local_name)))?;
        let base = step
            .attribute("base")
            .ok_or_else(|| self.at(step, format!("xs:{} without base", step.local_name)))?;
        Ok((step, self.qname(step, base)?))
    }

    fn simple_content(
        &self,
        element: &XmlElement,
        name: Option<QualifiedName>,
        is_abstract: bool,
    ) -> Result<ComplexType, SchemaError> {
        let (step, base) = self.derivation_step(element)?;
        let restriction = if step.local_name == "restriction" {
            Some(self.facets(step)?)
        } else {
            None
        };
        let attributes = self.attribute_content(step)?;
        let derivation = match step.local_name.as_str() {
            "extension" => Derivation::Extension(base.clone()),
            _ => Derivation::Restriction(base.clone()),
        };
        Ok(ComplexType {
            name,
            derivation: Some(derivation),
            content: ContentType::Simple { base, restriction },
            attributes: attributes.uses,
            any_attribute: attributes.any_attribute,
            is_abstract,
        })
    }

    fn complex_content(
        &self,
        element: &XmlElement,
        name: Option<QualifiedName>,
        mixed: bool,
        is_abstract: bool,
    ) -> Result<ComplexType, SchemaError> {
        let (step, base) = self.derivation_step(element)?;
        let particle = self.first_model_group(step)?;
        let attributes = self.attribute_content(step)?;
        let derivation = match step.local_name.as_str() {
            "extension" => Derivation::Extension(base),
            _ => Derivation::Restriction(base),
        };
        Ok(ComplexType {
            name,
            derivation: Some(derivation),
            content: element_content(particle, mixed),
            attributes: attributes.uses,
            any_attribute: attributes.any_attribute,
            is_abstract,
        })
    }

    fn simple_type(
        &self,
        element: &XmlElement,
        name: Option<QualifiedName>,
    ) -> Result<SimpleType, SchemaError> {
        let step = xsd_children(element)
            .find(|c| matches!(c.local_name.as_str(), "restriction" | "list" | "union"))
            .ok_or_else(|| self.at(element, "xs:simpleType without restriction, list or union"))?;

        let variety = match step.local_name.as_str() {
            "restriction" => {
                let base = match step.attribute("base") {
                    Some(b) => TypeRef::Named(self.qname(step, b)?),
                    None => self.inline_simple(step)?.ok_or_else(|| {
                        self.at(step, "xs:restriction without base or inline type")
                    })?,
                };
                Variety::Restriction {
                    base,
                    facets: self.facets(step)?,
                }
            }
            "list" => {
                let item = match step.attribute("itemType") {
                    Some(t) => TypeRef::Named(self.qname(step, t)?),
                    None => self
                        .inline_simple(step)?
                        .ok_or_else(|| self.at(step, "xs:list without item type"))?,
                };
                Variety::List { item }
            }
            _ => {
                let mut members = Vec::new();
                if let Some(list) = step.attribute("memberTypes") {
                    for member in list.split_whitespace() {
                        members.push(TypeRef::Named(self.qname(step, member)?));
                    }
                }
                for child in xsd_children(step).filter(|c| c.local_name == "simpleType") {
                    members.push(TypeRef::AnonymousSimple(Box::new(self.simple_type(child, None)?)));
                }
                if members.is_empty() {
                    return Err(self.at(step, "xs:union without member types"));
                }
                Variety::Union { members }
            }
        };
        Ok(SimpleType { name, variety })
    }

    fn inline_simple(&self, element: &XmlElement) -> Result<Option<TypeRef>, SchemaError> {
        match xsd_children(element).find(|c| c.local_name == "simpleType") {
            Some(child) => Ok(Some(TypeRef::AnonymousSimple(Box::new(
                self.simple_type(child, None)?,
            )))),
            None => Ok(None),
        }
    }

    fn facets(&self, step: &XmlElement) -> Result<Facets, SchemaError> {
        let mut facets = Facets::default();
        for facet in xsd_children(step) {
            let Some(value) = facet.attribute("value") else {
                continue;
            };
            let count = || {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| self.at(facet, format!("invalid {} value '{value}'", facet.local_name)))
            };
            let digits = || {
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| self.at(facet, format!("invalid {} value '{value}'", facet.local_name)))
            };
            match facet.local_name.as_str() {
                "length" => facets.length = Some(count()?),
                "minLength" => facets.min_length = Some(count()?),
                "maxLength" => facets.max_length = Some(count()?),
                "totalDigits" => facets.total_digits = Some(digits()?),
                "fractionDigits" => facets.fraction_digits = Some(digits()?),
                "pattern" => facets.patterns.push(
                    compile_pattern(value)
                        .map_err(|e| self.at(facet, format!("invalid pattern '{value}': {e}")))?,
                ),
                "enumeration" => facets.enumeration.push(value.to_string()),
                "minInclusive" => facets.min_inclusive = Some(value.trim().to_string()),
                "maxInclusive" => facets.max_inclusive = Some(value.trim().to_string()),
                "minExclusive" => facets.min_exclusive = Some(value.trim().to_string()),
                "maxExclusive" => facets.max_exclusive = Some(value.trim().to_string()),
                "whiteSpace" => {
                    facets.white_space = Some(WhiteSpace::from_facet(value.trim()).ok_or_else(|| {
                        self.at(facet, format!("invalid whiteSpace value '{value}'"))
                    })?)
                }
                _ => {}
            }
        }
        Ok(facets)
    }
}

fn element_content(particle: Option<Particle>, mixed: bool) -> ContentType {
    match particle {
        Some(particle) => ContentType::Elements { particle, mixed },
        None if mixed => ContentType::Elements {
            particle: Particle { term: Term::empty(), occurs: Occurs::ONCE },
            mixed,
        },
        None => ContentType::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iso20022_core::parse_document;

    fn parse(xsd: &str) -> Result<SchemaDefinition, SchemaError> {
        let root = parse_document(xsd).unwrap();
        parse_definition("test.xsd", String::new(), &root)
    }

    const HEADER: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns="urn:test" targetNamespace="urn:test" elementFormDefault="qualified">"#;

    fn schema(body: &str) -> String {
        format!("{HEADER}{body}</xs:schema>")
    }

    #[test]
    fn global_components_are_collected() {
        let def = parse(&schema(
            r#"<xs:element name="Document" type="Document"/>
               <xs:complexType name="Document">
                 <xs:sequence>
                   <xs:element name="MsgId" type="Max35Text"/>
                   <xs:element name="Nb" type="xs:int" minOccurs="0" maxOccurs="unbounded"/>
                 </xs:sequence>
               </xs:complexType>
               <xs:simpleType name="Max35Text">
                 <xs:restriction base="xs:string">
                   <xs:minLength value="1"/>
                   <xs:maxLength value="35"/>
                 </xs:restriction>
               </xs:simpleType>"#,
        ))
        .unwrap();
        assert_eq!(def.target_namespace.as_deref(), Some("urn:test"));
        assert_eq!(def.component_count(), 3);

        let doc = &def.complex_types["Document"];
        let ContentType::Elements { particle, mixed: false } = &doc.content else {
            panic!("expected element content");
        };
        let Term::Sequence(items) = &particle.term else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].occurs, Occurs { min: 0, max: None });
        let Term::Element(msg_id) = &items[0].term else {
            panic!("expected element");
        };
        assert_eq!(msg_id.name, QualifiedName::new(Some("urn:test"), "MsgId"));

        let Variety::Restriction { facets, .. } = &def.simple_types["Max35Text"].variety else {
            panic!("expected restriction");
        };
        assert_eq!(facets.max_length, Some(35));
    }

    #[test]
    fn unqualified_locals_have_no_namespace() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:test">
            <xs:element name="Root"><xs:complexType><xs:sequence>
              <xs:element name="Child" type="xs:string"/>
            </xs:sequence></xs:complexType></xs:element></xs:schema>"#;
        let def = parse(xsd).unwrap();
        let root = &def.elements["Root"];
        assert_eq!(root.name.namespace.as_deref(), Some("urn:test"));
        let TypeRef::AnonymousComplex(ty) = &root.type_ref else {
            panic!("expected anonymous type");
        };
        let ContentType::Elements { particle, .. } = &ty.content else {
            panic!("expected element content");
        };
        let Term::Sequence(items) = &particle.term else {
            panic!("expected sequence");
        };
        let Term::Element(child) = &items[0].term else {
            panic!("expected element");
        };
        assert_eq!(child.name.namespace, None);
    }

    #[test]
    fn simple_content_extension_keeps_attributes() {
        let def = parse(&schema(
            r#"<xs:complexType name="ActiveCurrencyAndAmount">
                 <xs:simpleContent>
                   <xs:extension base="ActiveCurrencyAndAmount_SimpleType">
                     <xs:attribute name="Ccy" type="ActiveCurrencyCode" use="required"/>
                   </xs:extension>
                 </xs:simpleContent>
               </xs:complexType>"#,
        ))
        .unwrap();
        let ty = &def.complex_types["ActiveCurrencyAndAmount"];
        assert!(matches!(ty.content, ContentType::Simple { ref base, restriction: None } if base.local == "ActiveCurrencyAndAmount_SimpleType"));
        assert!(matches!(ty.attributes[0], AttributeUse::Local { required: true, .. }));
    }

    #[test]
    fn wildcards_resolve_namespace_tokens() {
        let def = parse(&schema(
            r###"<xs:complexType name="SupplementaryDataEnvelope1">
                 <xs:sequence>
                   <xs:any namespace="##any" processContents="lax"/>
                 </xs:sequence>
               </xs:complexType>
               <xs:complexType name="Other">
                 <xs:sequence>
                   <xs:any namespace="##targetNamespace ##local" processContents="skip"/>
                 </xs:sequence>
               </xs:complexType>"###,
        ))
        .unwrap();
        let ContentType::Elements { particle, .. } = &def.complex_types["Other"].content else {
            panic!("expected element content");
        };
        let Term::Sequence(items) = &particle.term else {
            panic!("expected sequence");
        };
        let Term::Any(wildcard) = &items[0].term else {
            panic!("expected wildcard");
        };
        assert_eq!(wildcard.process, ProcessContents::Skip);
        assert_eq!(
            wildcard.namespaces,
            NamespaceConstraint::List(vec![Some("urn:test".into()), None])
        );
    }

    #[test]
    fn rejects_non_schema_root() {
        let err = parse("<Document/>").unwrap_err();
        assert!(err.to_string().contains("is not xs:schema"));
    }

    #[test]
    fn rejects_bad_facets_and_builtins() {
        let bad_length = schema(
            r#"<xs:simpleType name="T"><xs:restriction base="xs:string">
                 <xs:maxLength value="many"/></xs:restriction></xs:simpleType>"#,
        );
        assert!(parse(&bad_length).unwrap_err().to_string().contains("invalid maxLength"));

        let bad_pattern = schema(
            r#"<xs:simpleType name="T"><xs:restriction base="xs:string">
                 <xs:pattern value="[A-Z"/></xs:restriction></xs:simpleType>"#,
        );
        assert!(parse(&bad_pattern).unwrap_err().to_string().contains("invalid pattern"));

        let bad_builtin = schema(r#"<xs:element name="E" type="xs:strung"/>"#);
        assert!(parse(&bad_builtin).unwrap_err().to_string().contains("unknown built-in"));

        let bad_occurs = schema(
            r#"<xs:complexType name="T"><xs:sequence>
                 <xs:element name="A" type="xs:string" minOccurs="2" maxOccurs="1"/>
               </xs:sequence></xs:complexType>"#,
        );
        assert!(parse(&bad_occurs).is_err());
    }

    #[test]
    fn rejects_duplicates_within_one_file() {
        let dup = schema(
            r#"<xs:element name="E" type="xs:string"/><xs:element name="E" type="xs:int"/>"#,
        );
        assert!(parse(&dup).unwrap_err().to_string().contains("declared twice"));

        let clash = schema(
            r#"<xs:simpleType name="T"><xs:restriction base="xs:string"/></xs:simpleType>
               <xs:complexType name="T"/>"#,
        );
        assert!(parse(&clash).is_err());
    }

    #[test]
    fn unprefixed_type_refs_use_default_namespace() {
        let def = parse(&schema(r#"<xs:element name="Document" type="Document"/>"#)).unwrap();
        let TypeRef::Named(name) = &def.elements["Document"].type_ref else {
            panic!("expected named type");
        };
        assert_eq!(name, &QualifiedName::new(Some("urn:test"), "Document"));
    }
}
