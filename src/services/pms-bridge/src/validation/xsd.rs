//! Structural XSD validation
//!
//! Compiles the commonly used part of XML Schema 1.0 into owned declarations and checks
//! documents against it, stopping at the first violation in document order.
//!
//! Supported: global and local `element` (with `ref`, `minOccurs`, `maxOccurs`), named
//! and anonymous `complexType` with `sequence` / `choice` / `all`, nested `sequence`
//! inside `sequence`, `any`, `attribute` (`use="required"`), `anyAttribute`, `mixed`,
//! `simpleContent` extension, named and anonymous `simpleType` restrictions with
//! `enumeration`, `pattern`, `length`, `minLength`, `maxLength`, `minInclusive` and
//! `maxInclusive` facets, and the common built-in datatypes.
//!
//! Names are matched by local name; target namespaces are not enforced. `import`,
//! `include` and global `attribute` declarations are ignored. Anything else (groups,
//! `complexContent`, lists, unions, nested `choice`) is rejected when the schema is
//! compiled.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use roxmltree::{Document, Node};
use std::collections::HashMap;

const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const MAX_TYPE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    AnyType,
    AnySimpleType,
    String,
    Boolean,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Decimal,
    Date,
    DateTime,
    Time,
}

impl Builtin {
    fn from_local(name: &str) -> Self {
        match name {
            "anyType" => Builtin::AnyType,
            "anySimpleType" => Builtin::AnySimpleType,
            "boolean" => Builtin::Boolean,
            "integer" | "int" | "long" | "short" | "byte" | "negativeInteger"
            | "nonPositiveInteger" => Builtin::Integer,
            "nonNegativeInteger" | "unsignedInt" | "unsignedLong" | "unsignedShort"
            | "unsignedByte" => Builtin::NonNegativeInteger,
            "positiveInteger" => Builtin::PositiveInteger,
            "decimal" | "float" | "double" => Builtin::Decimal,
            "date" => Builtin::Date,
            "dateTime" => Builtin::DateTime,
            "time" => Builtin::Time,
            _ => Builtin::String,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Builtin::AnyType => "anyType",
            Builtin::AnySimpleType => "anySimpleType",
            Builtin::String => "string",
            Builtin::Boolean => "boolean",
            Builtin::Integer => "integer",
            Builtin::NonNegativeInteger => "nonNegativeInteger",
            Builtin::PositiveInteger => "positiveInteger",
            Builtin::Decimal => "decimal",
            Builtin::Date => "date",
            Builtin::DateTime => "dateTime",
            Builtin::Time => "time",
        }
    }

    fn accepts(self, raw: &str) -> bool {
        let value = raw.trim();
        match self {
            Builtin::AnyType | Builtin::AnySimpleType | Builtin::String => true,
            Builtin::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Builtin::Integer => value.parse::<i128>().is_ok(),
            Builtin::NonNegativeInteger => value.parse::<i128>().map_or(false, |v| v >= 0),
            Builtin::PositiveInteger => value.parse::<i128>().map_or(false, |v| v > 0),
            Builtin::Decimal => {
                !value.is_empty()
                    && value.parse::<f64>().is_ok()
                    && !value.eq_ignore_ascii_case("nan")
                    && !value.to_ascii_lowercase().contains("inf")
            }
            Builtin::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            Builtin::DateTime => {
                DateTime::parse_from_rfc3339(value).is_ok()
                    || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
            }
            Builtin::Time => NaiveTime::parse_from_str(value, "%H:%M:%S%.f").is_ok(),
        }
    }
}

#[derive(Debug, Clone)]
enum TypeRef {
    Builtin(Builtin),
    Named(String),
    Complex(Box<ComplexType>),
    Simple(Box<SimpleType>),
}

impl TypeRef {
    fn label(&self) -> String {
        match self {
            TypeRef::Builtin(builtin) => builtin.label().to_string(),
            TypeRef::Named(name) => name.clone(),
            TypeRef::Complex(_) => "anonymous complex type".to_string(),
            TypeRef::Simple(_) => "anonymous simple type".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Occurs {
    min: u32,
    max: Option<u32>,
}

impl Occurs {
    fn allows_more(&self, count: u32) -> bool {
        self.max.map_or(true, |max| count < max)
    }
}

#[derive(Debug, Clone)]
struct ElementDecl {
    name: String,
    ty: TypeRef,
}

#[derive(Debug, Clone)]
enum Particle {
    Element { decl: ElementDecl, occurs: Occurs },
    Ref { name: String, occurs: Occurs },
    Any { occurs: Occurs },
}

impl Particle {
    fn occurs(&self) -> Occurs {
        match self {
            Particle::Element { occurs, .. }
            | Particle::Ref { occurs, .. }
            | Particle::Any { occurs } => *occurs,
        }
    }

    fn name(&self) -> &str {
        match self {
            Particle::Element { decl, .. } => &decl.name,
            Particle::Ref { name, .. } => name,
            Particle::Any { .. } => "any",
        }
    }

    fn matches(&self, local_name: &str) -> bool {
        match self {
            Particle::Element { decl, .. } => decl.name == local_name,
            Particle::Ref { name, .. } => name == local_name,
            Particle::Any { .. } => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compositor {
    Sequence,
    Choice,
    All,
}

#[derive(Debug, Clone)]
struct AttributeDecl {
    name: String,
    required: bool,
    ty: TypeRef,
}

#[derive(Debug, Clone)]
struct ComplexType {
    compositor: Compositor,
    particles: Vec<Particle>,
    attributes: Vec<AttributeDecl>,
    any_attribute: bool,
    mixed: bool,
    simple_content: Option<TypeRef>,
}

impl Default for ComplexType {
    fn default() -> Self {
        Self {
            compositor: Compositor::Sequence,
            particles: Vec::new(),
            attributes: Vec::new(),
            any_attribute: false,
            mixed: false,
            simple_content: None,
        }
    }
}

#[derive(Debug, Clone)]
struct SimpleType {
    base: TypeRef,
    enumeration: Vec<String>,
    patterns: Vec<Regex>,
    length: Option<usize>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min_inclusive: Option<f64>,
    max_inclusive: Option<f64>,
}

enum Resolved<'s> {
    Any,
    Simple(&'s TypeRef),
    Complex(&'s ComplexType),
}

/// A compiled XSD
#[derive(Debug, Clone)]
pub struct XsdSchema {
    elements: HashMap<String, ElementDecl>,
    complex_types: HashMap<String, ComplexType>,
    simple_types: HashMap<String, TypeRef>,
}

impl XsdSchema {
    /// Compile schema text
    pub fn parse(xsd: &str) -> Result<Self, String> {
        let doc = Document::parse(xsd).map_err(|e| e.to_string())?;
        let root = doc.root_element();
        if !is_xs(&root, "schema") {
            return Err("The schema root element must be xs:schema".to_string());
        }

        let mut schema = XsdSchema {
            elements: HashMap::new(),
            complex_types: HashMap::new(),
            simple_types: HashMap::new(),
        };

        for child in xs_children(&root) {
            match child.tag_name().name() {
                "element" => {
                    let decl = parse_element_decl(&child)?;
                    schema.elements.insert(decl.name.clone(), decl);
                }
                "complexType" => {
                    let name = required_attr(&child, "name")?;
                    schema
                        .complex_types
                        .insert(name.to_string(), parse_complex_type(&child)?);
                }
                "simpleType" => {
                    let name = required_attr(&child, "name")?;
                    schema.simple_types.insert(
                        name.to_string(),
                        TypeRef::Simple(Box::new(parse_simple_type(&child)?)),
                    );
                }
                "annotation" | "import" | "include" | "attribute" => {}
                other => return Err(unsupported(other)),
            }
        }

        Ok(schema)
    }

    /// Validate a parsed document, returning the first violation
    pub fn validate(&self, doc: &Document) -> Result<(), String> {
        let root = doc.root_element();
        let name = root.tag_name().name();
        let decl = self
            .elements
            .get(name)
            .ok_or_else(|| format!("The '{}' element is not declared.", name))?;
        self.validate_element(&root, decl)
    }

    fn resolve<'s>(&'s self, ty: &'s TypeRef) -> Result<Resolved<'s>, String> {
        match ty {
            TypeRef::Builtin(Builtin::AnyType) => Ok(Resolved::Any),
            TypeRef::Builtin(_) | TypeRef::Simple(_) => Ok(Resolved::Simple(ty)),
            TypeRef::Complex(complex) => Ok(Resolved::Complex(complex)),
            TypeRef::Named(name) => {
                if let Some(complex) = self.complex_types.get(name) {
                    Ok(Resolved::Complex(complex))
                } else if let Some(simple) = self.simple_types.get(name) {
                    Ok(Resolved::Simple(simple))
                } else {
                    Err(format!("Type '{}' is not declared.", name))
                }
            }
        }
    }

    fn validate_element(&self, node: &Node, decl: &ElementDecl) -> Result<(), String> {
        match self.resolve(&decl.ty)? {
            Resolved::Any => Ok(()),
            Resolved::Simple(simple) => {
                if let Some(child) = node.children().find(|c| c.is_element()) {
                    return Err(format!(
                        "The element '{}' cannot contain child element '{}' because the parent element's content model is text only.",
                        decl.name,
                        child.tag_name().name()
                    ));
                }
                let value = text_content(node);
                self.check_value(simple, &value, 0).map_err(|reason| {
                    format!(
                        "The '{}' element is invalid - The value '{}' is invalid according to its datatype '{}' - {}",
                        decl.name,
                        value,
                        decl.ty.label(),
                        reason
                    )
                })
            }
            Resolved::Complex(complex) => self.validate_complex(node, &decl.name, complex),
        }
    }

    fn validate_complex(
        &self,
        node: &Node,
        name: &str,
        complex: &ComplexType,
    ) -> Result<(), String> {
        for attr in &complex.attributes {
            if attr.required && node.attribute(attr.name.as_str()).is_none() {
                return Err(format!("The required attribute '{}' is missing.", attr.name));
            }
        }

        for attr in node.attributes() {
            if attr.namespace() == Some(XSI_NS) {
                continue;
            }
            match complex.attributes.iter().find(|a| a.name == attr.name()) {
                Some(decl) => {
                    self.check_value(&decl.ty, attr.value(), 0).map_err(|reason| {
                        format!(
                            "The '{}' attribute is invalid - The value '{}' is invalid according to its datatype '{}' - {}",
                            attr.name(),
                            attr.value(),
                            decl.ty.label(),
                            reason
                        )
                    })?;
                }
                None if complex.any_attribute => {}
                None => return Err(format!("The '{}' attribute is not declared.", attr.name())),
            }
        }

        let children: Vec<Node> = node.children().filter(|c| c.is_element()).collect();

        if let Some(base) = &complex.simple_content {
            if let Some(child) = children.first() {
                return Err(format!(
                    "The element '{}' cannot contain child element '{}' because the parent element's content model is text only.",
                    name,
                    child.tag_name().name()
                ));
            }
            let value = text_content(node);
            return self.check_value(base, &value, 0).map_err(|reason| {
                format!(
                    "The '{}' element is invalid - The value '{}' is invalid according to its datatype '{}' - {}",
                    name,
                    value,
                    base.label(),
                    reason
                )
            });
        }

        if !complex.mixed
            && node
                .children()
                .any(|c| c.is_text() && !c.text().unwrap_or("").trim().is_empty())
        {
            return Err(format!(
                "The element '{}' cannot contain text. Content model is element-only.",
                name
            ));
        }

        match complex.compositor {
            Compositor::Sequence => self.validate_sequence(name, &complex.particles, &children),
            Compositor::Choice => self.validate_choice(name, &complex.particles, &children),
            Compositor::All => self.validate_all(name, &complex.particles, &children),
        }
    }

    fn validate_sequence(
        &self,
        parent: &str,
        particles: &[Particle],
        children: &[Node],
    ) -> Result<(), String> {
        let mut index = 0;
        for (position, particle) in particles.iter().enumerate() {
            let occurs = particle.occurs();
            let mut count = 0;
            while index < children.len()
                && occurs.allows_more(count)
                && particle.matches(children[index].tag_name().name())
            {
                self.validate_particle(particle, &children[index])?;
                count += 1;
                index += 1;
            }

            if count < occurs.min {
                let expected = particle.name();
                return Err(match children.get(index) {
                    Some(child) => format!(
                        "The element '{}' has invalid child element '{}'. List of possible elements expected: '{}'.",
                        parent,
                        child.tag_name().name(),
                        expected
                    ),
                    None => format!(
                        "The element '{}' has incomplete content. List of possible elements expected: '{}'.",
                        parent, expected
                    ),
                });
            }

            if index >= children.len() {
                // Remaining particles must all be optional
                if let Some(missing) = particles[position + 1..]
                    .iter()
                    .find(|p| p.occurs().min > 0)
                {
                    return Err(format!(
                        "The element '{}' has incomplete content. List of possible elements expected: '{}'.",
                        parent,
                        missing.name()
                    ));
                }
                return Ok(());
            }
        }

        match children.get(index) {
            Some(child) => Err(format!(
                "The element '{}' has invalid child element '{}'.",
                parent,
                child.tag_name().name()
            )),
            None => Ok(()),
        }
    }

    fn validate_choice(
        &self,
        parent: &str,
        particles: &[Particle],
        children: &[Node],
    ) -> Result<(), String> {
        let expected = particles
            .iter()
            .map(Particle::name)
            .collect::<Vec<_>>()
            .join("', '");

        let Some(first) = children.first() else {
            if particles.is_empty() || particles.iter().any(|p| p.occurs().min == 0) {
                return Ok(());
            }
            return Err(format!(
                "The element '{}' has incomplete content. List of possible elements expected: '{}'.",
                parent, expected
            ));
        };

        let Some(particle) = particles
            .iter()
            .find(|p| p.matches(first.tag_name().name()))
        else {
            return Err(format!(
                "The element '{}' has invalid child element '{}'. List of possible elements expected: '{}'.",
                parent,
                first.tag_name().name(),
                expected
            ));
        };

        let occurs = particle.occurs();
        let mut count = 0;
        let mut index = 0;
        while index < children.len()
            && occurs.allows_more(count)
            && particle.matches(children[index].tag_name().name())
        {
            self.validate_particle(particle, &children[index])?;
            count += 1;
            index += 1;
        }

        if count < occurs.min {
            return Err(format!(
                "The element '{}' has incomplete content. List of possible elements expected: '{}'.",
                parent,
                particle.name()
            ));
        }

        match children.get(index) {
            Some(child) => Err(format!(
                "The element '{}' has invalid child element '{}'.",
                parent,
                child.tag_name().name()
            )),
            None => Ok(()),
        }
    }

    fn validate_all(
        &self,
        parent: &str,
        particles: &[Particle],
        children: &[Node],
    ) -> Result<(), String> {
        let mut seen = vec![0u32; particles.len()];
        for child in children {
            let local = child.tag_name().name();
            let position = particles
                .iter()
                .position(|p| p.matches(local))
                .filter(|&i| particles[i].occurs().allows_more(seen[i]))
                .ok_or_else(|| {
                    format!(
                        "The element '{}' has invalid child element '{}'.",
                        parent, local
                    )
                })?;
            self.validate_particle(&particles[position], child)?;
            seen[position] += 1;
        }

        for (particle, count) in particles.iter().zip(seen) {
            if count < particle.occurs().min {
                return Err(format!(
                    "The element '{}' has incomplete content. List of possible elements expected: '{}'.",
                    parent,
                    particle.name()
                ));
            }
        }
        Ok(())
    }

    fn validate_particle(&self, particle: &Particle, child: &Node) -> Result<(), String> {
        match particle {
            Particle::Element { decl, .. } => self.validate_element(child, decl),
            Particle::Ref { name, .. } => {
                let decl = self
                    .elements
                    .get(name)
                    .ok_or_else(|| format!("The '{}' element is not declared.", name))?;
                self.validate_element(child, decl)
            }
            Particle::Any { .. } => Ok(()),
        }
    }

    /// Check a text value against a simple type; the error is the failed constraint
    fn check_value(&self, ty: &TypeRef, value: &str, depth: usize) -> Result<(), String> {
        if depth > MAX_TYPE_DEPTH {
            return Err("Type derivation is too deep.".to_string());
        }

        match ty {
            TypeRef::Builtin(builtin) => {
                if builtin.accepts(value) {
                    Ok(())
                } else {
                    Err(format!(
                        "The string '{}' is not a valid {} value.",
                        value.trim(),
                        builtin.label()
                    ))
                }
            }
            TypeRef::Named(name) => match self.simple_types.get(name) {
                Some(simple) => self.check_value(simple, value, depth + 1),
                None if self.complex_types.contains_key(name) => {
                    Err(format!("Type '{}' is not a simple type.", name))
                }
                None => Err(format!("Type '{}' is not declared.", name)),
            },
            TypeRef::Complex(_) => Err("A complex type cannot hold a text value.".to_string()),
            TypeRef::Simple(simple) => {
                self.check_value(&simple.base, value, depth + 1)?;
                check_facets(simple, value)
            }
        }
    }
}

fn check_facets(simple: &SimpleType, value: &str) -> Result<(), String> {
    if !simple.enumeration.is_empty()
        && !simple
            .enumeration
            .iter()
            .any(|allowed| allowed == value || allowed == value.trim())
    {
        return Err("The Enumeration constraint failed.".to_string());
    }

    if !simple.patterns.is_empty() && !simple.patterns.iter().any(|p| p.is_match(value)) {
        return Err("The Pattern constraint failed.".to_string());
    }

    let length = value.chars().count();
    if simple.length.map_or(false, |expected| length != expected) {
        return Err("The actual length is not equal to the specified length.".to_string());
    }
    if simple.min_length.map_or(false, |min| length < min) {
        return Err("The actual length is less than the MinLength value.".to_string());
    }
    if simple.max_length.map_or(false, |max| length > max) {
        return Err("The actual length is greater than the MaxLength value.".to_string());
    }

    if simple.min_inclusive.is_some() || simple.max_inclusive.is_some() {
        let number: f64 = value
            .trim()
            .parse()
            .map_err(|_| "The value is not numeric.".to_string())?;
        if simple.min_inclusive.map_or(false, |min| number < min) {
            return Err("The MinInclusive constraint failed.".to_string());
        }
        if simple.max_inclusive.map_or(false, |max| number > max) {
            return Err("The MaxInclusive constraint failed.".to_string());
        }
    }

    Ok(())
}

fn is_xs(node: &Node, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local && node.tag_name().namespace() == Some(XS_NS)
}

fn xs_children<'a, 'input>(node: &Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().namespace() == Some(XS_NS))
}

fn required_attr<'a>(node: &Node<'a, '_>, name: &str) -> Result<&'a str, String> {
    node.attribute(name).ok_or_else(|| {
        format!(
            "The xs:{} declaration is missing the '{}' attribute.",
            node.tag_name().name(),
            name
        )
    })
}

fn unsupported(construct: &str) -> String {
    format!("Unsupported XSD construct 'xs:{}'.", construct)
}

fn type_from_qname(node: &Node, qname: &str) -> TypeRef {
    let (prefix, local) = match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    };
    if node.lookup_namespace_uri(prefix) == Some(XS_NS) {
        TypeRef::Builtin(Builtin::from_local(local))
    } else {
        TypeRef::Named(local.to_string())
    }
}

fn parse_occurs(node: &Node) -> Result<Occurs, String> {
    let min = match node.attribute("minOccurs") {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid minOccurs value '{}'.", raw))?,
        None => 1,
    };
    let max = match node.attribute("maxOccurs") {
        Some("unbounded") => None,
        Some(raw) => Some(
            raw.trim()
                .parse()
                .map_err(|_| format!("Invalid maxOccurs value '{}'.", raw))?,
        ),
        None => Some(1),
    };
    if max.map_or(false, |max| max < min) {
        return Err(format!(
            "maxOccurs must not be less than minOccurs on '{}'.",
            node.attribute("name").or(node.attribute("ref")).unwrap_or("element")
        ));
    }
    Ok(Occurs { min, max })
}

/// Type of an element or attribute: `type` attribute, inline type, or the default
fn parse_type_of(node: &Node, default: TypeRef) -> Result<TypeRef, String> {
    if let Some(qname) = node.attribute("type") {
        return Ok(type_from_qname(node, qname));
    }
    for child in xs_children(node) {
        match child.tag_name().name() {
            "complexType" => return Ok(TypeRef::Complex(Box::new(parse_complex_type(&child)?))),
            "simpleType" => return Ok(TypeRef::Simple(Box::new(parse_simple_type(&child)?))),
            _ => {}
        }
    }
    Ok(default)
}

fn parse_element_decl(node: &Node) -> Result<ElementDecl, String> {
    let name = required_attr(node, "name")?.to_string();
    let ty = parse_type_of(node, TypeRef::Builtin(Builtin::AnyType))?;
    Ok(ElementDecl { name, ty })
}

fn parse_particle(node: &Node) -> Result<Particle, String> {
    let occurs = parse_occurs(node)?;
    if let Some(reference) = node.attribute("ref") {
        let name = reference
            .split_once(':')
            .map_or(reference, |(_, local)| local)
            .to_string();
        return Ok(Particle::Ref { name, occurs });
    }
    Ok(Particle::Element {
        decl: parse_element_decl(node)?,
        occurs,
    })
}

fn parse_model(node: &Node, compositor: Compositor) -> Result<Vec<Particle>, String> {
    let mut particles = Vec::new();
    for child in xs_children(node) {
        match child.tag_name().name() {
            "element" => particles.push(parse_particle(&child)?),
            "any" => particles.push(Particle::Any {
                occurs: parse_occurs(&child)?,
            }),
            "sequence" if compositor == Compositor::Sequence => {
                if parse_occurs(&child)? != (Occurs { min: 1, max: Some(1) }) {
                    return Err("Repeated nested xs:sequence is not supported.".to_string());
                }
                particles.extend(parse_model(&child, Compositor::Sequence)?);
            }
            "annotation" => {}
            other => return Err(unsupported(other)),
        }
    }
    Ok(particles)
}

fn parse_attribute(node: &Node) -> Result<AttributeDecl, String> {
    let name = required_attr(node, "name")?.to_string();
    let required = node.attribute("use") == Some("required");
    let ty = parse_type_of(node, TypeRef::Builtin(Builtin::AnySimpleType))?;
    Ok(AttributeDecl { name, required, ty })
}

fn parse_complex_type(node: &Node) -> Result<ComplexType, String> {
    let mut complex = ComplexType {
        mixed: node.attribute("mixed") == Some("true"),
        ..ComplexType::default()
    };

    for child in xs_children(node) {
        match child.tag_name().name() {
            "sequence" => {
                complex.compositor = Compositor::Sequence;
                complex.particles = parse_model(&child, Compositor::Sequence)?;
            }
            "choice" => {
                complex.compositor = Compositor::Choice;
                complex.particles = parse_model(&child, Compositor::Choice)?;
            }
            "all" => {
                complex.compositor = Compositor::All;
                complex.particles = parse_model(&child, Compositor::All)?;
            }
            "attribute" => complex.attributes.push(parse_attribute(&child)?),
            "anyAttribute" => complex.any_attribute = true,
            "simpleContent" => parse_simple_content(&child, &mut complex)?,
            "annotation" => {}
            other => return Err(unsupported(other)),
        }
    }

    Ok(complex)
}

fn parse_simple_content(node: &Node, complex: &mut ComplexType) -> Result<(), String> {
    for child in xs_children(node) {
        match child.tag_name().name() {
            "extension" => {
                let base = required_attr(&child, "base")?;
                complex.simple_content = Some(type_from_qname(&child, base));
                for item in xs_children(&child) {
                    match item.tag_name().name() {
                        "attribute" => complex.attributes.push(parse_attribute(&item)?),
                        "anyAttribute" => complex.any_attribute = true,
                        "annotation" => {}
                        other => return Err(unsupported(other)),
                    }
                }
            }
            "annotation" => {}
            other => return Err(unsupported(other)),
        }
    }
    Ok(())
}

fn parse_simple_type(node: &Node) -> Result<SimpleType, String> {
    let restriction = xs_children(node)
        .find(|c| c.tag_name().name() != "annotation")
        .ok_or_else(|| "An xs:simpleType must contain a restriction.".to_string())?;
    if restriction.tag_name().name() != "restriction" {
        return Err(unsupported(restriction.tag_name().name()));
    }

    let base = match restriction.attribute("base") {
        Some(qname) => type_from_qname(&restriction, qname),
        None => TypeRef::Builtin(Builtin::AnySimpleType),
    };

    let mut simple = SimpleType {
        base,
        enumeration: Vec::new(),
        patterns: Vec::new(),
        length: None,
        min_length: None,
        max_length: None,
        min_inclusive: None,
        max_inclusive: None,
    };

    for facet in xs_children(&restriction) {
        let facet_name = facet.tag_name().name();
        if facet_name == "annotation" {
            continue;
        }
        let value = required_attr(&facet, "value")?;
        match facet_name {
            "enumeration" => simple.enumeration.push(value.to_string()),
            "pattern" => {
                let pattern = Regex::new(&format!("^(?:{})$", value))
                    .map_err(|e| format!("Invalid pattern facet '{}': {}", value, e))?;
                simple.patterns.push(pattern);
            }
            "length" => simple.length = Some(parse_facet_number(facet_name, value)?),
            "minLength" => simple.min_length = Some(parse_facet_number(facet_name, value)?),
            "maxLength" => simple.max_length = Some(parse_facet_number(facet_name, value)?),
            "minInclusive" => simple.min_inclusive = Some(parse_facet_number(facet_name, value)?),
            "maxInclusive" => simple.max_inclusive = Some(parse_facet_number(facet_name, value)?),
            "whiteSpace" => {}
            other => return Err(unsupported(other)),
        }
    }

    Ok(simple)
}

fn parse_facet_number<T: std::str::FromStr>(facet: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid value '{}' for facet xs:{}.", value, facet))
}

fn text_content(node: &Node) -> String {
    node.children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect()
}
