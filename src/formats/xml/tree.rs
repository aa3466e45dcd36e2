//! Namespace-resolved element tree built from quick-xml events.
//!
//! Every element and attribute name is resolved to (namespace URI, local
//! name) while reading, so the mapping code never looks at prefixes. The
//! spelling details the encoder may want to replay (prefix, namespace
//! declarations, attribute order, preceding comments, CDATA) are kept on
//! the element next to the resolved names.

use super::XML_NS;
use crate::errors::ConverterError;
use crate::fidelity::{NamespaceDecl, XmlFidelity, XmlNodeMeta};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, PrefixDeclaration, ResolveResult};
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub local_name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub namespace: Option<String>,
    pub local_name: String,
    pub prefix: Option<String>,
    pub attributes: Vec<Attribute>,
    pub namespace_decls: Vec<NamespaceDecl>,
    /// Attribute keys as written, in source order. `xml:lang` is left out.
    pub attribute_order: Vec<String>,
    /// Namespaced attributes other than `xml:lang`, as (qualified name, value).
    pub qualified_attributes: Vec<(String, String)>,
    /// Value of `xml:lang`, if present.
    pub lang: Option<String>,
    pub leading_comments: Vec<String>,
    pub trailing_comments: Vec<String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name == local_name
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(
        &'a self,
        namespace: &str,
        local_name: &str,
    ) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is(namespace, local_name))
    }

    /// Concatenated character data of the direct children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(_) => {}
            }
        }
        out
    }

    pub fn has_cdata(&self) -> bool {
        self.children.iter().any(|n| matches!(n, Node::CData(_)))
    }

    /// Value of an attribute that is not in any namespace.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// The element's name as written in the source.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Spelling details worth replaying on output.
    pub fn meta(&self) -> XmlNodeMeta {
        XmlNodeMeta {
            prefix: self.prefix.clone(),
            namespace_decls: self.namespace_decls.clone(),
            attribute_order: self.attribute_order.clone(),
            extra_attributes: self.qualified_attributes.clone(),
            leading_comments: self.leading_comments.clone(),
            trailing_comments: self.trailing_comments.clone(),
            cdata_text: self.has_cdata(),
        }
    }

    pub fn fidelity(&self) -> XmlFidelity {
        XmlFidelity::from_meta(self.meta())
    }
}

/// Reads one complete XML document into a tree.
pub fn parse_document<R: BufRead>(input: R) -> Result<Element, ConverterError> {
    let mut reader = NsReader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut pending_comments: Vec<String> = Vec::new();

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            ConverterError::parse(
                format!("{} (byte {})", path_of(&stack), position),
                format!("malformed XML: {}", e),
            )
        })?;

        match event {
            Event::Start(start) => {
                let element = open_element(&reader, &start, &mut pending_comments, &stack)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, &start, &mut pending_comments, &stack)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let mut element = stack.pop().ok_or_else(|| {
                    ConverterError::parse(
                        format!("byte {}", position),
                        "closing tag without an open element",
                    )
                })?;
                element.trailing_comments = std::mem::take(&mut pending_comments);
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| {
                    ConverterError::parse(path_of(&stack), format!("invalid character data: {}", e))
                })?;
                match stack.last_mut() {
                    Some(parent) => {
                        if !value.trim().is_empty() {
                            pending_comments.clear();
                        }
                        parent.children.push(Node::Text(value.into_owned()));
                    }
                    None if value.trim().is_empty() => {}
                    None => {
                        return Err(ConverterError::parse(
                            "document",
                            "character data outside the root element",
                        ));
                    }
                }
            }
            Event::CData(cdata) => {
                let value = utf8(&cdata, &stack)?.to_string();
                let Some(parent) = stack.last_mut() else {
                    return Err(ConverterError::parse(
                        "document",
                        "CDATA section outside the root element",
                    ));
                };
                pending_comments.clear();
                parent.children.push(Node::CData(value));
            }
            Event::Comment(comment) => {
                pending_comments.push(utf8(&comment, &stack)?.to_string());
            }
            Event::Eof => break,
            // declaration, processing instructions, doctype
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ConverterError::parse(
            path_of(&stack),
            "unexpected end of document",
        ));
    }
    root.ok_or_else(|| ConverterError::parse("document", "document has no root element"))
}

fn open_element<R>(
    reader: &NsReader<R>,
    start: &BytesStart,
    pending_comments: &mut Vec<String>,
    stack: &[Element],
) -> Result<Element, ConverterError> {
    let (ns, local) = reader.resolve_element(start.name());
    let local_name = utf8(local.as_ref(), stack)?.to_string();
    let location = format!("{}/{}", path_of(stack), local_name);
    let namespace = namespace_uri(ns, &location)?;
    let prefix = match start.name().prefix() {
        Some(p) => Some(utf8(p.as_ref(), stack)?.to_string()),
        None => None,
    };

    let mut element = Element {
        namespace,
        local_name,
        prefix,
        attributes: Vec::new(),
        namespace_decls: Vec::new(),
        attribute_order: Vec::new(),
        qualified_attributes: Vec::new(),
        lang: None,
        leading_comments: std::mem::take(pending_comments),
        trailing_comments: Vec::new(),
        children: Vec::new(),
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            ConverterError::parse(&location, format!("malformed attribute: {}", e))
        })?;
        let value = attr
            .unescape_value()
            .map_err(|e| ConverterError::parse(&location, format!("invalid attribute value: {}", e)))?
            .into_owned();

        if let Some(binding) = attr.key.as_namespace_binding() {
            let prefix = match binding {
                PrefixDeclaration::Default => None,
                PrefixDeclaration::Named(p) => Some(utf8(p, stack)?.to_string()),
            };
            let decl = NamespaceDecl { prefix, uri: value };
            element.attribute_order.push(decl.attribute_key());
            element.namespace_decls.push(decl);
            continue;
        }

        if attr.key.as_ref() == b"xml:lang" {
            element.lang = Some(value);
            continue;
        }

        let (ns, local) = reader.resolve_attribute(attr.key);
        let namespace = match ns {
            ResolveResult::Unknown(p) if p == b"xml" => Some(XML_NS.to_string()),
            other => namespace_uri(other, &location)?,
        };
        let local_name = utf8(local.as_ref(), stack)?.to_string();
        if namespace.is_none() {
            element.attribute_order.push(local_name.clone());
        } else {
            let qualified = utf8(attr.key.as_ref(), stack)?.to_string();
            element.attribute_order.push(qualified.clone());
            element.qualified_attributes.push((qualified, value.clone()));
        }
        element.attributes.push(Attribute {
            namespace,
            local_name,
            value,
        });
    }

    Ok(element)
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ConverterError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(ConverterError::parse(
            element.qualified_name(),
            "document has more than one root element",
        )),
    }
}

fn namespace_uri(result: ResolveResult, location: &str) -> Result<Option<String>, ConverterError> {
    match result {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ConverterError::parse(
            location,
            format!(
                "undeclared namespace prefix '{}'",
                String::from_utf8_lossy(&prefix)
            ),
        )),
    }
}

fn utf8<'a>(bytes: &'a [u8], stack: &[Element]) -> Result<&'a str, ConverterError> {
    std::str::from_utf8(bytes)
        .map_err(|e| ConverterError::parse(path_of(stack), format!("invalid UTF-8: {}", e)))
}

fn path_of(stack: &[Element]) -> String {
    if stack.is_empty() {
        return "document".to_string();
    }
    stack
        .iter()
        .map(|e| e.local_name.as_str())
        .collect::<Vec<_>>()
        .join("/")
}
