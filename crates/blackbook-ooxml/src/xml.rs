//! Lossless XML tree for package parts
//!
//! Template parts are edited in place, so everything the editor does not
//! understand (bookmarks, content controls, drawings, section properties)
//! must survive a parse/serialize cycle untouched. This module keeps a small
//! owned element tree: elements with ordered attributes and children, text
//! (stored unescaped), and raw nodes (comments, CDATA, processing
//! instructions) that are written back verbatim.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// A node in the XML tree
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// An element with attributes and children
    Element(XmlElement),
    /// Character data (unescaped)
    Text(String),
    /// Markup kept verbatim (comments, CDATA sections, processing instructions)
    Raw(String),
}

/// An XML element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

/// A parsed XML part: everything before the root element plus the root itself
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Declaration, doctype and whitespace preceding the root, verbatim
    pub prolog: String,
    /// The root element
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse a complete XML part
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // Whitespace inside runs is significant
        reader.config_mut().trim_text(false);

        let mut prolog = String::new();
        let mut root: Option<XmlElement> = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let start = reader.buffer_position() as usize;
            let event = reader.read_event_into(&mut buf)?;
            let end = reader.buffer_position() as usize;
            let raw = || String::from_utf8_lossy(&xml[start..end.min(xml.len())]).into_owned();

            match event {
                Event::Start(ref e) => {
                    stack.push(element_from_start(e)?);
                }
                Event::Empty(ref e) => {
                    let element = element_from_start(e)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        OoxmlError::InvalidStructure("unbalanced closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::Text(ref e) => {
                    if stack.is_empty() {
                        if root.is_none() {
                            prolog.push_str(&raw());
                        }
                    } else {
                        let text = e.unescape()?.into_owned();
                        attach(&mut stack, &mut root, XmlNode::Text(text))?;
                    }
                }
                Event::CData(_) | Event::Comment(_) | Event::PI(_) => {
                    if stack.is_empty() {
                        if root.is_none() {
                            prolog.push_str(&raw());
                        }
                    } else {
                        attach(&mut stack, &mut root, XmlNode::Raw(raw()))?;
                    }
                }
                Event::Decl(_) | Event::DocType(_) => {
                    if root.is_none() {
                        prolog.push_str(&raw());
                    }
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OoxmlError::InvalidStructure(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }

        let root =
            root.ok_or_else(|| OoxmlError::InvalidStructure("missing root element".to_string()))?;
        Ok(Self { prolog, root })
    }

    /// Serialize the part back to XML text
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(self.prolog.len() + 4096);
        out.push_str(&self.prolog);
        self.root.write_to(&mut out);
        out
    }
}

/// Parse a standalone element from a string (used for generated markup)
pub fn parse_fragment(xml: &str) -> Result<XmlElement> {
    XmlDocument::parse(xml.as_bytes()).map(|doc| doc.root)
}

fn element_from_start(e: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(element) if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        XmlNode::Element(element) => Err(OoxmlError::InvalidStructure(format!(
            "second root element <{}>",
            element.name
        ))),
        // Trailing whitespace or comments after the root are dropped
        _ => Ok(()),
    }
}

impl XmlElement {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder: append a child element
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: append a text node
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Local part of the element name (`p` for `w:p`)
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Check the local name
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Look up an attribute by qualified name, falling back to its local part
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| {
                let local = local_part(name);
                self.attrs.iter().find(|(k, _)| local_part(k) == local)
            })
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute by qualified name
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    /// Iterate over child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    /// First child element with the given local name, mutably
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(e) if e.is(local) => Some(e),
            _ => None,
        })
    }

    /// Return the child with `qname`'s local name, inserting it if missing.
    ///
    /// `order` lists local names in schema sequence; a new child goes in
    /// front of the first existing sibling that sorts after it. Names absent
    /// from `order` are appended.
    pub fn ensure_child(&mut self, qname: &str, order: &[&str]) -> &mut XmlElement {
        let local = local_part(qname);
        let existing = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(local)));

        let index = match existing {
            Some(index) => index,
            None => {
                let rank = order.iter().position(|n| *n == local);
                let insert_at = rank
                    .and_then(|rank| {
                        self.children.iter().position(|node| match node {
                            XmlNode::Element(e) => order
                                .iter()
                                .position(|n| *n == e.local_name())
                                .is_some_and(|other| other > rank),
                            _ => false,
                        })
                    })
                    .unwrap_or(self.children.len());
                self.children
                    .insert(insert_at, XmlNode::Element(XmlElement::new(qname)));
                insert_at
            }
        };

        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("index was selected from element nodes"),
        }
    }

    /// Concatenated text of this element and all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Visit this element and every descendant element, depth first
    pub fn for_each_element(&self, f: &mut dyn FnMut(&XmlElement)) {
        f(self);
        for child in self.elements() {
            child.for_each_element(f);
        }
    }

    /// Serialize into `out`
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Serialize to a string
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

impl XmlNode {
    /// Serialize into `out`
    pub fn write_to(&self, out: &mut String) {
        match self {
            XmlNode::Element(e) => e.write_to(out),
            XmlNode::Text(text) => out.push_str(&escape_text(text)),
            XmlNode::Raw(raw) => out.push_str(raw),
        }
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Element(e) => collect_text(e, out),
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Raw(_) => {}
        }
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// Escape character data
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            _ => out.push(ch),
        }
    }
    out
}
