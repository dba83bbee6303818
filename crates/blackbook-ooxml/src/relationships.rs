//! Part relationships (`word/_rels/document.xml.rels`)
//!
//! Held as the parsed XML tree, so entries the template already has keep
//! their attributes and order. Composition only appends: images and a
//! generated footer get `rIdN` ids numbered past the highest one in use.

use crate::error::{OoxmlError, Result};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

/// Package relationships namespace
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Relationships of one package part
#[derive(Debug, Clone)]
pub struct Relationships {
    doc: XmlDocument,
    next_id: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            doc: XmlDocument {
                prolog: DECLARATION.to_string(),
                root: XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS),
            },
            next_id: 1,
        }
    }
}

impl Relationships {
    pub const TYPE_IMAGE: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const TYPE_FOOTER: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(xml: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(xml)?;
        if !doc.root.is("Relationships") {
            return Err(OoxmlError::InvalidStructure(format!(
                "expected <Relationships>, found <{}>",
                doc.root.name
            )));
        }
        let mut rels = Self { doc, next_id: 1 };
        rels.next_id = rels
            .entries()
            .filter_map(|e| e.attr("Id"))
            .filter_map(id_number)
            .max()
            .map_or(1, |n| n + 1);
        Ok(rels)
    }

    /// Append an internal relationship and return its id
    pub fn add(&mut self, target: impl Into<String>, rel_type: impl Into<String>) -> String {
        let id = format!("rId{}", self.next_id);
        self.next_id += 1;

        let entry = XmlElement::new("Relationship")
            .with_attr("Id", id.clone())
            .with_attr("Type", rel_type)
            .with_attr("Target", target);
        self.doc.root.children.push(XmlNode::Element(entry));
        id
    }

    /// Target of a relationship id
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries()
            .find(|e| e.attr("Id") == Some(id))
            .and_then(|e| e.attr("Target"))
    }

    /// Targets of every relationship of `rel_type`, in part order
    pub fn targets_of_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries()
            .filter(move |e| e.attr("Type") == Some(rel_type))
            .filter_map(|e| e.attr("Target"))
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    pub fn to_xml(&self) -> String {
        self.doc.to_xml()
    }

    fn entries(&self) -> impl Iterator<Item = &XmlElement> {
        self.doc.root.elements().filter(|e| e.is("Relationship"))
    }
}

/// `rId12` -> 12; other id schemes are left alone
fn id_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId")?.parse().ok()
}
