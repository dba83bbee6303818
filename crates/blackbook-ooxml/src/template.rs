//! Editable DOCX template
//!
//! [`Template`] unpacks a package, lifts the main document into a
//! [`DocumentTree`](crate::document::DocumentTree) and keeps the parts that
//! composition appends to (relationships, content types, footers) parsed
//! alongside. On save only the parts that were touched are re-serialized;
//! every other entry is written back byte for byte.
//!
//! # Example
//!
//! ```no_run
//! use blackbook_ooxml::Template;
//!
//! let mut template = Template::load("report.docx")?;
//! let paragraphs = template.document().tree.len();
//! println!("{paragraphs} blocks");
//! template.save("out.docx")?;
//! # Ok::<(), blackbook_ooxml::OoxmlError>(())
//! ```

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use crate::archive::OoxmlArchive;
use crate::content_types::{ContentTypes, CONTENT_TYPES_PATH, FOOTER_CONTENT_TYPE};
use crate::document::{Run, StoryPart};
use crate::error::Result;
use crate::media::{InlinePicture, MediaImage};
use crate::relationships::Relationships;
use crate::styles::StyleSheet;
use crate::xml::{XmlElement, XmlNode};

/// Main document part
pub const DOCUMENT_PATH: &str = "word/document.xml";
/// Relationships of the main document part
pub const DOCUMENT_RELS_PATH: &str = "word/_rels/document.xml.rels";
/// Style definitions part
pub const STYLES_PATH: &str = "word/styles.xml";

const RELATIONSHIPS_NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A DOCX template opened for editing
#[derive(Debug)]
pub struct Template {
    archive: OoxmlArchive,
    document: StoryPart,
    relationships: Relationships,
    relationships_dirty: bool,
    content_types: ContentTypes,
    styles: StyleSheet,
    /// Footer parts opened for editing, keyed by package path
    footers: Vec<(String, StoryPart)>,
    next_drawing_id: u32,
    next_media_index: u32,
}

impl Template {
    /// Load a template from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_archive(OoxmlArchive::open(path)?)
    }

    /// Load a template from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_archive(OoxmlArchive::from_reader(Cursor::new(bytes))?)
    }

    /// Wrap an unpacked archive
    pub fn from_archive(archive: OoxmlArchive) -> Result<Self> {
        let document = StoryPart::parse_document(archive.require(DOCUMENT_PATH)?)?;
        let relationships = match archive.get(DOCUMENT_RELS_PATH) {
            Some(xml) => Relationships::parse(xml)?,
            None => Relationships::new(),
        };
        let content_types = ContentTypes::parse(&String::from_utf8_lossy(
            archive.require(CONTENT_TYPES_PATH)?,
        ))?;
        let styles = match archive.get(STYLES_PATH) {
            Some(xml) => StyleSheet::parse(xml)?,
            None => StyleSheet::default(),
        };
        let next_drawing_id = document.max_drawing_id() + 1;

        log::debug!(
            "Loaded template: {} blocks, {} relationships, {} styles",
            document.tree.len(),
            relationships.len(),
            styles.len()
        );

        Ok(Self {
            archive,
            document,
            relationships,
            relationships_dirty: false,
            content_types,
            styles,
            footers: Vec::new(),
            next_drawing_id,
            next_media_index: 1,
        })
    }

    /// The main document
    pub fn document(&self) -> &StoryPart {
        &self.document
    }

    /// The main document, mutably
    pub fn document_mut(&mut self) -> &mut StoryPart {
        &mut self.document
    }

    /// Parsed style definitions
    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Relationships of the main document
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// The underlying archive (not yet reflecting unsaved edits)
    pub fn archive(&self) -> &OoxmlArchive {
        &self.archive
    }

    /// Store a picture under `word/media/` and relate it to the document.
    ///
    /// Returns the new relationship id.
    pub fn embed_media(&mut self, media: &MediaImage) -> Result<String> {
        let file_name = loop {
            let candidate = format!(
                "blackbook_image{}.{}",
                self.next_media_index, media.extension
            );
            self.next_media_index += 1;
            if !self.archive.contains(&format!("word/media/{candidate}")) {
                break candidate;
            }
        };

        self.archive
            .set(format!("word/media/{file_name}"), media.bytes.clone());
        self.content_types
            .ensure_default(media.extension, media.content_type());
        let rel_id = self
            .relationships
            .add(format!("media/{file_name}"), Relationships::TYPE_IMAGE);
        self.relationships_dirty = true;

        log::debug!("Embedded word/media/{} as {}", file_name, rel_id);
        Ok(rel_id)
    }

    /// Embed a picture and build the run that displays it at the given size
    pub fn picture_run(
        &mut self,
        media: &MediaImage,
        name: &str,
        width_emu: i64,
        height_emu: i64,
    ) -> Result<Run> {
        let rel_id = self.embed_media(media)?;
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        InlinePicture {
            id,
            rel_id,
            name: name.to_string(),
            width_emu,
            height_emu,
        }
        .to_run()
    }

    /// Default footer of the first section, created when the template has
    /// none (new part, relationship, content type override and
    /// `w:footerReference`)
    pub fn default_footer_mut(&mut self) -> Result<&mut StoryPart> {
        let referenced = self.default_footer_reference().and_then(|rel_id| {
            self.relationships
                .get(&rel_id)
                .map(resolve_part_path)
                .filter(|path| self.archive.contains(path))
        });

        let path = match referenced {
            Some(path) => path,
            None => self.create_default_footer()?,
        };

        let index = match self.footers.iter().position(|(p, _)| *p == path) {
            Some(index) => index,
            None => {
                let part = StoryPart::parse_footer(self.archive.require(&path)?)?;
                self.footers.push((path, part));
                self.footers.len() - 1
            }
        };
        Ok(&mut self.footers[index].1)
    }

    fn default_footer_reference(&mut self) -> Option<String> {
        self.document
            .tree
            .first_section_mut()
            .elements()
            .find(|e| e.is("footerReference") && e.attr("w:type") == Some("default"))
            .and_then(|e| e.attr("r:id"))
            .map(str::to_string)
    }

    fn create_default_footer(&mut self) -> Result<String> {
        let mut index = 1;
        while self.archive.contains(&format!("word/footer{index}.xml")) {
            index += 1;
        }
        let target = format!("footer{index}.xml");
        let path = format!("word/{target}");

        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:ftr xmlns:w="{WORDPROCESSING_NS}" xmlns:r="{RELATIONSHIPS_NS_R}"><w:p/></w:ftr>"#
        );
        self.archive.set_string(path.clone(), xml);
        self.content_types
            .ensure_override(&path, FOOTER_CONTENT_TYPE);
        let rel_id = self.relationships.add(target, Relationships::TYPE_FOOTER);
        self.relationships_dirty = true;

        let declares_r = self.document.declares_namespace("r");
        let sect = self.document.tree.first_section_mut();

        // Repoint a dangling default reference instead of adding a second one
        let existing = sect.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(e)
                if e.is("footerReference") && e.attr("w:type") == Some("default") =>
            {
                Some(e)
            }
            _ => None,
        });
        match existing {
            Some(reference) => reference.set_attr("r:id", rel_id.as_str()),
            None => {
                let mut reference = XmlElement::new("w:footerReference")
                    .with_attr("w:type", "default")
                    .with_attr("r:id", rel_id.as_str());
                if !declares_r {
                    reference.set_attr("xmlns:r", RELATIONSHIPS_NS_R);
                }
                // Header/footer references lead the section properties
                let at = sect
                    .children
                    .iter()
                    .rposition(|node| {
                        matches!(node, XmlNode::Element(e)
                            if e.is("headerReference") || e.is("footerReference"))
                    })
                    .map(|i| i + 1)
                    .unwrap_or(0);
                sect.children.insert(at, XmlNode::Element(reference));
            }
        }

        log::debug!("Created default footer part {} ({})", path, rel_id);
        Ok(path)
    }

    /// Serialize the edited package to bytes
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the edited package to a file
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(file)
    }

    /// Write the edited package to any writer
    pub fn write_to<W: Write + Seek>(self, writer: W) -> Result<()> {
        let mut archive = self.archive;
        archive.set_string(DOCUMENT_PATH, self.document.to_xml());
        for (path, part) in &self.footers {
            archive.set_string(path.clone(), part.to_xml());
        }
        if self.relationships_dirty {
            archive.set_string(DOCUMENT_RELS_PATH, self.relationships.to_xml());
        }
        if self.content_types.is_dirty() {
            archive.set_string(CONTENT_TYPES_PATH, self.content_types.as_str());
        }
        archive.write_to(writer)
    }
}

/// Resolve a relationship target of `word/document.xml` to a package path
fn resolve_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{target}"),
    }
}
