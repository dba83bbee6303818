//! `[Content_Types].xml` maintenance
//!
//! The part is only ever appended to: new `Default` entries for media
//! extensions and `Override` entries for generated parts are spliced in
//! before `</Types>`, leaving the rest of the template's text as it was.

use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::xml::escape_attr;

/// Path of the content types part inside the package
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Content type of footer parts
pub const FOOTER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

/// Editable view over `[Content_Types].xml`
#[derive(Debug, Clone)]
pub struct ContentTypes {
    xml: String,
    defaults: HashSet<String>,
    overrides: HashSet<String>,
    dirty: bool,
}

impl ContentTypes {
    /// Parse the part
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut defaults = HashSet::new();
        let mut overrides = HashSet::new();
        let mut saw_types = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"Types" => saw_types = true,
                    b"Default" => {
                        if let Some(ext) = attr_value(&e, b"Extension")? {
                            defaults.insert(ext.to_ascii_lowercase());
                        }
                    }
                    b"Override" => {
                        if let Some(part) = attr_value(&e, b"PartName")? {
                            overrides.insert(part.to_ascii_lowercase());
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_types || !xml.contains("</Types>") {
            return Err(OoxmlError::InvalidStructure(
                "content types part has no <Types> element".to_string(),
            ));
        }

        Ok(Self {
            xml: xml.to_string(),
            defaults,
            overrides,
            dirty: false,
        })
    }

    /// True when a default is registered for the extension (case-insensitive)
    pub fn has_default(&self, extension: &str) -> bool {
        self.defaults.contains(&extension.to_ascii_lowercase())
    }

    /// True when an override exists for the part name
    pub fn has_override(&self, part_name: &str) -> bool {
        self.overrides
            .contains(&normalize_part_name(part_name).to_ascii_lowercase())
    }

    /// Register a default content type for an extension if missing
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        if self.has_default(extension) {
            return;
        }
        self.insert(format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            escape_attr(extension),
            escape_attr(content_type)
        ));
        self.defaults.insert(extension.to_ascii_lowercase());
    }

    /// Register an override for a part if missing
    pub fn ensure_override(&mut self, part_name: &str, content_type: &str) {
        if self.has_override(part_name) {
            return;
        }
        let part_name = normalize_part_name(part_name);
        self.insert(format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            escape_attr(&part_name),
            escape_attr(content_type)
        ));
        self.overrides.insert(part_name.to_ascii_lowercase());
    }

    /// True once an entry has been added
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current XML text
    pub fn as_str(&self) -> &str {
        &self.xml
    }

    fn insert(&mut self, entry: String) {
        if let Some(at) = self.xml.rfind("</Types>") {
            self.xml.insert_str(at, &entry);
            self.dirty = true;
        }
    }
}

fn attr_value(e: &quick_xml::events::BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Part names in overrides are absolute (`/word/footer1.xml`)
fn normalize_part_name(part_name: &str) -> String {
    if part_name.starts_with('/') {
        part_name.to_string()
    } else {
        format!("/{}", part_name)
    }
}
