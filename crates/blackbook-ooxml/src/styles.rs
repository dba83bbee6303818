//! Style definitions (word/styles.xml)
//!
//! Only what composition needs: which paragraph styles are headings, and at
//! which level. A style is a heading when it (or a style it is based on)
//! declares an outline level; templates without outline levels still get
//! their `Heading1`..`Heading9` ids recognised.

use std::collections::{HashMap, HashSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// Collection of styles from a document
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, Style>,
}

/// A Word style definition
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Style ID (used in document references)
    pub id: String,
    /// Display name
    pub name: String,
    /// Base style ID
    pub based_on: Option<String>,
    /// Outline level (0-8, where 0 = Heading 1; 9 means body text)
    pub outline_level: Option<u8>,
}

impl StyleSheet {
    /// Parse styles from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut stylesheet = StyleSheet::default();
        let mut buf = Vec::new();
        let mut current: Option<Style> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let name = e.local_name();
                    match (name.as_ref(), current.as_mut()) {
                        (b"style", _) => {
                            current = get_attr(e, b"w:styleId").map(|id| Style {
                                name: id.clone(),
                                id,
                                based_on: None,
                                outline_level: None,
                            });
                        }
                        (b"name", Some(style)) => {
                            if let Some(val) = get_attr(e, b"w:val") {
                                style.name = val;
                            }
                        }
                        (b"basedOn", Some(style)) => {
                            style.based_on = get_attr(e, b"w:val");
                        }
                        (b"outlineLvl", Some(style)) => {
                            style.outline_level =
                                get_attr(e, b"w:val").and_then(|v| v.parse().ok());
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.local_name().as_ref() == b"style" {
                        if let Some(style) = current.take() {
                            stylesheet.styles.insert(style.id.clone(), style);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(stylesheet)
    }

    /// Get a style by ID
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    /// Number of styles
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when no styles were parsed
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Heading level (1-9) of a paragraph style, if it is a heading.
    ///
    /// The outline level is looked up along the `basedOn` chain; when no
    /// style in the chain declares one, `HeadingN` ids and `heading N`
    /// names are recognised.
    pub fn heading_level(&self, style_id: &str) -> Option<u8> {
        let mut seen = HashSet::new();
        let mut current = Some(style_id);
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let Some(style) = self.get(id) else { break };
            if let Some(level) = style.outline_level {
                return (level <= 8).then_some(level + 1);
            }
            current = style.based_on.as_deref();
        }

        heading_level_from_name(style_id).or_else(|| {
            self.get(style_id)
                .and_then(|style| heading_level_from_name(&style.name))
        })
    }
}

/// `Heading1`, `heading 2`, `Heading_3` -> level
fn heading_level_from_name(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    let rest = lower.strip_prefix("heading")?;
    let digits = rest.trim_start_matches([' ', '_']);
    match digits.parse::<u8>() {
        Ok(level) if (1..=9).contains(&level) => Some(level),
        _ => None,
    }
}

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
