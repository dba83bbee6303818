//! # blackbook-ooxml
//!
//! DOCX package layer for the blackbook report composer.
//!
//! This crate provides functionality to:
//! - Unpack a DOCX template and write it back, copying untouched parts verbatim
//! - Edit `word/document.xml` as an arena of blocks with stable handles
//! - Embed pictures and maintain relationships and content types
//! - Locate or create the default footer of the first section
//!
//! ## Example
//!
//! ```no_run
//! use blackbook_ooxml::{Block, Origin, Paragraph, Run, Template};
//!
//! let mut template = Template::load("template.docx")?;
//! template.document_mut().tree.push_back(
//!     Block::Paragraph(Paragraph::with_run(Run::new("Appendix"))),
//!     Origin::Generated,
//! );
//! template.save("report.docx")?;
//! # Ok::<(), blackbook_ooxml::OoxmlError>(())
//! ```

pub mod archive;
pub mod content_types;
pub mod document;
pub mod error;
pub mod format;
pub mod media;
pub mod relationships;
pub mod styles;
pub mod template;
pub mod test_utils;
pub mod xml;

pub use archive::OoxmlArchive;
pub use content_types::ContentTypes;
pub use document::{
    Block, BlockId, DocumentTree, Origin, Paragraph, ParagraphChild, Run, RunContent, StoryPart,
    Table, TableCell, TableRow,
};
pub use error::{OoxmlError, Result};
pub use format::{Alignment, ParagraphFormat, RunFormat};
pub use media::{inches_to_emu, InlinePicture, MediaImage, EMU_PER_INCH};
pub use relationships::Relationships;
pub use styles::{Style, StyleSheet};
pub use template::Template;
pub use xml::{XmlElement, XmlNode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
