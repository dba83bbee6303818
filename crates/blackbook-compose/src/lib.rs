//! # blackbook-compose
//!
//! Report composition engine: fills a DOCX template with student details,
//! generated sections, code listings, screenshots, diagrams and a
//! plagiarism report, then writes a finished report.
//!
//! ## Pipeline
//!
//! 1. Text substitution of scalar placeholders (`[[student_name]]`, ...)
//! 2. Block injection at structural anchors (`[[CODE_IMPLEMENTATION_BLOCK]]`,
//!    `[[SCREENSHOT_BLOCK]]`, `[[DIAGRAM_BLOCK]]`, `[[er_diagram]]`, ...)
//! 3. Table of contents and footer page number fields
//! 4. References section
//! 5. Heading and body style normalization
//!
//! ## Example
//!
//! ```no_run
//! use blackbook_compose::{BuildRequest, Composer, ComposerConfig, MediaItem, TemplateDescriptor};
//!
//! let template = TemplateDescriptor::new("classic", "Classic", "templates/classic.docx");
//! let mut request = BuildRequest::new(template);
//! request.student.name = "Asha Rao".into();
//! request.diagrams.push(MediaItem::diagram("ER Diagram", "uploads/er.png"));
//!
//! let output = Composer::new(ComposerConfig::default()).generate(&request)?;
//! println!("{}", output.path.display());
//! # Ok::<(), blackbook_compose::ComposeError>(())
//! ```

pub mod assembler;
pub mod blocks;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fields;
pub mod fit;
pub mod inject;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod references;
pub mod sanitize;
pub mod substitute;

pub use assembler::{generate, Composer};
pub use catalog::{CatalogEntry, TemplateCatalog};
pub use config::{ComposerConfig, SectionLabels, Typography};
pub use error::{ComposeError, Result};
pub use fit::{FittedSize, ImageBox};
pub use inject::InjectionSummary;
pub use matcher::{AliasTable, DiagramMatcher};
pub use model::{
    BuildOutput, BuildRequest, CodeListing, GeneratedSection, MediaItem, MediaKind,
    PlagiarismReport, ReferenceEntry, StudentMeta, TemplateDescriptor, SECTION_KEYS,
};
pub use sanitize::sanitize;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
