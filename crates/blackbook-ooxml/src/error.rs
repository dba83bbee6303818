//! Error types for DOCX package operations

use thiserror::Error;

/// Errors that can occur while reading, editing or writing a DOCX package
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required part not found in the package
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Invalid document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Image could not be decoded or re-encoded
    #[error("Image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for OoxmlError {
    fn from(err: image::ImageError) -> Self {
        OoxmlError::Image(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for OoxmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OoxmlError::Xml(quick_xml::Error::from(err))
    }
}

/// Result type for package operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
