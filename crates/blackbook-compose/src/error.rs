//! Error types for report composition.

use blackbook_ooxml::OoxmlError;
use thiserror::Error;

/// Result type for composition operations
pub type Result<T> = std::result::Result<T, ComposeError>;

/// Errors that can occur while composing a report
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Template package path does not exist
    #[error("Template not found: {path}")]
    TemplateNotFound { path: String },

    /// Template exists but is not a readable DOCX package
    #[error("Unreadable template {path}: {source}")]
    UnreadableTemplate {
        path: String,
        #[source]
        source: OoxmlError,
    },

    /// A single media item could not be inserted; recovered as a note
    #[error("Could not insert '{name}': {reason}")]
    MediaInsertFailure { name: String, reason: String },

    /// Output package could not be written
    #[error("Could not write {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: OoxmlError,
    },

    /// Source file for a code listing or request could not be read
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Template catalog could not be parsed
    #[error("Invalid template catalog {path}: {reason}")]
    Catalog { path: String, reason: String },

    /// Structural document error while editing
    #[error("Document error: {0}")]
    Document(#[from] OoxmlError),
}

impl ComposeError {
    /// Create a template not found error
    pub fn template_not_found(path: impl Into<String>) -> Self {
        Self::TemplateNotFound { path: path.into() }
    }

    /// Create a media insertion failure
    pub fn media_insert_failure(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::MediaInsertFailure {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for ComposeError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ComposeError::template_not_found("t.docx").to_string(),
            "Template not found: t.docx"
        );
        assert_eq!(
            ComposeError::media_insert_failure("er.png", "bad header").to_string(),
            "Could not insert 'er.png': bad header"
        );
    }

    #[test]
    fn test_toml_error_becomes_config() {
        let err: ComposeError = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert!(matches!(err, ComposeError::Config { .. }));
    }
}
