//! Composer configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration and a partial one only overrides what it names.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, Result};
use crate::fit::ImageBox;
use crate::matcher::AliasTable;

/// Top-level configuration of a [`Composer`](crate::Composer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Directory finished reports are written to
    pub output_dir: PathBuf,
    /// Output file name prefix (`<prefix>_<id>.docx`)
    pub file_prefix: String,
    /// Bounding box for embedded pictures
    pub image_box: ImageBox,
    pub typography: Typography,
    pub labels: SectionLabels,
    /// Diagram kind -> alias phrases; replaces the shipped entry per kind
    pub diagram_aliases: BTreeMap<String, Vec<String>>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated"),
            file_prefix: "blackbook".to_string(),
            image_box: ImageBox::default(),
            typography: Typography::default(),
            labels: SectionLabels::default(),
            diagram_aliases: BTreeMap::new(),
        }
    }
}

impl ComposerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ComposeError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Builder: write reports to `dir`
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// The shipped alias table with this configuration's overrides applied
    pub fn alias_table(&self) -> AliasTable {
        AliasTable::builtin().with_overrides(&self.diagram_aliases)
    }

    /// Reject values no build could use
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.image_box.max_width_in) || !positive(self.image_box.max_height_in) {
            return Err(ComposeError::config(format!(
                "image box must be positive, got {} x {} in",
                self.image_box.max_width_in, self.image_box.max_height_in
            )));
        }
        if self.file_prefix.is_empty()
            || self
                .file_prefix
                .chars()
                .any(|c| std::path::is_separator(c) || c.is_control())
        {
            return Err(ComposeError::config(format!(
                "invalid file prefix '{}'",
                self.file_prefix
            )));
        }
        let t = &self.typography;
        let sizes = [
            t.heading1_size_pt,
            t.heading2_size_pt,
            t.body_size_pt,
            t.code_size_pt,
            t.caption_size_pt,
            t.note_size_pt,
            t.reference_size_pt,
            t.reference_heading_size_pt,
        ];
        if sizes.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(ComposeError::config("font sizes must be positive"));
        }
        Ok(())
    }
}

/// Fonts, sizes and spacing used for normalized and generated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    pub font: String,
    pub heading1_size_pt: f32,
    pub heading2_size_pt: f32,
    pub body_size_pt: f32,
    /// Body line spacing as a multiple of single spacing
    pub body_line_spacing: f32,
    pub body_space_after_pt: f32,
    /// Upper-case paragraphs shorter than this are treated as headings
    pub heading_max_len: usize,
    pub code_font: String,
    pub code_size_pt: f32,
    pub caption_size_pt: f32,
    pub note_size_pt: f32,
    pub label_size_pt: f32,
    pub reference_size_pt: f32,
    pub reference_heading_size_pt: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font: "Times New Roman".to_string(),
            heading1_size_pt: 16.0,
            heading2_size_pt: 14.0,
            body_size_pt: 12.0,
            body_line_spacing: 1.5,
            body_space_after_pt: 8.0,
            heading_max_len: 80,
            code_font: "Courier New".to_string(),
            code_size_pt: 10.0,
            caption_size_pt: 11.0,
            note_size_pt: 10.0,
            label_size_pt: 12.0,
            reference_size_pt: 11.0,
            reference_heading_size_pt: 14.0,
        }
    }
}

/// Headings of generated sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLabels {
    pub code: String,
    pub screenshots: String,
    pub diagrams: String,
    pub table_of_contents: String,
    pub toc_placeholder: String,
    pub references: String,
    /// Caption of a screenshot without a display name
    pub screenshot: String,
}

impl Default for SectionLabels {
    fn default() -> Self {
        Self {
            code: "Code Implementation".to_string(),
            screenshots: "Screenshots".to_string(),
            diagrams: "Diagrams".to_string(),
            table_of_contents: "Table of Contents".to_string(),
            toc_placeholder: "Update field to populate TOC.".to_string(),
            references: "References".to_string(),
            screenshot: "Screenshot".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = ComposerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ComposerConfig::default());
        assert_eq!(config.output_dir, PathBuf::from("generated"));
        assert_eq!(config.typography.heading_max_len, 80);
    }

    #[test]
    fn test_partial_tables() {
        let config = ComposerConfig::from_toml_str(
            r#"
file_prefix = "report"

[image_box]
max_width_in = 5.0

[typography]
font = "Cambria"

[labels]
diagrams = "Figures"

[diagram_aliases]
er_diagram = ["schema"]
"#,
        )
        .unwrap();

        assert_eq!(config.file_prefix, "report");
        assert_eq!(config.image_box.max_width_in, 5.0);
        assert_eq!(config.image_box.max_height_in, 8.0);
        assert_eq!(config.typography.font, "Cambria");
        assert_eq!(config.typography.code_font, "Courier New");
        assert_eq!(config.labels.diagrams, "Figures");
        assert_eq!(config.labels.code, "Code Implementation");
        assert_eq!(config.alias_table().phrases("er_diagram"), vec!["schema"]);
        assert_eq!(
            config.alias_table().phrases("class_diagram"),
            vec!["class diagram"]
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ComposerConfig::from_toml_str("[image_box]\nmax_height_in = 0.0").unwrap_err();
        assert!(matches!(err, ComposeError::Config { .. }));

        let err = ComposerConfig::from_toml_str("file_prefix = \"a/b\"").unwrap_err();
        assert!(err.to_string().contains("file prefix"));

        let err = ComposerConfig::from_toml_str("[typography]\nbody_size_pt = -1.0").unwrap_err();
        assert!(matches!(err, ComposeError::Config { .. }));
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        let err = ComposerConfig::from_toml_str("output_dir = ").unwrap_err();
        assert!(matches!(err, ComposeError::Config { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blackbook.toml");
        std::fs::write(&path, "output_dir = \"out\"\n").unwrap();
        let config = ComposerConfig::load(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));

        let err = ComposerConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ComposeError::Read { .. }));
    }
}
