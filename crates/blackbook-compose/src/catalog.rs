//! Template catalog
//!
//! A JSON list describing the templates shipped with a deployment:
//!
//! ```json
//! [{"name": "Classic", "file": "templates/classic.docx",
//!   "old_details": {"student_name": "{{NAME}}"}}]
//! ```
//!
//! `file` is relative to the catalog's directory and doubles as the
//! template id. `old_details` maps logical fields to the literal tokens the
//! template uses.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, Result};
use crate::model::TemplateDescriptor;

/// One catalog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub file: String,
    #[serde(default)]
    pub old_details: BTreeMap<String, String>,
}

/// Templates known to a deployment
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    base_dir: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl TemplateCatalog {
    /// Load a catalog file; a missing file is an empty catalog
    pub fn load(path: &Path) -> Result<Self> {
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !path.exists() {
            log::warn!("Template catalog {} not found", path.display());
            return Ok(Self {
                base_dir,
                entries: Vec::new(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| ComposeError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text, base_dir).map_err(|err| match err {
            ComposeError::Catalog { reason, .. } => ComposeError::Catalog {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse catalog JSON; template files resolve against `base_dir`
    pub fn from_json_str(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|e| ComposeError::Catalog {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_dir: base_dir.into(),
            entries,
        })
    }

    /// Raw records in catalog order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor for a template, looked up by file first, then by name
    pub fn get(&self, id: &str) -> Option<TemplateDescriptor> {
        self.entries
            .iter()
            .find(|e| e.file == id)
            .or_else(|| self.entries.iter().find(|e| e.name == id))
            .map(|e| self.descriptor(e))
    }

    /// Descriptors of every template
    pub fn descriptors(&self) -> Vec<TemplateDescriptor> {
        self.entries.iter().map(|e| self.descriptor(e)).collect()
    }

    fn descriptor(&self, entry: &CatalogEntry) -> TemplateDescriptor {
        TemplateDescriptor {
            id: entry.file.clone(),
            name: entry.name.clone(),
            path: self.base_dir.join(&entry.file),
            placeholders: entry.old_details.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"name": "Classic", "file": "templates/classic.docx",
         "old_details": {"student_name": "{{NAME}}", "year": "2023-24"}},
        {"name": "Modern", "file": "templates/modern.docx"}
    ]"#;

    #[test]
    fn test_lookup_by_file_or_name() {
        let catalog = TemplateCatalog::from_json_str(CATALOG, "/srv/bb").unwrap();
        assert_eq!(catalog.len(), 2);

        let classic = catalog.get("templates/classic.docx").unwrap();
        assert_eq!(classic.id, "templates/classic.docx");
        assert_eq!(classic.path, PathBuf::from("/srv/bb/templates/classic.docx"));
        assert_eq!(classic.token("student_name"), "{{NAME}}");
        assert_eq!(classic.token("guide_name"), "[[guide_name]]");

        let modern = catalog.get("Modern").unwrap();
        assert!(modern.placeholders.is_empty());
        assert!(catalog.get("Missing").is_none());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = TemplateCatalog::load(&dir.path().join("templates.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_invalid_json_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = TemplateCatalog::load(&path).unwrap_err();
        match err {
            ComposeError::Catalog { path: p, .. } => assert!(p.ends_with("templates.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_resolves_against_catalog_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, CATALOG).unwrap();
        let catalog = TemplateCatalog::load(&path).unwrap();
        let descriptors = catalog.descriptors();
        assert_eq!(descriptors[1].path, dir.path().join("templates/modern.docx"));
    }
}
