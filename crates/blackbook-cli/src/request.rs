//! Report request files
//!
//! The JSON payload a front end submits for one build:
//!
//! ```json
//! {
//!   "studentDetails": {"name": "Asha Rao", "project_title": "Library Manager"},
//!   "documentation": {"doc_introduction": "This project ..."},
//!   "codeFiles": ["src/app.py"],
//!   "screenshots": [{"name": "Home page", "path": "uploads/home.png"}],
//!   "diagrams": [{"name": "ER Diagram", "path": "uploads/er.png"}],
//!   "plagiarismReport": {"name": "turnitin.pdf", "path": "uploads/turnitin.pdf"},
//!   "references": [{"label": "Flask", "url": "https://flask.palletsprojects.com"}]
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the request file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use blackbook_compose::{
    BuildRequest, CodeListing, GeneratedSection, MediaItem, PlagiarismReport, ReferenceEntry,
    StudentMeta, TemplateDescriptor,
};

/// An uploaded screenshot or diagram
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub path: PathBuf,
}

/// Deserialized request file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRequest {
    pub student_details: StudentMeta,
    pub documentation: BTreeMap<String, String>,
    pub code_files: Vec<PathBuf>,
    pub screenshots: Vec<UploadedFile>,
    pub diagrams: Vec<UploadedFile>,
    pub plagiarism_report: Option<PlagiarismReport>,
    pub references: Vec<ReferenceEntry>,
}

impl ReportRequest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid report request")
    }

    /// Read a request file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Request file not found: {}", path.display());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read request: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse request: {}", path.display()))
    }

    /// Turn the request into a build for `template`, reading code files
    /// and resolving upload paths against `base_dir`
    pub fn into_build_request(
        self,
        template: TemplateDescriptor,
        base_dir: &Path,
    ) -> Result<BuildRequest> {
        let resolve = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };

        let code = self
            .code_files
            .iter()
            .map(|file| {
                let path = resolve(file);
                CodeListing::from_path(&path)
                    .with_context(|| format!("Failed to read code file: {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        let screenshots = self
            .screenshots
            .into_iter()
            .map(|f| MediaItem::screenshot(f.name, resolve(&f.path)))
            .collect();
        let diagrams = self
            .diagrams
            .into_iter()
            .map(|f| MediaItem::diagram(f.name, resolve(&f.path)))
            .collect();
        let plagiarism = self.plagiarism_report.map(|mut report| {
            report.path = resolve(&report.path);
            report
        });

        let mut request = BuildRequest::new(template);
        request.student = self.student_details;
        request.sections = self
            .documentation
            .into_iter()
            .map(|(key, text)| GeneratedSection::new(key, text))
            .collect();
        request.code = code;
        request.screenshots = screenshots;
        request.diagrams = diagrams;
        request.plagiarism = plagiarism;
        request.references = self.references;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackbook_compose::MediaKind;

    const REQUEST: &str = r#"{
        "studentDetails": {"name": "Asha Rao", "project": "Library Manager", "year": "2024"},
        "documentation": {"doc_introduction": "Intro", "doc_conclusion": "Done"},
        "screenshots": [{"name": "Home", "path": "uploads/home.png"}],
        "diagrams": [{"name": "ER Diagram", "path": "/abs/er.png"}],
        "plagiarismReport": {"name": "turnitin.pdf", "path": "uploads/turnitin.pdf"},
        "references": [{"label": "Flask", "url": "https://flask.palletsprojects.com"}, {"url": "https://docs.rs"}]
    }"#;

    #[test]
    fn test_parse_request() {
        let request = ReportRequest::from_json_str(REQUEST).unwrap();
        assert_eq!(request.student_details.name, "Asha Rao");
        assert_eq!(request.student_details.project_title, "Library Manager");
        assert_eq!(request.student_details.guide_name, "");
        assert_eq!(request.documentation.len(), 2);
        assert!(request.code_files.is_empty());
        assert_eq!(request.references[1].label, None);
        assert_eq!(
            request.plagiarism_report.unwrap().title,
            PlagiarismReport::default_title()
        );
    }

    #[test]
    fn test_empty_object_is_empty_request() {
        let request = ReportRequest::from_json_str("{}").unwrap();
        assert!(request.screenshots.is_empty());
        assert!(request.plagiarism_report.is_none());
    }

    #[test]
    fn test_into_build_request_resolves_paths() {
        let request = ReportRequest::from_json_str(REQUEST).unwrap();
        let template = TemplateDescriptor::new("t", "T", "/srv/t.docx");
        let build = request
            .into_build_request(template, Path::new("/data/req"))
            .unwrap();

        assert_eq!(build.screenshots[0].path, PathBuf::from("/data/req/uploads/home.png"));
        assert_eq!(build.screenshots[0].kind, MediaKind::Screenshot);
        assert_eq!(build.diagrams[0].path, PathBuf::from("/abs/er.png"));
        assert_eq!(build.diagrams[0].kind, MediaKind::Diagram);
        assert_eq!(
            build.plagiarism.unwrap().path,
            PathBuf::from("/data/req/uploads/turnitin.pdf")
        );
        let keys: Vec<&str> = build.sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["doc_conclusion", "doc_introduction"]);
    }

    #[test]
    fn test_missing_code_file_fails() {
        let request = ReportRequest {
            code_files: vec![PathBuf::from("missing.rs")],
            ..ReportRequest::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let err = request
            .into_build_request(TemplateDescriptor::new("t", "T", "t.docx"), dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("missing.rs"));
    }
}
