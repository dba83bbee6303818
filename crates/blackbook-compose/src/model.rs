//! Inputs and outputs of a report build

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, Result};

/// Generated-section keys every template may reference
pub const SECTION_KEYS: [&str; 11] = [
    "doc_introduction",
    "doc_objective",
    "doc_scope",
    "doc_techstack",
    "doc_feasibility",
    "doc_system_features",
    "doc_modules",
    "doc_usecase",
    "doc_advantage",
    "doc_hardware_req",
    "doc_software_req",
];

/// A template package plus the literal tokens it uses for each logical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    /// Logical field -> literal token; missing fields use `[[<field>]]`
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,
}

impl TemplateDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            placeholders: BTreeMap::new(),
        }
    }

    /// Builder: override the token for a logical field
    pub fn with_placeholder(mut self, field: impl Into<String>, token: impl Into<String>) -> Self {
        self.placeholders.insert(field.into(), token.into());
        self
    }

    /// Literal token for a logical field
    pub fn token(&self, field: &str) -> String {
        self.placeholders
            .get(field)
            .cloned()
            .unwrap_or_else(|| format!("[[{field}]]"))
    }
}

/// What an uploaded picture is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Screenshot,
    Diagram,
    Plagiarism,
}

/// An uploaded picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub display_name: String,
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn screenshot(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            path: path.into(),
            kind: MediaKind::Screenshot,
        }
    }

    pub fn diagram(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            path: path.into(),
            kind: MediaKind::Diagram,
        }
    }

    /// File name component of the path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The plagiarism check artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlagiarismReport {
    #[serde(default = "PlagiarismReport::default_title")]
    pub title: String,
    /// Uploaded file name, used in notes
    pub name: String,
    pub path: PathBuf,
}

impl PlagiarismReport {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: Self::default_title(),
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn default_title() -> String {
        "Plagiarism Report".to_string()
    }

    /// PDF reports are attached by name only
    pub fn is_embeddable(&self) -> bool {
        !self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }
}

/// A source file shown as a code listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListing {
    pub filename: String,
    pub language: String,
    pub content: String,
    pub line_count: usize,
}

impl CodeListing {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let filename = filename.into();
        let content = content.into();
        Self {
            language: guess_language(&filename).to_string(),
            line_count: content.lines().count(),
            filename,
            content,
        }
    }

    /// Read a listing from disk; invalid UTF-8 is replaced, never rejected
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| ComposeError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, String::from_utf8_lossy(&bytes)))
    }
}

/// Language label from a file extension
pub fn guess_language(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "java" => "java",
        "cpp" => "cpp",
        "c" => "c",
        "cs" => "csharp",
        "php" => "php",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        "json" => "json",
        _ => "text",
    }
}

/// A bibliography entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl ReferenceEntry {
    pub fn new(label: Option<&str>, url: impl Into<String>) -> Self {
        Self {
            label: label.map(str::to_string),
            url: url.into(),
        }
    }
}

/// A generated body section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSection {
    pub key: String,
    pub text: String,
}

impl GeneratedSection {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Cover-page details of the student and project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentMeta {
    pub name: String,
    #[serde(alias = "project")]
    pub project_title: String,
    #[serde(alias = "professor")]
    pub professor_name: String,
    #[serde(alias = "guide")]
    pub guide_name: String,
    pub year: String,
}

impl StudentMeta {
    /// Logical field names paired with values, in substitution order
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("student_name", self.name.as_str()),
            ("project_title", self.project_title.as_str()),
            ("professor_name", self.professor_name.as_str()),
            ("guide_name", self.guide_name.as_str()),
            ("year", self.year.as_str()),
        ]
    }
}

/// Where a finished report was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutput {
    pub filename: String,
    pub path: PathBuf,
}

/// Everything one build needs
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub template: TemplateDescriptor,
    pub student: StudentMeta,
    pub sections: Vec<GeneratedSection>,
    pub code: Vec<CodeListing>,
    pub screenshots: Vec<MediaItem>,
    pub diagrams: Vec<MediaItem>,
    pub plagiarism: Option<PlagiarismReport>,
    pub references: Vec<ReferenceEntry>,
}

impl BuildRequest {
    /// A request with no content beyond the template
    pub fn new(template: TemplateDescriptor) -> Self {
        Self {
            template,
            student: StudentMeta::default(),
            sections: Vec::new(),
            code: Vec::new(),
            screenshots: Vec::new(),
            diagrams: Vec::new(),
            plagiarism: None,
            references: Vec::new(),
        }
    }
}
