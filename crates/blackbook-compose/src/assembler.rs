//! Assembler: runs the composition pipeline and writes the report
//!
//! Stages, in order: text substitution, block injection, fields,
//! references, style normalization. The template is loaded fresh for every
//! build and nothing is shared between builds, so a [`Composer`] can serve
//! concurrent callers writing into the same directory.

use std::path::Path;

use blackbook_ooxml::{OoxmlError, Template};
use uuid::Uuid;

use crate::config::ComposerConfig;
use crate::error::{ComposeError, Result};
use crate::fields::generate_fields;
use crate::inject::inject;
use crate::model::{
    BuildOutput, BuildRequest, CodeListing, GeneratedSection, MediaItem, PlagiarismReport,
    ReferenceEntry, StudentMeta, TemplateDescriptor,
};
use crate::normalize::normalize;
use crate::references::append_references;
use crate::substitute::{replacement_pairs, substitute};

/// Length of the random id in output file names
const UNIQUE_ID_LEN: usize = 10;

/// Report builder
#[derive(Debug, Clone, Default)]
pub struct Composer {
    config: ComposerConfig,
}

impl Composer {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Build a report and write it to the output directory
    pub fn generate(&self, request: &BuildRequest) -> Result<BuildOutput> {
        let template = self.compose(request)?;

        let dir = &self.config.output_dir;
        let filename = format!("{}_{}.docx", self.config.file_prefix, unique_id());
        let path = dir.join(&filename);

        std::fs::create_dir_all(dir).map_err(|e| ComposeError::WriteFailure {
            path: dir.display().to_string(),
            source: OoxmlError::from(e),
        })?;
        template
            .save(&path)
            .map_err(|source| ComposeError::WriteFailure {
                path: path.display().to_string(),
                source,
            })?;

        log::info!("Wrote {}", path.display());
        Ok(BuildOutput { filename, path })
    }

    /// Run every pipeline stage and return the edited package unsaved
    pub fn compose(&self, request: &BuildRequest) -> Result<Template> {
        let mut template = open_template(&request.template.path)?;
        log::info!(
            "Composing report from template '{}' ({})",
            request.template.name,
            request.template.path.display()
        );

        let pairs = replacement_pairs(&request.template, &request.student, &request.sections);
        let changed = substitute(&mut template.document_mut().tree, &pairs);
        log::info!("Substituted placeholders in {} paragraphs", changed);

        inject(&mut template, request, &self.config)?;
        generate_fields(&mut template, &self.config)?;
        append_references(&mut template, &request.references, &self.config);
        normalize(&mut template, &self.config.typography);

        Ok(template)
    }
}

fn open_template(path: &Path) -> Result<Template> {
    if !path.exists() {
        return Err(ComposeError::template_not_found(path.display().to_string()));
    }
    Template::load(path).map_err(|source| ComposeError::UnreadableTemplate {
        path: path.display().to_string(),
        source,
    })
}

/// First hex digits of a random v4 UUID
fn unique_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(UNIQUE_ID_LEN);
    id
}

/// Build a report with the default configuration
#[allow(clippy::too_many_arguments)]
pub fn generate(
    template: &TemplateDescriptor,
    student: &StudentMeta,
    sections: &[GeneratedSection],
    code: &[CodeListing],
    screenshots: &[MediaItem],
    diagrams: &[MediaItem],
    plagiarism: Option<&PlagiarismReport>,
    references: &[ReferenceEntry],
) -> Result<BuildOutput> {
    let request = BuildRequest {
        template: template.clone(),
        student: student.clone(),
        sections: sections.to_vec(),
        code: code.to_vec(),
        screenshots: screenshots.to_vec(),
        diagrams: diagrams.to_vec(),
        plagiarism: plagiarism.cloned(),
        references: references.to_vec(),
    };
    Composer::default().generate(&request)
}
