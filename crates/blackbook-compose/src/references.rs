//! Bibliography appended at the end of the body

use blackbook_ooxml::{Alignment, Block, Origin, ParagraphFormat, RunFormat, Template};

use crate::blocks::BlockBuilder;
use crate::config::ComposerConfig;
use crate::model::ReferenceEntry;
use crate::sanitize::sanitize;

/// Numbered reference lines: `"N. label - url"` or `"N. url"`.
///
/// Labels and URLs are sanitized and trimmed; entries without a URL are
/// dropped before numbering.
pub fn format_references(references: &[ReferenceEntry]) -> Vec<String> {
    references
        .iter()
        .filter_map(|entry| {
            let url = sanitize(&entry.url).trim().to_string();
            if url.is_empty() {
                return None;
            }
            let label = entry
                .label
                .as_deref()
                .map(|l| sanitize(l).trim().to_string())
                .unwrap_or_default();
            Some((label, url))
        })
        .enumerate()
        .map(|(i, (label, url))| {
            if label.is_empty() {
                format!("{}. {}", i + 1, url)
            } else {
                format!("{}. {} - {}", i + 1, label, url)
            }
        })
        .collect()
}

/// Append the "References" section; returns the number of entries written
pub fn append_references(
    template: &mut Template,
    references: &[ReferenceEntry],
    config: &ComposerConfig,
) -> usize {
    let lines = format_references(references);
    if lines.is_empty() {
        return 0;
    }

    let typography = &config.typography;
    let blocks = BlockBuilder::new(typography);
    let tree = &mut template.document_mut().tree;

    let heading = blocks.text(
        &config.labels.references,
        RunFormat {
            font: Some(typography.font.clone()),
            size_pt: Some(typography.reference_heading_size_pt),
            bold: Some(true),
        },
        ParagraphFormat::default(),
    );
    tree.push_back(Block::Paragraph(heading), Origin::Generated);

    for line in &lines {
        let entry = blocks.text(
            line,
            RunFormat {
                font: Some(typography.font.clone()),
                size_pt: Some(typography.reference_size_pt),
                bold: Some(false),
            },
            ParagraphFormat {
                alignment: Some(Alignment::Left),
                ..ParagraphFormat::default()
            },
        );
        tree.push_back(Block::Paragraph(entry), Origin::Generated);
    }

    log::info!("Appended {} references", lines.len());
    lines.len()
}
