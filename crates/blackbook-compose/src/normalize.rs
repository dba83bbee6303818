//! Style normalizer
//!
//! Gives template paragraphs a uniform look once placeholders are filled:
//! headings bold and left-aligned, body text justified with 1.5 spacing.
//! Generated blocks carry their own formatting and are skipped.

use blackbook_ooxml::{
    Alignment, Block, BlockId, Origin, Paragraph, ParagraphFormat, RunFormat, StyleSheet, Template,
};

use crate::config::Typography;

/// Typographic role of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Heading, level 1 or 2
    Heading(u8),
    Body,
}

/// Counts of paragraphs restyled by [`normalize`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub headings: usize,
    pub body: usize,
}

/// Role of a paragraph, `None` when it has no visible text.
///
/// A heading style in the template wins: level 1 stays level 1, deeper
/// levels map to 2. Otherwise short all-uppercase text reads as a level 2
/// heading.
pub fn classify(paragraph: &Paragraph, styles: &StyleSheet, heading_max_len: usize) -> Option<Role> {
    let text = paragraph.text();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(level) = paragraph.style_id().and_then(|id| styles.heading_level(id)) {
        return Some(Role::Heading(if level == 1 { 1 } else { 2 }));
    }

    if text.chars().count() < heading_max_len && is_uppercase(text) {
        return Some(Role::Heading(2));
    }
    Some(Role::Body)
}

/// At least one cased character and no lowercase ones
fn is_uppercase(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

/// Restyle every non-empty template paragraph at body level
pub fn normalize(template: &mut Template, typography: &Typography) -> NormalizeSummary {
    let styles = template.styles().clone();
    let roles: Vec<(BlockId, Role)> = {
        let tree = &template.document().tree;
        tree.iter()
            .filter(|(id, _)| tree.origin(*id) == Some(Origin::Template))
            .filter_map(|(id, block)| {
                let paragraph = block.as_paragraph()?;
                classify(paragraph, &styles, typography.heading_max_len).map(|role| (id, role))
            })
            .collect()
    };

    let mut summary = NormalizeSummary::default();
    let tree = &mut template.document_mut().tree;
    for (id, role) in roles {
        let Some(paragraph) = tree.get_mut(id).and_then(Block::as_paragraph_mut) else {
            continue;
        };
        apply_role(paragraph, role, &styles, typography);
        match role {
            Role::Heading(_) => summary.headings += 1,
            Role::Body => summary.body += 1,
        }
    }

    log::info!(
        "Normalized {} headings and {} body paragraphs",
        summary.headings,
        summary.body
    );
    summary
}

/// Write the direct formatting for `role`.
///
/// A paragraph that already uses a heading style keeps it. Any other
/// heading, including one styled `Normal` or `BodyText`, gets
/// `Heading<level>` so the table of contents picks it up.
pub fn apply_role(
    paragraph: &mut Paragraph,
    role: Role,
    styles: &StyleSheet,
    typography: &Typography,
) {
    let (paragraph_format, run_format) = match role {
        Role::Heading(level) => {
            let has_heading_style = paragraph
                .style_id()
                .is_some_and(|id| styles.heading_level(id).is_some());
            let style = (!has_heading_style).then(|| format!("Heading{level}"));
            let size = if level == 1 {
                typography.heading1_size_pt
            } else {
                typography.heading2_size_pt
            };
            (
                ParagraphFormat {
                    style,
                    alignment: Some(Alignment::Left),
                    ..ParagraphFormat::default()
                },
                RunFormat {
                    font: Some(typography.font.clone()),
                    size_pt: Some(size),
                    bold: Some(true),
                },
            )
        }
        Role::Body => (
            ParagraphFormat {
                style: None,
                alignment: Some(Alignment::Justify),
                line_spacing: Some(typography.body_line_spacing),
                space_after_pt: Some(typography.body_space_after_pt),
            },
            RunFormat {
                font: Some(typography.font.clone()),
                size_pt: Some(typography.body_size_pt),
                bold: None,
            },
        ),
    };

    paragraph_format.apply(paragraph);
    for run in paragraph.runs_mut() {
        run_format.apply(run);
    }
}
