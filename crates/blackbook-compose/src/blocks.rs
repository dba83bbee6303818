//! Builders for generated paragraphs
//!
//! All generated text passes through the sanitizer here, so callers can hand
//! over user input as-is.

use blackbook_ooxml::{Alignment, Paragraph, ParagraphFormat, Run, RunFormat};

use crate::config::Typography;
use crate::sanitize::sanitize;

/// Paragraph factory bound to one typography
#[derive(Debug, Clone, Copy)]
pub struct BlockBuilder<'a> {
    typography: &'a Typography,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(typography: &'a Typography) -> Self {
        Self { typography }
    }

    /// A single-run paragraph
    pub fn text(&self, text: &str, run: RunFormat, paragraph: ParagraphFormat) -> Paragraph {
        let mut r = Run::new(&sanitize(text));
        run.apply(&mut r);
        let mut p = Paragraph::with_run(r);
        paragraph.apply(&mut p);
        p
    }

    /// `Heading<level>` paragraph, bold, left-aligned
    pub fn heading(&self, text: &str, level: u8) -> Paragraph {
        let size = if level <= 1 {
            self.typography.heading1_size_pt
        } else {
            self.typography.heading2_size_pt
        };
        self.text(
            text,
            RunFormat {
                font: Some(self.typography.font.clone()),
                size_pt: Some(size),
                bold: Some(true),
            },
            ParagraphFormat {
                style: Some(format!("Heading{}", level.max(1))),
                alignment: Some(Alignment::Left),
                ..ParagraphFormat::default()
            },
        )
    }

    /// Bold label above a screenshot or diagram
    pub fn label(&self, text: &str, alignment: Alignment) -> Paragraph {
        self.text(
            text,
            RunFormat {
                size_pt: Some(self.typography.label_size_pt),
                bold: Some(true),
                ..RunFormat::default()
            },
            aligned(alignment),
        )
    }

    /// Centered `Figure N: <text>` caption
    pub fn caption(&self, number: u32, text: &str) -> Paragraph {
        self.text(
            &format!("Figure {number}: {}", sanitize(text)),
            RunFormat {
                size_pt: Some(self.typography.caption_size_pt),
                bold: Some(false),
                ..RunFormat::default()
            },
            aligned(Alignment::Center),
        )
    }

    /// Centered small note standing in for skipped content
    pub fn note(&self, text: &str) -> Paragraph {
        self.text(
            text,
            RunFormat {
                size_pt: Some(self.typography.note_size_pt),
                bold: Some(false),
                ..RunFormat::default()
            },
            aligned(Alignment::Center),
        )
    }

    /// Centered paragraph holding a picture run
    pub fn picture(&self, run: Run) -> Paragraph {
        let mut p = Paragraph::with_run(run);
        aligned(Alignment::Center).apply(&mut p);
        p
    }

    /// Title and monospace body of a code listing
    pub fn code_listing(&self, filename: &str, content: &str) -> [Paragraph; 2] {
        let title = self.text(
            &sanitize(filename).to_uppercase(),
            RunFormat {
                size_pt: Some(self.typography.label_size_pt),
                bold: Some(true),
                ..RunFormat::default()
            },
            aligned(Alignment::Left),
        );
        let body = self.text(
            content,
            RunFormat {
                font: Some(self.typography.code_font.clone()),
                size_pt: Some(self.typography.code_size_pt),
                bold: Some(false),
            },
            ParagraphFormat {
                alignment: Some(Alignment::Left),
                line_spacing: Some(1.0),
                ..ParagraphFormat::default()
            },
        );
        [title, body]
    }
}

fn aligned(alignment: Alignment) -> ParagraphFormat {
    ParagraphFormat {
        alignment: Some(alignment),
        ..ParagraphFormat::default()
    }
}
