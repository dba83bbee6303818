//! Block injection
//!
//! Finds structural anchors in body-level paragraphs and inserts generated
//! blocks (code listings, screenshots, diagram figures, the plagiarism
//! report) directly after them, in input order. The anchor paragraph keeps
//! its other text; only the anchor tokens are removed.
//!
//! When a template has no anchor of a kind but the request carries items of
//! that kind, they go into a trailing Heading 1 section instead.
//!
//! A picture that cannot be read or decoded never fails the build: it is
//! logged and replaced by a short centered note.

use std::path::Path;

use blackbook_ooxml::{Alignment, Block, BlockId, MediaImage, Origin, Paragraph, Run, Template};

use crate::blocks::BlockBuilder;
use crate::config::{ComposerConfig, SectionLabels};
use crate::error::{ComposeError, Result};
use crate::fit::ImageBox;
use crate::matcher::DiagramMatcher;
use crate::model::{BuildRequest, CodeListing, MediaItem, MediaKind, PlagiarismReport};
use crate::sanitize::sanitize;
use crate::substitute::remove_tokens;

/// Code listing anchor
pub const CODE_ANCHORS: [&str; 1] = ["[[CODE_IMPLEMENTATION_BLOCK]]"];

/// Screenshot anchors
pub const SCREENSHOT_ANCHORS: [&str; 2] = ["[[SCREENSHOT_BLOCK]]", "[[screenshot_block]]"];

/// Generic diagram anchor; takes every diagram not yet placed
pub const DIAGRAM_ANCHOR: &str = "[[DIAGRAM_BLOCK]]";

/// Plagiarism report anchors, misspellings included
pub const PLAGIARISM_ANCHORS: [&str; 4] = [
    "[[plagiarism_report]]",
    "[[plagarism_report]]",
    "[[PLAGIARISM_REPORT]]",
    "[[PLAGARISM_REPORT]]",
];

/// What an injection pass placed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionSummary {
    pub listings: usize,
    pub screenshots: usize,
    /// Numbered figures (diagrams and the plagiarism image)
    pub figures: u32,
    /// Notes standing in for skipped or attached media
    pub notes: usize,
    /// Titles of trailing sections added for kinds without anchors
    pub fallback_sections: Vec<String>,
}

/// Run the injection pass over the template's body
pub fn inject(
    template: &mut Template,
    request: &BuildRequest,
    config: &ComposerConfig,
) -> Result<InjectionSummary> {
    let aliases = config.alias_table();
    let kind_tokens: Vec<(String, String)> = aliases
        .kinds()
        .map(|kind| (kind.to_string(), format!("[[{kind}]]")))
        .collect();
    let mut matcher = DiagramMatcher::new(&aliases, &request.diagrams);

    let mut injector = Injector {
        template,
        blocks: BlockBuilder::new(&config.typography),
        image_box: config.image_box,
        labels: &config.labels,
        next_figure: 1,
        summary: InjectionSummary::default(),
    };

    let anchors = injector.snapshot();
    let mut seen = AnchorCounts::default();

    for (id, text) in anchors {
        let lowered = text.to_ascii_lowercase();
        let mut cursor = id;
        let mut tokens: Vec<&str> = Vec::new();

        if contains_any(&lowered, &CODE_ANCHORS) {
            seen.code += 1;
            tokens.extend(CODE_ANCHORS);
            let paragraphs = injector.code_blocks(&request.code);
            cursor = injector.insert(cursor, paragraphs)?;
        }

        if contains_any(&lowered, &SCREENSHOT_ANCHORS) {
            seen.screenshots += 1;
            tokens.extend(SCREENSHOT_ANCHORS);
            for item in &request.screenshots {
                let paragraphs = injector.media_blocks(item);
                cursor = injector.insert(cursor, paragraphs)?;
            }
        }

        let specific = kinds_in_order(&lowered, &kind_tokens);
        let generic = lowered.contains(&DIAGRAM_ANCHOR.to_ascii_lowercase());
        if generic || !specific.is_empty() {
            seen.diagrams += 1;
            tokens.push(DIAGRAM_ANCHOR);
            tokens.extend(kind_tokens.iter().map(|(_, token)| token.as_str()));

            let targets = if specific.is_empty() {
                matcher.take_remaining()
            } else {
                specific
                    .iter()
                    .filter_map(|kind| {
                        let hit = matcher.match_kind(kind);
                        if hit.is_none() {
                            log::debug!("No diagram matches anchor [[{}]]", kind);
                        }
                        hit
                    })
                    .collect()
            };
            for index in targets {
                let paragraphs = injector.media_blocks(&request.diagrams[index]);
                cursor = injector.insert(cursor, paragraphs)?;
            }
        }

        if contains_any(&lowered, &PLAGIARISM_ANCHORS) {
            seen.plagiarism += 1;
            tokens.extend(PLAGIARISM_ANCHORS);
            if let Some(report) = &request.plagiarism {
                let paragraphs = injector.plagiarism_blocks(report);
                injector.insert(cursor, paragraphs)?;
            }
        }

        if !tokens.is_empty() {
            injector.strip_anchor(id, &tokens);
        }
    }

    // Kinds with items but no anchor anywhere in the template
    if seen.code == 0 && !request.code.is_empty() {
        let cursor = injector.append_section(&config.labels.code);
        let paragraphs = injector.code_blocks(&request.code);
        injector.insert(cursor, paragraphs)?;
    }

    if seen.screenshots == 0 && !request.screenshots.is_empty() {
        let mut cursor = injector.append_section(&config.labels.screenshots);
        for item in &request.screenshots {
            let paragraphs = injector.media_blocks(item);
            cursor = injector.insert(cursor, paragraphs)?;
        }
    }

    if seen.diagrams == 0 && !request.diagrams.is_empty() {
        let mut cursor = injector.append_section(&config.labels.diagrams);
        for index in matcher.take_remaining() {
            let paragraphs = injector.media_blocks(&request.diagrams[index]);
            cursor = injector.insert(cursor, paragraphs)?;
        }
    }

    if seen.plagiarism == 0 {
        if let Some(report) = &request.plagiarism {
            let cursor = injector.append_section(&report.title);
            let paragraphs = injector.plagiarism_blocks(report);
            injector.insert(cursor, paragraphs)?;
        }
    }

    log::info!(
        "Injected {} listings, {} screenshots, {} figures ({} notes)",
        injector.summary.listings,
        injector.summary.screenshots,
        injector.summary.figures,
        injector.summary.notes
    );
    Ok(injector.summary)
}

#[derive(Debug, Default)]
struct AnchorCounts {
    code: usize,
    screenshots: usize,
    diagrams: usize,
    plagiarism: usize,
}

struct Injector<'a> {
    template: &'a mut Template,
    blocks: BlockBuilder<'a>,
    image_box: ImageBox,
    labels: &'a SectionLabels,
    next_figure: u32,
    summary: InjectionSummary,
}

impl Injector<'_> {
    /// Template paragraphs of the body with their text, before any insertion
    fn snapshot(&self) -> Vec<(BlockId, String)> {
        let tree = &self.template.document().tree;
        tree.iter()
            .filter(|(id, _)| tree.origin(*id) == Some(Origin::Template))
            .filter_map(|(id, block)| block.as_paragraph().map(|p| (id, p.text())))
            .collect()
    }

    fn insert(&mut self, after: BlockId, paragraphs: Vec<Paragraph>) -> Result<BlockId> {
        let blocks = paragraphs.into_iter().map(Block::Paragraph).collect();
        Ok(self
            .template
            .document_mut()
            .tree
            .insert_after(after, blocks, Origin::Generated)?)
    }

    fn append_section(&mut self, title: &str) -> BlockId {
        log::debug!("Appending fallback section '{}'", title);
        self.summary.fallback_sections.push(title.to_string());
        let heading = self.blocks.heading(title, 1);
        self.template
            .document_mut()
            .tree
            .push_back(Block::Paragraph(heading), Origin::Generated)
    }

    fn strip_anchor(&mut self, id: BlockId, tokens: &[&str]) {
        if let Some(paragraph) = self
            .template
            .document_mut()
            .tree
            .get_mut(id)
            .and_then(Block::as_paragraph_mut)
        {
            remove_tokens(paragraph, tokens);
        }
    }

    fn code_blocks(&mut self, code: &[CodeListing]) -> Vec<Paragraph> {
        let mut paragraphs = Vec::with_capacity(code.len() * 2);
        for listing in code {
            log::debug!(
                "Code listing {} ({}, {} lines)",
                listing.filename,
                listing.language,
                listing.line_count
            );
            paragraphs.extend(self.blocks.code_listing(&listing.filename, &listing.content));
            self.summary.listings += 1;
        }
        paragraphs
    }

    /// Blocks for one uploaded picture, by kind
    fn media_blocks(&mut self, item: &MediaItem) -> Vec<Paragraph> {
        match item.kind {
            MediaKind::Screenshot => {
                let title = if item.display_name.trim().is_empty() {
                    self.labels.screenshot.clone()
                } else {
                    item.display_name.clone()
                };
                match self.picture(&item.path, &title) {
                    Ok(run) => {
                        self.summary.screenshots += 1;
                        vec![
                            self.blocks.label(&title, Alignment::Left),
                            self.blocks.picture(run),
                        ]
                    }
                    Err(err) => {
                        log::warn!("{}", err);
                        let name = or(&item.display_name, "screenshot");
                        vec![self.note(&format!("[Image skipped: {name}]"))]
                    }
                }
            }
            MediaKind::Diagram => {
                let mut paragraphs = vec![self.blocks.label(&item.display_name, Alignment::Center)];
                match self.figure(&item.path, &item.display_name) {
                    Ok(figure) => paragraphs.extend(figure),
                    Err(err) => {
                        log::warn!("{}", err);
                        let name = or(&item.display_name, "diagram");
                        paragraphs.push(self.note(&format!("[Diagram skipped: {name}]")));
                    }
                }
                paragraphs
            }
            MediaKind::Plagiarism => match self.figure(&item.path, &item.display_name) {
                Ok(figure) => figure.into(),
                Err(err) => {
                    log::warn!("{}", err);
                    vec![self.note("[Plagiarism report image skipped]")]
                }
            },
        }
    }

    fn plagiarism_blocks(&mut self, report: &PlagiarismReport) -> Vec<Paragraph> {
        if !report.is_embeddable() {
            log::debug!("Plagiarism report {} attached by name", report.name);
            return vec![self.note(&format!("[Plagiarism report attached: {}]", report.name))];
        }
        let item = MediaItem {
            display_name: report.title.clone(),
            path: report.path.clone(),
            kind: MediaKind::Plagiarism,
        };
        self.media_blocks(&item)
    }

    /// Picture paragraph plus numbered caption; the counter only advances
    /// when the picture was embedded
    fn figure(&mut self, path: &Path, caption: &str) -> Result<[Paragraph; 2]> {
        let run = self.picture(path, caption)?;
        let number = self.next_figure;
        self.next_figure += 1;
        self.summary.figures += 1;
        Ok([self.blocks.picture(run), self.blocks.caption(number, caption)])
    }

    fn picture(&mut self, path: &Path, name: &str) -> Result<Run> {
        // Lands in the docPr and cNvPr name attributes
        let name = sanitize(name);
        let name = name.as_ref();
        let media =
            MediaImage::load(path).map_err(|e| ComposeError::media_insert_failure(name, e))?;
        let size = self.image_box.fit(media.width_px, media.height_px);
        log::debug!(
            "Embedding {} ({}x{} px -> {:.2}x{:.2} in)",
            path.display(),
            media.width_px,
            media.height_px,
            size.width_in,
            size.height_in
        );
        self.template
            .picture_run(&media, name, size.width_emu(), size.height_emu())
            .map_err(|e| ComposeError::media_insert_failure(name, e))
    }

    fn note(&mut self, text: &str) -> Paragraph {
        self.summary.notes += 1;
        self.blocks.note(text)
    }
}

fn contains_any(lowered: &str, tokens: &[&str]) -> bool {
    tokens
        .iter()
        .any(|token| lowered.contains(&token.to_ascii_lowercase()))
}

/// Kind-specific diagram anchors in the order they occur in the text
fn kinds_in_order(lowered: &str, kind_tokens: &[(String, String)]) -> Vec<String> {
    let mut hits: Vec<(usize, &str)> = kind_tokens
        .iter()
        .flat_map(|(kind, token)| {
            lowered
                .match_indices(token.to_ascii_lowercase().as_str())
                .map(|(at, _)| (at, kind.as_str()))
                .collect::<Vec<_>>()
        })
        .collect();
    hits.sort_by_key(|(at, _)| *at);
    hits.into_iter().map(|(_, kind)| kind.to_string()).collect()
}

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackbook_ooxml::test_utils::{create_template_with_body, png_bytes};
    use crate::model::TemplateDescriptor;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn png(&self, name: &str, w: u32, h: u32) -> std::path::PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, png_bytes(w, h).unwrap()).unwrap();
            path
        }

        fn junk(&self, name: &str) -> std::path::PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, b"not a picture").unwrap();
            path
        }
    }

    fn template(body: &str) -> Template {
        Template::from_bytes(&create_template_with_body(body).unwrap()).unwrap()
    }

    fn request() -> BuildRequest {
        BuildRequest::new(TemplateDescriptor::new("t", "T", "t.docx"))
    }

    fn texts(template: &Template) -> Vec<String> {
        template
            .document()
            .tree
            .iter()
            .filter_map(|(_, b)| b.as_paragraph().map(|p| p.text()))
            .collect()
    }

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    #[test]
    fn test_kinds_in_order() {
        let kinds = vec![
            ("er_diagram".to_string(), "[[er_diagram]]".to_string()),
            ("class_diagram".to_string(), "[[class_diagram]]".to_string()),
        ];
        assert_eq!(
            kinds_in_order("[[class_diagram]] then [[er_diagram]] [[class_diagram]]", &kinds),
            vec!["class_diagram", "er_diagram", "class_diagram"]
        );
    }

    #[test]
    fn test_code_inserted_after_anchor_in_order() {
        let mut tpl = template(&format!(
            "{}{}{}",
            para("Intro"),
            para("Listing: [[code_implementation_block]]"),
            para("Outro")
        ));
        let mut req = request();
        req.code = vec![
            CodeListing::new("a.py", "print('a')"),
            CodeListing::new("b.js", "log('b')"),
        ];

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.listings, 2);
        assert!(summary.fallback_sections.is_empty());
        assert_eq!(
            texts(&tpl),
            vec!["Intro", "Listing: ", "A.PY", "print('a')", "B.JS", "log('b')", "Outro"]
        );
    }

    #[test]
    fn test_anchor_without_items_is_removed() {
        let mut tpl = template(&para("[[SCREENSHOT_BLOCK]]"));
        let summary = inject(&mut tpl, &request(), &ComposerConfig::default()).unwrap();
        assert_eq!(texts(&tpl), vec![""]);
        assert_eq!(summary, InjectionSummary::default());
    }

    #[test]
    fn test_screenshots_and_failure_note() {
        let fx = Fixture::new();
        let mut tpl = template(&para("[[SCREENSHOT_BLOCK]]"));
        let mut req = request();
        req.screenshots = vec![
            MediaItem::screenshot("Login page", fx.png("login.png", 1600, 900)),
            MediaItem::screenshot("Broken", fx.junk("broken.png")),
            MediaItem::screenshot("", fx.png("blank.png", 10, 10)),
        ];

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.screenshots, 2);
        assert_eq!(summary.notes, 1);
        assert_eq!(summary.figures, 0);
        assert_eq!(
            texts(&tpl),
            vec!["", "Login page", "", "[Image skipped: Broken]", "Screenshot", ""]
        );
        assert_eq!(
            tpl.relationships()
                .targets_of_type(blackbook_ooxml::Relationships::TYPE_IMAGE)
                .count(),
            2
        );
    }

    #[test]
    fn test_control_characters_in_picture_names_are_stripped() {
        let fx = Fixture::new();
        let mut tpl = template(&para("[[SCREENSHOT_BLOCK]]"));
        let mut req = request();
        req.screenshots = vec![MediaItem::screenshot(
            "Login\u{1}page",
            fx.png("login.png", 64, 48),
        )];

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.screenshots, 1);

        let bytes = tpl.into_bytes().unwrap();
        let archive =
            blackbook_ooxml::OoxmlArchive::from_reader(std::io::Cursor::new(bytes)).unwrap();
        let xml = archive.get_string("word/document.xml").unwrap();
        assert!(!xml.contains('\u{1}'));
        assert!(xml.contains("name=\"Loginpage\""));
    }

    #[test]
    fn test_specific_diagram_anchors_and_generic_rest() {
        let fx = Fixture::new();
        let mut tpl = template(&format!(
            "{}{}",
            para("[[class_diagram]] and [[ER_DIAGRAM]]"),
            para("Others: [[DIAGRAM_BLOCK]]")
        ));
        let mut req = request();
        req.diagrams = vec![
            MediaItem::diagram("Entity Relationship", fx.png("er.png", 40, 20)),
            MediaItem::diagram("Flow", fx.png("activity.png", 40, 20)),
            MediaItem::diagram("Classes", fx.png("class_diagram.png", 40, 20)),
        ];

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.figures, 3);
        assert_eq!(
            texts(&tpl),
            vec![
                " and ",
                "Classes",
                "",
                "Figure 1: Classes",
                "Entity Relationship",
                "",
                "Figure 2: Entity Relationship",
                "Others: ",
                "Flow",
                "",
                "Figure 3: Flow",
            ]
        );
    }

    #[test]
    fn test_failed_diagram_keeps_counter_and_is_not_reused() {
        let fx = Fixture::new();
        let mut tpl = template(&format!("{}{}", para("[[er_diagram]]"), para("[[DIAGRAM_BLOCK]]")));
        let mut req = request();
        req.diagrams = vec![
            MediaItem::diagram("ERD", fx.junk("erd.png")),
            MediaItem::diagram("Class diagram", fx.png("c.png", 8, 8)),
        ];

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.figures, 1);
        assert_eq!(
            texts(&tpl),
            vec!["", "ERD", "[Diagram skipped: ERD]", "", "Class diagram", "", "Figure 1: Class diagram"]
        );
    }

    #[test]
    fn test_fallback_sections_when_no_anchors() {
        let fx = Fixture::new();
        let mut tpl = template(&para("Body"));
        let mut req = request();
        req.code = vec![CodeListing::new("main.c", "int main;")];
        req.diagrams = (0..3)
            .map(|i| MediaItem::diagram(format!("D{i}"), fx.png(&format!("d{i}.png"), 4, 4)))
            .collect();

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.fallback_sections, vec!["Code Implementation", "Diagrams"]);
        let texts = texts(&tpl);
        let diagrams_at = texts.iter().position(|t| t == "Diagrams").unwrap();
        let captions: Vec<&String> = texts[diagrams_at..]
            .iter()
            .filter(|t| t.starts_with("Figure"))
            .collect();
        assert_eq!(captions, vec!["Figure 1: D0", "Figure 2: D1", "Figure 3: D2"]);
        assert_eq!(&texts[..4], &["Body", "Code Implementation", "MAIN.C", "int main;"]);
    }

    #[test]
    fn test_unmatched_diagrams_dropped_when_anchors_exist() {
        let fx = Fixture::new();
        let mut tpl = template(&para("[[sequence_diagram]]"));
        let mut req = request();
        req.diagrams = vec![MediaItem::diagram("Class diagram", fx.png("c.png", 4, 4))];

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.figures, 0);
        assert!(summary.fallback_sections.is_empty());
        assert_eq!(texts(&tpl), vec![""]);
    }

    #[test]
    fn test_plagiarism_pdf_is_a_note() {
        let fx = Fixture::new();
        let pdf = fx.dir.path().join("report.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        let mut tpl = template(&para("[[plagarism_report]]"));
        let mut req = request();
        req.plagiarism = Some(PlagiarismReport::new("report.pdf", pdf));

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.figures, 0);
        assert_eq!(texts(&tpl), vec!["", "[Plagiarism report attached: report.pdf]"]);
        assert_eq!(
            tpl.relationships()
                .targets_of_type(blackbook_ooxml::Relationships::TYPE_IMAGE)
                .count(),
            0
        );
    }

    #[test]
    fn test_plagiarism_image_shares_figure_counter() {
        let fx = Fixture::new();
        let mut tpl = template(&format!("{}{}", para("[[DIAGRAM_BLOCK]]"), para("[[PLAGIARISM_REPORT]]")));
        let mut req = request();
        req.diagrams = vec![MediaItem::diagram("Flow", fx.png("flow.png", 4, 4))];
        req.plagiarism = Some(PlagiarismReport::new("check.png", fx.png("check.png", 4, 4)));

        inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        let texts = texts(&tpl);
        assert!(texts.contains(&"Figure 1: Flow".to_string()));
        assert_eq!(texts.last().unwrap(), "Figure 2: Plagiarism Report");
    }

    #[test]
    fn test_plagiarism_fallback_uses_title() {
        let fx = Fixture::new();
        let mut tpl = template(&para("Body"));
        let mut req = request();
        let mut report = PlagiarismReport::new("bad.png", fx.junk("bad.png"));
        report.title = "Originality Check".into();
        req.plagiarism = Some(report);

        let summary = inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();
        assert_eq!(summary.fallback_sections, vec!["Originality Check"]);
        assert_eq!(
            texts(&tpl),
            vec!["Body", "Originality Check", "[Plagiarism report image skipped]"]
        );
    }

    #[test]
    fn test_generated_blocks_are_tagged() {
        let mut tpl = template(&para("[[CODE_IMPLEMENTATION_BLOCK]]"));
        let mut req = request();
        req.code = vec![CodeListing::new("x.sql", "select 1;")];
        inject(&mut tpl, &req, &ComposerConfig::default()).unwrap();

        let tree = &tpl.document().tree;
        let origins: Vec<Origin> = tree.ids().into_iter().filter_map(|id| tree.origin(id)).collect();
        assert_eq!(
            origins,
            vec![Origin::Template, Origin::Generated, Origin::Generated]
        );
    }
}
