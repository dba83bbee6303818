//! End-to-end builds through the file system

use std::path::{Path, PathBuf};

use blackbook_compose::{
    BuildRequest, CodeListing, Composer, ComposerConfig, GeneratedSection, MediaItem,
    PlagiarismReport, ReferenceEntry, StudentMeta, TemplateDescriptor,
};
use blackbook_ooxml::test_utils::{create_template_with_body, png_bytes};
use blackbook_ooxml::{OoxmlArchive, Paragraph, Template};
use tempfile::TempDir;

const COVER: &str = r#"<w:p><w:r><w:t>Name: [[student_name]]</w:t></w:r></w:p><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Project: [[project_</w:t></w:r><w:r><w:t>title]]</w:t></w:r></w:p><w:p><w:r><w:t>Guided by [[guide_name]], [[year]]</w:t></w:r></w:p><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Introduction</w:t></w:r></w:p><w:p><w:r><w:t>[[doc_introduction]]</w:t></w:r></w:p>"#;

const SECT: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn template(&self, body: &str) -> TemplateDescriptor {
        let path = self.path("template.docx");
        std::fs::write(&path, create_template_with_body(&format!("{body}{SECT}")).unwrap())
            .unwrap();
        TemplateDescriptor::new("template.docx", "Test", path)
    }

    fn png(&self, name: &str, w: u32, h: u32) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, png_bytes(w, h).unwrap()).unwrap();
        path
    }

    fn composer(&self) -> Composer {
        Composer::new(ComposerConfig::default().with_output_dir(self.path("generated")))
    }
}

fn student() -> StudentMeta {
    StudentMeta {
        name: "Asha Rao".into(),
        project_title: "Library Manager".into(),
        professor_name: "Dr. Mehta".into(),
        guide_name: "Mr. Iyer".into(),
        year: "2024".into(),
    }
}

fn texts(path: &Path) -> Vec<String> {
    Template::load(path)
        .unwrap()
        .document()
        .tree
        .iter()
        .filter_map(|(_, b)| b.as_paragraph().map(Paragraph::text))
        .collect()
}

fn part(path: &Path, name: &str) -> Option<Vec<u8>> {
    OoxmlArchive::open(path).unwrap().get(name).map(<[u8]>::to_vec)
}

#[test]
fn test_full_build() {
    let ws = Workspace::new();
    let body = format!(
        "{COVER}{}{}",
        r#"<w:p><w:r><w:t>[[CODE_IMPLEMENTATION_BLOCK]]</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>[[er_diagram]]</w:t></w:r></w:p>"#
    );
    let mut request = BuildRequest::new(ws.template(&body));
    request.student = student();
    request.sections = vec![GeneratedSection::new(
        "doc_introduction",
        "This project manages a library.",
    )];
    request.code = vec![CodeListing::new("app.py", "print('hi')")];
    request.diagrams = vec![MediaItem::diagram("ER Diagram", ws.png("er.png", 1600, 900))];
    request.references = vec![ReferenceEntry::new(Some("Flask"), "https://flask.palletsprojects.com")];

    let output = ws.composer().generate(&request).unwrap();
    let texts = texts(&output.path);

    assert_eq!(
        texts,
        vec![
            "Name: Asha Rao",
            "Project: Library Manager",
            "Guided by Mr. Iyer, 2024",
            "Introduction",
            "This project manages a library.",
            "",
            "APP.PY",
            "print('hi')",
            "",
            "ER Diagram",
            "",
            "Figure 1: ER Diagram",
            "Table of Contents",
            "Update field to populate TOC.",
            "References",
            "1. Flask - https://flask.palletsprojects.com",
        ]
    );

    let document = String::from_utf8(part(&output.path, "word/document.xml").unwrap()).unwrap();
    assert!(!document.contains("[["));
    assert!(document.contains(r#"<wp:extent cx="5669280" cy="3188970"/>"#));
    assert!(document.contains(r#"<w:jc w:val="both"/>"#));
    assert!(document.contains(r#"<w:footerReference w:type="default""#));

    let footer = part(&output.path, "word/footer1.xml").unwrap();
    assert!(String::from_utf8(footer).unwrap().contains(">PAGE</w:instrText>"));
    assert!(part(&output.path, "word/media/blackbook_image1.png").is_some());
}

#[test]
fn test_empty_inputs_add_no_sections() {
    let ws = Workspace::new();
    let mut request = BuildRequest::new(ws.template(COVER));
    request.student = student();

    let output = ws.composer().generate(&request).unwrap();
    let texts = texts(&output.path);

    assert_eq!(texts.len(), 5 + 2);
    assert_eq!(&texts[5..], &["Table of Contents", "Update field to populate TOC."]);
    for heading in ["Code Implementation", "Screenshots", "Diagrams", "References"] {
        assert!(!texts.iter().any(|t| t == heading), "{heading}");
    }
    assert_eq!(texts[4], "", "missing sections substitute the empty string");
}

#[test]
fn test_diagrams_without_anchor_get_trailing_section() {
    let ws = Workspace::new();
    let mut request = BuildRequest::new(ws.template(COVER));
    request.diagrams = vec![
        MediaItem::diagram("Use case", ws.png("uc.png", 30, 20)),
        MediaItem::diagram("Class", ws.png("class.png", 20, 30)),
        MediaItem::diagram("Sequence", ws.png("seq.png", 10, 10)),
    ];

    let output = ws.composer().generate(&request).unwrap();
    let texts = texts(&output.path);

    let start = texts.iter().position(|t| t == "Diagrams").unwrap();
    let captions: Vec<&str> = texts[start..]
        .iter()
        .map(String::as_str)
        .filter(|t| t.starts_with("Figure "))
        .collect();
    assert_eq!(
        captions,
        vec!["Figure 1: Use case", "Figure 2: Class", "Figure 3: Sequence"]
    );
    let archive = OoxmlArchive::open(&output.path).unwrap();
    assert_eq!(
        archive
            .file_list()
            .filter(|f| f.starts_with("word/media/"))
            .count(),
        3
    );
}

#[test]
fn test_control_bytes_in_code_are_dropped() {
    let ws = Workspace::new();
    let body = r#"<w:p><w:r><w:t>[[CODE_IMPLEMENTATION_BLOCK]]</w:t></w:r></w:p>"#;
    let source = ws.path("dump.c");
    std::fs::write(&source, b"int x = 1;\x00\x01\x1b[0m\nreturn x;\xff\n").unwrap();

    let mut request = BuildRequest::new(ws.template(body));
    request.code = vec![CodeListing::from_path(&source).unwrap()];

    let output = ws.composer().generate(&request).unwrap();
    let document = String::from_utf8(part(&output.path, "word/document.xml").unwrap()).unwrap();
    assert!(!document
        .chars()
        .any(|c| matches!(c, '\u{0}' | '\u{1}' | '\u{1b}')));
    assert!(document.contains("int x = 1;[0m"));
    assert!(texts(&output.path).contains(&"DUMP.C".to_string()));
}

#[test]
fn test_plagiarism_pdf_attached_by_name() {
    let ws = Workspace::new();
    let body = r#"<w:p><w:r><w:t>[[plagiarism_report]]</w:t></w:r></w:p>"#;
    let pdf = ws.path("turnitin.pdf");
    std::fs::write(&pdf, b"%PDF-1.7").unwrap();

    let mut request = BuildRequest::new(ws.template(body));
    request.plagiarism = Some(PlagiarismReport::new("turnitin.pdf", pdf));

    let output = ws.composer().generate(&request).unwrap();
    assert!(texts(&output.path).contains(&"[Plagiarism report attached: turnitin.pdf]".to_string()));
    let archive = OoxmlArchive::open(&output.path).unwrap();
    assert!(!archive.file_list().any(|f| f.starts_with("word/media/")));
}

#[test]
fn test_identical_builds_get_distinct_files() {
    let ws = Workspace::new();
    let request = BuildRequest::new(ws.template(COVER));
    let composer = ws.composer();

    let first = composer.generate(&request).unwrap();
    let second = composer.generate(&request).unwrap();
    assert_ne!(first.filename, second.filename);
    assert!(first.path.is_file() && second.path.is_file());
}

#[test]
fn test_unrelated_parts_are_byte_identical() {
    let ws = Workspace::new();
    let mut request = BuildRequest::new(ws.template(COVER));
    request.screenshots = vec![MediaItem::screenshot("Home", ws.png("home.png", 8, 8))];
    let template_path = request.template.path.clone();

    let output = ws.composer().generate(&request).unwrap();
    for name in ["word/styles.xml", "_rels/.rels"] {
        assert_eq!(
            part(&template_path, name),
            part(&output.path, name),
            "{name} changed"
        );
    }
}

#[test]
fn test_broken_screenshot_does_not_fail_build() {
    let ws = Workspace::new();
    let body = r#"<w:p><w:r><w:t>[[SCREENSHOT_BLOCK]]</w:t></w:r></w:p>"#;
    let broken = ws.path("broken.png");
    std::fs::write(&broken, b"\x89PNG truncated").unwrap();

    let mut request = BuildRequest::new(ws.template(body));
    request.screenshots = vec![
        MediaItem::screenshot("Broken", broken),
        MediaItem::screenshot("Dashboard", ws.png("dash.png", 16, 9)),
    ];

    let output = ws.composer().generate(&request).unwrap();
    let texts = texts(&output.path);
    assert_eq!(&texts[..4], &["", "[Image skipped: Broken]", "Dashboard", ""]);
}
