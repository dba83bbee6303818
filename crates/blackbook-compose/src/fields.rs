//! Dynamic fields: table of contents and page numbers
//!
//! Both are complex fields (`w:fldChar` begin/separate/end). Their results
//! are left for the viewing application to compute.

use blackbook_ooxml::{
    Alignment, Block, Origin, Paragraph, ParagraphFormat, Run, RunContent, Template, XmlElement,
    XmlNode,
};

use crate::blocks::BlockBuilder;
use crate::config::ComposerConfig;
use crate::error::Result;

/// Field instruction of the generated table of contents
pub const TOC_INSTRUCTION: &str = r#"TOC \o "1-3" \h \z \u"#;

/// Field instruction of the footer page number
pub const PAGE_INSTRUCTION: &str = "PAGE";

fn fld_char(kind: &str) -> RunContent {
    RunContent::Other(XmlNode::Element(
        XmlElement::new("w:fldChar").with_attr("w:fldCharType", kind),
    ))
}

fn instr_text(instruction: &str) -> RunContent {
    RunContent::Other(XmlNode::Element(
        XmlElement::new("w:instrText")
            .with_attr("xml:space", "preserve")
            .with_text(instruction),
    ))
}

/// One run holding a whole TOC field with placeholder result text
pub fn toc_field_run(placeholder: &str) -> Run {
    Run {
        content: vec![
            fld_char("begin"),
            instr_text(TOC_INSTRUCTION),
            fld_char("separate"),
            RunContent::Text(placeholder.to_string()),
            fld_char("end"),
        ],
        ..Run::default()
    }
}

/// Runs of a `PAGE` field without a cached result
pub fn page_field_runs() -> [Run; 3] {
    let run = |item| Run {
        content: vec![item],
        ..Run::default()
    };
    [
        run(fld_char("begin")),
        run(instr_text(PAGE_INSTRUCTION)),
        run(fld_char("end")),
    ]
}

/// Append a "Table of Contents" heading and the TOC field to the body
pub fn append_table_of_contents(template: &mut Template, config: &ComposerConfig) {
    let blocks = BlockBuilder::new(&config.typography);
    let heading = blocks.heading(&config.labels.table_of_contents, 1);
    let field = Paragraph::with_run(toc_field_run(&config.labels.toc_placeholder));

    let tree = &mut template.document_mut().tree;
    tree.push_back(Block::Paragraph(heading), Origin::Generated);
    tree.push_back(Block::Paragraph(field), Origin::Generated);
}

/// Center a `PAGE` field in the first paragraph of the default footer.
///
/// The footer is created when the template has none. A footer that already
/// shows a page number is left alone.
pub fn add_page_number(template: &mut Template) -> Result<()> {
    let footer = template.default_footer_mut()?;
    let tree = &mut footer.tree;

    let first = tree
        .iter()
        .find(|(_, block)| block.as_paragraph().is_some())
        .map(|(id, _)| id);
    let id = match first {
        Some(id) => id,
        None => tree.push_back(Block::Paragraph(Paragraph::new()), Origin::Generated),
    };

    let Some(paragraph) = tree.get_mut(id).and_then(Block::as_paragraph_mut) else {
        return Ok(());
    };
    if has_page_field(paragraph) {
        log::debug!("Footer already carries a PAGE field");
        return Ok(());
    }

    ParagraphFormat {
        alignment: Some(Alignment::Center),
        ..ParagraphFormat::default()
    }
    .apply(paragraph);
    for run in page_field_runs() {
        paragraph.push_run(run);
    }
    Ok(())
}

fn has_page_field(paragraph: &Paragraph) -> bool {
    let mut found = false;
    paragraph.to_element().for_each_element(&mut |e| {
        let instruction = if e.is("instrText") {
            Some(e.text())
        } else if e.is("fldSimple") {
            e.attr("w:instr").map(str::to_string)
        } else {
            None
        };
        if instruction.is_some_and(|i| i.split_whitespace().next() == Some(PAGE_INSTRUCTION)) {
            found = true;
        }
    });
    found
}

/// Table of contents plus footer page number
pub fn generate_fields(template: &mut Template, config: &ComposerConfig) -> Result<()> {
    append_table_of_contents(template, config);
    add_page_number(template)?;
    log::info!("Added table of contents and page number fields");
    Ok(())
}
