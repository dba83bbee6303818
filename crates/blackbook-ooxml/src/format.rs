//! Direct paragraph and run formatting
//!
//! Writes `w:pPr` / `w:rPr` children in schema order so edited properties
//! stay valid when the template already carries some of them.

use crate::document::{Paragraph, Run};
use crate::xml::XmlElement;

/// Child order of `w:pPr`
pub const PPR_ORDER: &[&str] = &[
    "pStyle",
    "keepNext",
    "keepLines",
    "pageBreakBefore",
    "framePr",
    "widowControl",
    "numPr",
    "suppressLineNumbers",
    "pBdr",
    "shd",
    "tabs",
    "suppressAutoHyphens",
    "kinsoku",
    "wordWrap",
    "overflowPunct",
    "topLinePunct",
    "autoSpaceDE",
    "autoSpaceDN",
    "bidi",
    "adjustRightInd",
    "snapToGrid",
    "spacing",
    "ind",
    "contextualSpacing",
    "mirrorIndents",
    "suppressOverlap",
    "jc",
    "textDirection",
    "textAlignment",
    "textboxTightWrap",
    "outlineLvl",
    "divId",
    "cnfStyle",
    "rPr",
    "sectPr",
    "pPrChange",
];

/// Child order of `w:rPr`
pub const RPR_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
];

/// Horizontal paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Value of `w:jc/@w:val`
    pub fn as_jc(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Paragraph-level direct formatting; `None` leaves a property untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphFormat {
    /// Paragraph style id
    pub style: Option<String>,
    pub alignment: Option<Alignment>,
    /// Line spacing as a multiple of single spacing
    pub line_spacing: Option<f32>,
    /// Space after the paragraph in points
    pub space_after_pt: Option<f32>,
}

/// Run-level direct formatting; `None` leaves a property untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFormat {
    /// Font family applied to every script slot
    pub font: Option<String>,
    /// Size in points
    pub size_pt: Option<f32>,
    pub bold: Option<bool>,
}

impl ParagraphFormat {
    /// Apply to a paragraph's properties
    pub fn apply(&self, paragraph: &mut Paragraph) {
        let ppr = paragraph.properties_mut();
        if let Some(style) = &self.style {
            ppr.ensure_child("w:pStyle", PPR_ORDER)
                .set_attr("w:val", style.as_str());
        }
        if self.line_spacing.is_some() || self.space_after_pt.is_some() {
            let spacing = ppr.ensure_child("w:spacing", PPR_ORDER);
            if let Some(after) = self.space_after_pt {
                spacing.set_attr("w:after", twips(after).to_string());
            }
            if let Some(multiple) = self.line_spacing {
                spacing.set_attr("w:line", ((multiple * 240.0).round() as i64).to_string());
                spacing.set_attr("w:lineRule", "auto");
            }
        }
        if let Some(alignment) = self.alignment {
            ppr.ensure_child("w:jc", PPR_ORDER)
                .set_attr("w:val", alignment.as_jc());
        }
    }
}

impl RunFormat {
    /// Apply to a run's properties
    pub fn apply(&self, run: &mut Run) {
        self.apply_to(run.properties_mut());
    }

    /// Apply to a bare `w:rPr` element
    pub fn apply_to(&self, rpr: &mut XmlElement) {
        if let Some(font) = &self.font {
            let fonts = rpr.ensure_child("w:rFonts", RPR_ORDER);
            for slot in ["w:ascii", "w:hAnsi", "w:eastAsia", "w:cs"] {
                fonts.set_attr(slot, font.as_str());
            }
        }
        if let Some(bold) = self.bold {
            let b = rpr.ensure_child("w:b", RPR_ORDER);
            b.attrs.clear();
            if !bold {
                b.set_attr("w:val", "0");
            }
        }
        if let Some(size) = self.size_pt {
            let half_points = ((size * 2.0).round() as i64).to_string();
            rpr.ensure_child("w:sz", RPR_ORDER)
                .set_attr("w:val", half_points.as_str());
            rpr.ensure_child("w:szCs", RPR_ORDER)
                .set_attr("w:val", half_points);
        }
    }

    /// Build a fresh `w:rPr` element
    pub fn to_element(&self) -> XmlElement {
        let mut rpr = XmlElement::new("w:rPr");
        self.apply_to(&mut rpr);
        rpr
    }
}

/// Points to twentieths of a point
fn twips(points: f32) -> i64 {
    (points * 20.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_fragment;

    #[test]
    fn test_paragraph_format_in_schema_order() {
        let mut p = Paragraph::from_element(
            parse_fragment(r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:rPr><w:i/></w:rPr></w:pPr></w:p>"#)
                .unwrap(),
        );
        ParagraphFormat {
            style: None,
            alignment: Some(Alignment::Justify),
            line_spacing: Some(1.5),
            space_after_pt: Some(8.0),
        }
        .apply(&mut p);

        let xml = p.to_element().to_xml();
        assert_eq!(
            xml,
            r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:spacing w:after="160" w:line="360" w:lineRule="auto"/><w:jc w:val="both"/><w:rPr><w:i/></w:rPr></w:pPr></w:p>"#
        );
    }

    #[test]
    fn test_run_format_sets_fonts_and_size() {
        let mut run = Run::new("x");
        RunFormat {
            font: Some("Times New Roman".to_string()),
            size_pt: Some(12.0),
            bold: Some(true),
        }
        .apply(&mut run);

        let rpr = run.properties.as_ref().unwrap();
        let names: Vec<&str> = rpr.elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["rFonts", "b", "sz", "szCs"]);
        let fonts = rpr.child("rFonts").unwrap();
        assert_eq!(fonts.attr("w:eastAsia"), Some("Times New Roman"));
        assert_eq!(rpr.child("sz").and_then(|e| e.attr("w:val")), Some("24"));
    }

    #[test]
    fn test_bold_false_overrides_inherited() {
        let rpr = RunFormat {
            bold: Some(false),
            ..RunFormat::default()
        }
        .to_element();
        assert_eq!(rpr.to_xml(), r#"<w:rPr><w:b w:val="0"/></w:rPr>"#);
    }

    #[test]
    fn test_reapplying_does_not_duplicate() {
        let format = RunFormat {
            size_pt: Some(10.0),
            ..RunFormat::default()
        };
        let mut rpr = format.to_element();
        format.apply_to(&mut rpr);
        assert_eq!(rpr.elements().count(), 2);
    }
}
