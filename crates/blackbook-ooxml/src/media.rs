//! Embedded pictures
//!
//! Pictures are embedded as inline drawings:
//!
//! ```xml
//! <w:drawing>
//!   <wp:inline>
//!     <wp:extent cx="..." cy="..."/>           <!-- Dimensions in EMUs -->
//!     <wp:docPr id="..." name="..."/>
//!     <a:graphic>
//!       <a:graphicData uri="...picture">
//!         <pic:pic>
//!           <pic:blipFill><a:blip r:embed="rIdNN"/></pic:blipFill>
//!         </pic:pic>
//!       </a:graphicData>
//!     </a:graphic>
//!   </wp:inline>
//! </w:drawing>
//! ```
//!
//! Source files are probed with the `image` crate. Formats Word renders
//! natively are embedded byte for byte; anything else the decoder
//! understands (WebP, for one) is re-encoded as PNG.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader};

use crate::document::Run;
use crate::error::{OoxmlError, Result};
use crate::xml::{escape_attr, parse_fragment, XmlNode};

/// EMUs per inch (914400)
pub const EMU_PER_INCH: i64 = 914400;

/// Convert inches to EMUs
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

/// Convert EMUs to inches
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMU_PER_INCH as f64
}

/// Get the MIME content type for an image extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "tiff" | "tif" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Picture data ready to be stored under `word/media/`
#[derive(Debug, Clone)]
pub struct MediaImage {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// File extension matching the encoding
    pub extension: &'static str,
    /// Pixel width
    pub width_px: u32,
    /// Pixel height
    pub height_px: u32,
}

impl MediaImage {
    /// Read and probe a picture from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Probe encoded picture bytes, re-encoding to PNG when needed
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| OoxmlError::Image("unrecognised image format".to_string()))?;

        if let Some(extension) = native_extension(format) {
            let (width_px, height_px) = reader.into_dimensions()?;
            return Ok(Self {
                bytes,
                extension,
                width_px,
                height_px,
            });
        }

        let decoded = reader.decode()?;
        let mut png = Vec::new();
        decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        log::debug!("Re-encoded {:?} picture as PNG", format);
        Ok(Self {
            bytes: png,
            extension: "png",
            width_px: decoded.width(),
            height_px: decoded.height(),
        })
    }

    /// MIME type of the stored bytes
    pub fn content_type(&self) -> &'static str {
        content_type_for_extension(self.extension)
    }
}

fn native_extension(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpeg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::Tiff => Some("tiff"),
        _ => None,
    }
}

/// Placement of an inline picture
#[derive(Debug, Clone, PartialEq)]
pub struct InlinePicture {
    /// Drawing object id, unique within the document
    pub id: u32,
    /// Relationship id of the media part
    pub rel_id: String,
    /// Object name shown in Word's selection pane
    pub name: String,
    /// Width in EMUs
    pub width_emu: i64,
    /// Height in EMUs
    pub height_emu: i64,
}

impl InlinePicture {
    /// Drawing markup (`w:drawing`) for this picture
    pub fn to_xml(&self) -> String {
        let name = escape_attr(&self.name);
        let mut xml = String::new();
        xml.push_str("<w:drawing>");
        xml.push_str(
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
        );
        xml.push_str(&format!(
            r#"<wp:extent cx="{}" cy="{}"/>"#,
            self.width_emu, self.height_emu
        ));
        xml.push_str(r#"<wp:effectExtent l="0" t="0" r="0" b="0"/>"#);
        xml.push_str(&format!(
            r#"<wp:docPr id="{}" name="{}"/>"#,
            self.id, name
        ));
        xml.push_str(r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#);
        xml.push_str(
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
        );
        xml.push_str(
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
        );
        xml.push_str(
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
        );
        xml.push_str(&format!(
            r#"<pic:nvPicPr><pic:cNvPr id="{}" name="{}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            self.id, name
        ));
        xml.push_str(&format!(
            r#"<pic:blipFill><a:blip r:embed="{}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            escape_attr(&self.rel_id)
        ));
        xml.push_str(&format!(
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            self.width_emu, self.height_emu
        ));
        xml.push_str("</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>");
        xml
    }

    /// A run holding the drawing
    pub fn to_run(&self) -> Result<Run> {
        let drawing = parse_fragment(&self.to_xml())?;
        Ok(Run::from_content(XmlNode::Element(drawing)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::encode_picture;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        encode_picture(width, height, format).unwrap()
    }

    #[test]
    fn test_inches_to_emu() {
        assert_eq!(inches_to_emu(1.0), 914400);
        assert_eq!(inches_to_emu(6.2), 5669280);
        assert!((emu_to_inches(914400) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("png"), "image/png");
        assert_eq!(content_type_for_extension("PNG"), "image/png");
        assert_eq!(content_type_for_extension("jpg"), "image/jpeg");
        assert_eq!(content_type_for_extension("bmp"), "image/bmp");
        assert_eq!(content_type_for_extension("xyz"), "application/octet-stream");
    }

    #[test]
    fn test_png_kept_verbatim() {
        let bytes = encoded(40, 20, ImageFormat::Png);
        let media = MediaImage::from_bytes(bytes.clone()).unwrap();
        assert_eq!(media.extension, "png");
        assert_eq!((media.width_px, media.height_px), (40, 20));
        assert_eq!(media.bytes, bytes);
    }

    #[test]
    fn test_jpeg_probed() {
        let media = MediaImage::from_bytes(encoded(16, 32, ImageFormat::Jpeg)).unwrap();
        assert_eq!(media.extension, "jpeg");
        assert_eq!(media.content_type(), "image/jpeg");
        assert_eq!((media.width_px, media.height_px), (16, 32));
    }

    #[test]
    fn test_webp_reencoded_as_png() {
        let media = MediaImage::from_bytes(encoded(10, 12, ImageFormat::WebP)).unwrap();
        assert_eq!(media.extension, "png");
        assert_eq!((media.width_px, media.height_px), (10, 12));
        assert!(media.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(MediaImage::from_bytes(b"%PDF-1.4 not an image".to_vec()).is_err());
        assert!(MediaImage::from_bytes(Vec::new()).is_err());
    }

    #[test]
    fn test_inline_picture_markup() {
        let picture = InlinePicture {
            id: 3,
            rel_id: "rId9".to_string(),
            name: "Figure <1>".to_string(),
            width_emu: 5669280,
            height_emu: 3188970,
        };
        let run = picture.to_run().unwrap();
        let xml = run.to_element().to_xml();
        assert!(xml.starts_with("<w:r><w:drawing>"));
        assert!(xml.contains(r#"<wp:extent cx="5669280" cy="3188970"/>"#));
        assert!(xml.contains(r#"<wp:docPr id="3" name="Figure &lt;1&gt;"/>"#));
        assert!(xml.contains(r#"r:embed="rId9""#));
        assert!(run.text().is_empty());
    }
}
