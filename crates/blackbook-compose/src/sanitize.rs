//! Text sanitizer
//!
//! Strips characters that cannot appear in XML 1.0 character data. Keeps
//! tab, LF, CR, U+0020..U+D7FF and U+E000..U+FFFD; everything else (C0
//! controls, U+FFFE/U+FFFF, supplementary-plane characters) is dropped.

use std::borrow::Cow;

/// True when `ch` may appear in XML text
pub fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}')
}

/// Remove characters illegal in XML text.
///
/// Borrows the input when nothing needs removing.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&ch| is_xml_char(ch)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_borrowed() {
        let text = "Line one\n\tLine two\r\nÜnïcode ✓";
        assert!(matches!(sanitize(text), Cow::Borrowed(t) if t == text));
    }

    #[test]
    fn test_control_bytes_removed() {
        assert_eq!(sanitize("a\u{0}b\u{7}c\u{1b}[0m"), "abc[0m");
        assert_eq!(sanitize("\u{b}\u{c}"), "");
    }

    #[test]
    fn test_noncharacters_and_astral_removed() {
        assert_eq!(sanitize("x\u{FFFE}\u{FFFF}y"), "xy");
        assert_eq!(sanitize("emoji 😀 gone"), "emoji  gone");
    }

    #[test]
    fn test_private_use_kept() {
        assert_eq!(sanitize("\u{E000}\u{FFFD}"), "\u{E000}\u{FFFD}");
    }
}
