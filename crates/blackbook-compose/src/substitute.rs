//! Text substitution
//!
//! Replaces literal placeholder tokens in every paragraph of the body,
//! including paragraphs nested in table cells. When every occurrence of a
//! token sits inside a single run, each run is edited in place and keeps its
//! formatting. When an occurrence is split across runs, the whole paragraph
//! text is rewritten into its first run and the others are blanked, which
//! loses the per-run formatting of that paragraph.
//!
//! Either way the replacement is applied once to the original text, so a
//! value that contains its own token is not expanded again.

use blackbook_ooxml::{DocumentTree, Paragraph};

use crate::model::{GeneratedSection, StudentMeta, TemplateDescriptor, SECTION_KEYS};
use crate::sanitize::sanitize;

/// How tokens are compared with document text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    /// ASCII letters compare case-insensitively
    IgnoreAsciiCase,
}

impl MatchMode {
    /// True when `haystack` contains `needle`
    pub fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            MatchMode::Exact => haystack.contains(needle),
            MatchMode::IgnoreAsciiCase => haystack
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase()),
        }
    }

    /// Number of non-overlapping occurrences
    pub fn count(self, haystack: &str, needle: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        match self {
            MatchMode::Exact => haystack.matches(needle).count(),
            MatchMode::IgnoreAsciiCase => haystack
                .to_ascii_lowercase()
                .matches(&needle.to_ascii_lowercase())
                .count(),
        }
    }

    /// Replace every occurrence; `None` when there is none
    pub fn replace(self, haystack: &str, needle: &str, with: &str) -> Option<String> {
        if needle.is_empty() {
            return None;
        }
        match self {
            MatchMode::Exact => haystack
                .contains(needle)
                .then(|| haystack.replace(needle, with)),
            MatchMode::IgnoreAsciiCase => {
                // ASCII lowercasing keeps byte offsets stable
                let lowered = haystack.to_ascii_lowercase();
                let needle = needle.to_ascii_lowercase();
                let mut out = String::with_capacity(haystack.len());
                let mut last = 0;
                let mut found = false;
                for (start, _) in lowered.match_indices(&needle) {
                    out.push_str(&haystack[last..start]);
                    out.push_str(with);
                    last = start + needle.len();
                    found = true;
                }
                if !found {
                    return None;
                }
                out.push_str(&haystack[last..]);
                Some(out)
            }
        }
    }
}

/// Replace `token` with `value` in one paragraph.
///
/// `value` is inserted as given; callers sanitize. Returns true when the
/// paragraph changed.
pub fn replace_in_paragraph(
    paragraph: &mut Paragraph,
    token: &str,
    value: &str,
    mode: MatchMode,
) -> bool {
    if token.is_empty() {
        return false;
    }

    let in_runs: usize = paragraph
        .runs()
        .map(|run| mode.count(&run.text(), token))
        .sum();
    let whole = paragraph.text();

    // Some occurrence spans a run boundary
    if mode.count(&whole, token) > in_runs {
        let Some(text) = mode.replace(&whole, token, value) else {
            return false;
        };
        let mut runs = paragraph.runs_mut();
        if let Some(first) = runs.next() {
            first.set_text(&text);
        }
        for run in runs {
            run.set_text("");
        }
        return true;
    }

    if in_runs == 0 {
        return false;
    }
    for run in paragraph.runs_mut() {
        if let Some(text) = mode.replace(&run.text(), token, value) {
            run.set_text(&text);
        }
    }
    true
}

/// Strip anchor tokens (case-insensitive) from a paragraph, keeping the
/// surrounding text
pub fn remove_tokens(paragraph: &mut Paragraph, tokens: &[&str]) -> bool {
    let mut changed = false;
    for token in tokens {
        changed |= replace_in_paragraph(paragraph, token, "", MatchMode::IgnoreAsciiCase);
    }
    changed
}

/// Apply `(token, replacement)` pairs, in order, to every paragraph.
///
/// Replacements are sanitized and empty tokens skipped. Returns the number
/// of paragraphs that changed.
pub fn substitute(tree: &mut DocumentTree, pairs: &[(String, String)]) -> usize {
    let pairs: Vec<(&str, String)> = pairs
        .iter()
        .filter(|(token, _)| !token.is_empty())
        .map(|(token, value)| (token.as_str(), sanitize(value).into_owned()))
        .collect();
    if pairs.is_empty() {
        return 0;
    }

    let mut changed = 0;
    tree.for_each_paragraph_mut(&mut |paragraph| {
        let mut hit = false;
        for (token, value) in &pairs {
            hit |= replace_in_paragraph(paragraph, token, value, MatchMode::Exact);
        }
        if hit {
            changed += 1;
        }
    });
    changed
}

/// Replacement pairs for a build: student fields, then every known section
/// (missing ones blank), then any extra sections the caller supplied
pub fn replacement_pairs(
    template: &TemplateDescriptor,
    student: &StudentMeta,
    sections: &[GeneratedSection],
) -> Vec<(String, String)> {
    let section_text = |key: &str| {
        sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.text.clone())
            .unwrap_or_default()
    };

    let mut pairs: Vec<(String, String)> = student
        .fields()
        .iter()
        .map(|(field, value)| (template.token(field), value.to_string()))
        .collect();

    for key in SECTION_KEYS {
        pairs.push((template.token(key), section_text(key)));
    }

    let mut extra: Vec<&str> = Vec::new();
    for section in sections {
        let key = section.key.as_str();
        if !SECTION_KEYS.contains(&key) && !extra.contains(&key) {
            extra.push(key);
            pairs.push((template.token(key), section_text(key)));
        }
    }
    pairs
}
