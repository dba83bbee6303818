//! Diagram matcher
//!
//! Kind-specific diagram anchors (`[[er_diagram]]`, `[[class_diagram]]`, ...)
//! pick an uploaded diagram by looking for one of the kind's alias phrases
//! in the diagram's display name and file name. Matching is a plain
//! substring test on normalized text, so it is deliberately forgiving.

use std::collections::BTreeMap;

use crate::model::MediaItem;

/// Kind -> alias phrases, as shipped
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("event_table", &["event table", "event_table", "eventtable"]),
    (
        "er_diagram",
        &["entity relationship", "er diagram", "er_diagram", "erd"],
    ),
    ("class_diagram", &["class diagram", "class_diagram"]),
    ("activity_diagram", &["activity diagram", "activity_diagram"]),
    (
        "use_case_diagram",
        &["use case diagram", "use_case_diagram", "usecase diagram", "usecase_diagram"],
    ),
    (
        "usecase_diagram",
        &["use case diagram", "use_case_diagram", "usecase diagram", "usecase_diagram"],
    ),
    ("sequence_diagram", &["sequence diagram", "sequence_diagram"]),
    ("component_diagram", &["component diagram", "component_diagram"]),
    ("deployment_diagram", &["deployment diagram", "deployment_diagram"]),
    (
        "database_model",
        &["database model", "database diagram", "database_model"],
    ),
];

/// Immutable table of diagram kinds and their synonyms
#[derive(Debug, Clone, PartialEq)]
pub struct AliasTable {
    aliases: BTreeMap<String, Vec<String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasTable {
    /// The shipped table
    pub fn builtin() -> Self {
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(kind, phrases)| {
                (
                    kind.to_string(),
                    phrases.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        Self { aliases }
    }

    /// Replace or add kinds; kind names are matched case-insensitively
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Vec<String>>) -> Self {
        for (kind, phrases) in overrides {
            self.aliases
                .insert(kind.to_ascii_lowercase(), phrases.clone());
        }
        self
    }

    /// Normalized alias phrases for a kind.
    ///
    /// Unknown kinds fall back to the kind itself with `_` read as a space.
    pub fn phrases(&self, kind: &str) -> Vec<String> {
        let kind = kind.trim().to_ascii_lowercase();
        let phrases = match self.aliases.get(&kind) {
            Some(phrases) => phrases.iter().map(|p| normalize(p)).collect(),
            None => vec![normalize(&kind.replace('_', " "))],
        };
        let mut unique: Vec<String> = Vec::new();
        for phrase in phrases {
            if !phrase.is_empty() && !unique.contains(&phrase) {
                unique.push(phrase);
            }
        }
        unique
    }

    /// Known kinds in sorted order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }
}

/// Lowercase, map every non-alphanumeric character to a space, trim
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .flat_map(|ch| {
            let lowered: Vec<char> = if ch.is_alphanumeric() {
                ch.to_lowercase().collect()
            } else {
                vec![' ']
            };
            lowered
        })
        .collect();
    mapped.trim().to_string()
}

/// One-to-one assignment of uploaded diagrams to anchors for a single build
#[derive(Debug)]
pub struct DiagramMatcher<'a> {
    aliases: &'a AliasTable,
    haystacks: Vec<String>,
    used: Vec<bool>,
}

impl<'a> DiagramMatcher<'a> {
    pub fn new(aliases: &'a AliasTable, diagrams: &[MediaItem]) -> Self {
        let haystacks = diagrams
            .iter()
            .map(|item| {
                format!(
                    "{} {}",
                    normalize(&item.display_name),
                    normalize(&item.file_name())
                )
            })
            .collect();
        Self {
            aliases,
            haystacks,
            used: vec![false; diagrams.len()],
        }
    }

    /// First unused diagram (upload order) matching the kind; marks it used
    pub fn match_kind(&mut self, kind: &str) -> Option<usize> {
        let phrases = self.aliases.phrases(kind);
        let index = self.haystacks.iter().enumerate().find_map(|(i, haystack)| {
            let hit = !self.used[i] && phrases.iter().any(|p| haystack.contains(p.as_str()));
            hit.then_some(i)
        })?;
        self.used[index] = true;
        Some(index)
    }

    /// All still-unused diagrams in upload order, marking them used
    pub fn take_remaining(&mut self) -> Vec<usize> {
        let remaining: Vec<usize> = (0..self.used.len()).filter(|&i| !self.used[i]).collect();
        for &i in &remaining {
            self.used[i] = true;
        }
        remaining
    }

    /// True once the diagram has been assigned
    pub fn is_used(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagrams() -> Vec<MediaItem> {
        vec![
            MediaItem::diagram("Entity Relationship", "/up/er_3fa1.png"),
            MediaItem::diagram("Login flow", "/up/Activity-Diagram.png"),
            MediaItem::diagram("Classes", "/up/class_diagram_v2.png"),
            MediaItem::diagram("Second ERD", "/up/erd2.png"),
        ]
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  ER_Diagram-v2.PNG "), "er diagram v2 png");
        assert_eq!(normalize("___"), "");
    }

    #[test]
    fn test_match_by_display_name_then_basename() {
        let table = AliasTable::builtin();
        let items = diagrams();
        let mut matcher = DiagramMatcher::new(&table, &items);

        assert_eq!(matcher.match_kind("er_diagram"), Some(0));
        assert_eq!(matcher.match_kind("activity_diagram"), Some(1));
        assert_eq!(matcher.match_kind("CLASS_DIAGRAM"), Some(2));
    }

    #[test]
    fn test_item_never_assigned_twice() {
        let table = AliasTable::builtin();
        let items = diagrams();
        let mut matcher = DiagramMatcher::new(&table, &items);

        assert_eq!(matcher.match_kind("er_diagram"), Some(0));
        assert_eq!(matcher.match_kind("er_diagram"), Some(3));
        assert_eq!(matcher.match_kind("er_diagram"), None);
    }

    #[test]
    fn test_unknown_kind_uses_its_own_words() {
        let table = AliasTable::builtin();
        let items = vec![MediaItem::diagram("Data Flow Level 0", "/up/dfd.png")];
        let mut matcher = DiagramMatcher::new(&table, &items);
        assert_eq!(matcher.match_kind("data_flow"), Some(0));
    }

    #[test]
    fn test_no_match_leaves_items_unused() {
        let table = AliasTable::builtin();
        let items = diagrams();
        let mut matcher = DiagramMatcher::new(&table, &items);
        assert_eq!(matcher.match_kind("deployment_diagram"), None);
        assert!(!matcher.is_used(0));
    }

    #[test]
    fn test_take_remaining_in_upload_order() {
        let table = AliasTable::builtin();
        let items = diagrams();
        let mut matcher = DiagramMatcher::new(&table, &items);
        matcher.match_kind("activity_diagram");
        assert_eq!(matcher.take_remaining(), vec![0, 2, 3]);
        assert!(matcher.take_remaining().is_empty());
    }

    #[test]
    fn test_overrides_replace_phrases() {
        let mut overrides = BTreeMap::new();
        overrides.insert("ER_Diagram".to_string(), vec!["schema".to_string()]);
        let table = AliasTable::builtin().with_overrides(&overrides);
        assert_eq!(table.phrases("er_diagram"), vec!["schema"]);

        let items = vec![
            MediaItem::diagram("ERD", "/up/a.png"),
            MediaItem::diagram("Schema", "/up/b.png"),
        ];
        let mut matcher = DiagramMatcher::new(&table, &items);
        assert_eq!(matcher.match_kind("er_diagram"), Some(1));
    }
}
