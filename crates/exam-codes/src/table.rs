use std::collections::BTreeMap;

use exam_model::CodeDefinition;
use serde::{Deserialize, Serialize};

/// Entries of one code table. Grouped tables are rendered as several
/// pickers side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeTable {
    Flat(Vec<CodeDefinition>),
    Grouped(Vec<Vec<CodeDefinition>>),
}

impl CodeTable {
    /// All entries in order, sub-lists flattened.
    pub fn entries(&self) -> Box<dyn Iterator<Item = &CodeDefinition> + '_> {
        match self {
            CodeTable::Flat(entries) => Box::new(entries.iter()),
            CodeTable::Grouped(groups) => Box::new(groups.iter().flatten()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CodeTable::Flat(entries) => entries.len(),
            CodeTable::Grouped(groups) => groups.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps entries whose attributes equal every non-blank filter value.
    #[must_use]
    pub fn filtered(&self, filter: &BTreeMap<String, String>) -> CodeTable {
        let keep = |entries: &Vec<CodeDefinition>| {
            entries
                .iter()
                .filter(|entry| passes_filter(entry, filter))
                .cloned()
                .collect::<Vec<_>>()
        };
        match self {
            CodeTable::Flat(entries) => CodeTable::Flat(keep(entries)),
            CodeTable::Grouped(groups) => CodeTable::Grouped(groups.iter().map(keep).collect()),
        }
    }
}

impl From<Vec<CodeDefinition>> for CodeTable {
    fn from(entries: Vec<CodeDefinition>) -> Self {
        CodeTable::Flat(entries)
    }
}

/// Filter check for one entry. Blank filter values match anything; other
/// values must equal the entry attribute's text.
pub fn passes_filter(entry: &CodeDefinition, filter: &BTreeMap<String, String>) -> bool {
    filter
        .iter()
        .filter(|(_, expected)| !expected.trim().is_empty())
        .all(|(attribute, expected)| {
            entry
                .attribute(attribute)
                .is_some_and(|actual| actual.to_string() == *expected)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filter_values_are_ignored() {
        let entry = CodeDefinition::described("A", "Alpha").with_attribute("category", "lens");
        let mut filter = BTreeMap::new();
        filter.insert("category".to_string(), "lens".to_string());
        filter.insert("brand".to_string(), "  ".to_string());
        assert!(passes_filter(&entry, &filter));
        filter.insert("category".to_string(), "frame".to_string());
        assert!(!passes_filter(&entry, &filter));
    }

    #[test]
    fn grouped_tables_flatten() {
        let table: CodeTable = serde_json::from_str(r#"[["1", "2"], ["3"]]"#).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.entries().count(), 3);
    }
}
