//! Tables the engine relies on itself, available before any catalog is
//! fetched.

use std::collections::BTreeMap;

use exam_model::CodeDefinition;

use crate::table::CodeTable;

pub fn builtin_tables() -> BTreeMap<String, CodeTable> {
    let mut tables = BTreeMap::new();
    tables.insert(
        "size".to_string(),
        CodeTable::Flat(vec![
            CodeDefinition::keyed("S", "small"),
            CodeDefinition::keyed("M", "medium"),
            CodeDefinition::keyed("L", "large"),
            CodeDefinition::keyed("XL", "extraLarge"),
        ]),
    );
    tables.insert(
        "examDefinitionType".to_string(),
        CodeTable::Flat(vec![
            CodeDefinition::described("selectionLists", "Selection lists"),
            CodeDefinition::described("groupedForm", "Grouped form"),
            CodeDefinition::described("paperForm", "Paper form"),
            CodeDefinition::described("refractionTest", "Refraction tests"),
        ]),
    );
    tables.insert(
        "recallCode".to_string(),
        numbered(&["Year(s)", "Month(s)", "Week(s)", "Day(s)"]),
    );
    tables.insert("prism1b".to_string(), numbered(&["In", "Out"]));
    tables.insert("prism2b".to_string(), numbered(&["Up", "Down"]));
    tables.insert("genderCode".to_string(), numbered(&["Male", "Female"]));
    tables
}

/// English labels for the localisation keys used by the built-in tables.
pub fn builtin_labels() -> BTreeMap<String, String> {
    [
        ("small", "Small"),
        ("medium", "Medium"),
        ("large", "Large"),
        ("extraLarge", "Extra large"),
    ]
    .into_iter()
    .map(|(key, label)| (key.to_string(), label.to_string()))
    .collect()
}

fn numbered(descriptions: &[&str]) -> CodeTable {
    CodeTable::Flat(
        descriptions
            .iter()
            .zip(0i64..)
            .map(|(description, code)| CodeDefinition::described(code, *description))
            .collect(),
    )
}
