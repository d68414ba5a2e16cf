//! Tests for the code catalog.

use std::collections::BTreeMap;

use exam_codes::{CatalogStore, CodeCatalog, CodeTable, FormattedCodes, parse_tables};
use exam_model::{CodeDefinition, CodeValue};
use proptest::prelude::*;
use serde_json::json;

const CODES: &str = r#"{
    "lensTypes": [
        {"code": "SV", "description": "Single vision", "category": "spectacle"},
        {"code": "PAL", "description": "Progressive", "category": "spectacle"},
        {"code": "SOFT", "description": "Soft", "category": "contact"},
        {"code": "pal", "description": " progressive ", "category": "spectacle"}
    ],
    "cornea": [["Clear", "Edema"], ["Scar", "Clear"]],
    "errors": {"message": "ignored"}
}"#;

fn catalog() -> CodeCatalog {
    CodeCatalog::with_builtin_tables().extended(parse_tables(CODES).expect("codes"))
}

#[test]
fn format_all_dedupes_in_first_seen_order() {
    let catalog = catalog();
    assert_eq!(
        catalog.format_all("lensTypes", None),
        FormattedCodes::Flat(vec![
            "Single vision".to_string(),
            "Progressive".to_string(),
            "Soft".to_string()
        ])
    );
}

#[test]
fn grouped_tables_format_per_group() {
    let formatted = catalog().format_all("cornea", None);
    insta::assert_json_snapshot!(formatted, @r###"
    [
      [
        "Clear",
        "Edema"
      ],
      [
        "Scar",
        "Clear"
      ]
    ]
    "###);
}

#[test]
fn filters_select_by_attribute() {
    let mut filter = BTreeMap::new();
    filter.insert("category".to_string(), "contact".to_string());
    assert_eq!(
        catalog().format_all("lensTypes", Some(&filter)).flatten(),
        vec!["Soft".to_string()]
    );
    filter.insert("category".to_string(), String::new());
    assert_eq!(catalog().format_all("lensTypes", Some(&filter)).flatten().len(), 3);
}

#[test]
fn builtin_tables_round_trip() {
    let catalog = CodeCatalog::with_builtin_tables();
    for name in ["size", "examDefinitionType", "recallCode", "prism1b", "prism2b", "genderCode"] {
        let table = catalog.table(name).expect("builtin table");
        for entry in table.entries() {
            let text = catalog.format(name, &entry.code.to_json());
            assert_eq!(catalog.parse(name, &text, None), entry.code, "{name}: {text}");
        }
    }
}

#[test]
fn parse_matches_first_equivalent_entry() {
    assert_eq!(
        catalog().parse("lensTypes", "PROGRESSIVE", None),
        CodeValue::from("PAL")
    );
}

#[test]
fn user_codes_land_in_new_snapshot_only() {
    let store = CatalogStore::default();
    let before = store.snapshot();
    let mut tables = parse_tables(CODES).expect("codes");
    tables.insert(
        "errors".to_string(),
        CodeTable::Flat(vec![CodeDefinition::described(1, "boom")]),
    );
    store.apply_user_codes(tables);

    let after = store.snapshot();
    assert_eq!(after.format("lensTypes", &json!("PAL")), "Progressive");
    assert!(after.table("errors").is_none());
    assert!(after.table("prism1b").is_some());
    assert!(before.table("lensTypes").is_none());
    assert_eq!(before.format("lensTypes", &json!("PAL")), "PAL");
}

proptest! {
    #[test]
    fn parse_inverts_format(descriptions in prop::collection::btree_set("[a-z][a-z ]{0,10}[a-z]", 1..12)) {
        let entries: Vec<CodeDefinition> = descriptions
            .iter()
            .zip(0i64..)
            .map(|(description, code)| CodeDefinition::described(code, description.as_str()))
            .collect();
        let catalog = CodeCatalog::new().with_table("generated", CodeTable::Flat(entries.clone()));
        for entry in &entries {
            let text = catalog.format("generated", &entry.code.to_json());
            prop_assert_eq!(catalog.parse("generated", &text, None), entry.code.clone());
        }
        prop_assert_eq!(catalog.format("generated", &json!(-1)), "-1");
    }
}
