//! Tests for loading CLI documents.

use chrono::NaiveDate;
use exam_cli::documents::{ItemDefinitions, load_catalog, mapped_targets, options_from_json};
use exam_model::{ExamDefinition, OptionMatchingMode, SchemaValidator};
use exam_resolve::{ItemKind, ItemStore, MemoryStore};
use serde_json::json;

#[test]
fn options_fill_missing_keys_with_defaults() {
    let options = options_from_json(
        r#"{"listSeparator": " / ", "today": "2024-06-01", "optionMatching": "strict"}"#,
    )
    .expect("options");
    assert_eq!(options.list_separator, " / ");
    assert_eq!(options.today, NaiveDate::from_ymd_opt(2024, 6, 1));
    assert_eq!(options.option_matching, OptionMatchingMode::Strict);
    assert_eq!(options.max_mapped_depth, 16);
    assert!(options_from_json("{\"maxMappedDepth\": \"deep\"}").is_err());
}

#[test]
fn catalog_without_documents_holds_builtin_tables() {
    let catalog = load_catalog(None, None).expect("catalog");
    assert!(!catalog.is_empty());
}

#[test]
fn item_definitions_register_both_kinds() {
    let items: ItemDefinitions = serde_json::from_value(json!({
        "visit": [{"name": "date", "type": "date"}],
        "patient": [{"name": "pd", "label": "PD", "decimals": 1}]
    }))
    .expect("items");
    let mut store = MemoryStore::new();
    items.register(&mut store);
    assert_eq!(
        store
            .item_definitions(ItemKind::Patient)
            .map(|definitions| definitions[0].field().label().to_string()),
        Some("PD".to_string())
    );
    assert_eq!(
        store.item_definitions(ItemKind::Visit).map(<[_]>::len),
        Some(1)
    );
}

#[test]
fn mapped_targets_accept_cross_exam_references() {
    let refraction: ExamDefinition = serde_json::from_value(json!({
        "name": "Refraction",
        "fields": [{"name": "pd", "label": "PD"}]
    }))
    .expect("refraction");
    let order: ExamDefinition = serde_json::from_value(json!({
        "name": "RxToOrder",
        "fields": [
            {"name": "pd", "mappedField": "exam.Refraction.pd"},
            {"name": "age", "mappedField": "patient.age"}
        ]
    }))
    .expect("rx to order");
    let items = ItemDefinitions::default();
    let schemas = [refraction, order];
    let validator = SchemaValidator::new().with_mapped_targets(mapped_targets(&schemas, &items));

    assert!(validator.validate(&schemas[0]).is_empty());
    let issues = validator.validate(&schemas[1]);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].to_string().contains("patient.age"));
}
