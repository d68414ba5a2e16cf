//! Tests for card rendering of multi-value and columned groups.

use chrono::NaiveDate;
use exam_cards::{CardCell, CardRenderer, CardRow, expand_multi_value_card_fields};
use exam_codes::CodeCatalog;
use exam_model::{EngineOptions, Exam, ExamDefinition};
use exam_resolve::MemoryStore;
use serde_json::{Value, json};

fn rx_to_order() -> ExamDefinition {
    serde_json::from_value(json!({
        "name": "RxToOrder",
        "label": "Rx to order",
        "fields": [
            {"name": "Final Rx", "multiValue": true, "fields": [
                {"name": "od", "fields": [
                    {"name": "sph", "label": "Sph", "decimals": 2, "prefix": "+"},
                    {"name": "add", "label": "Add", "decimals": 2, "visible": false}
                ]},
                {"name": "os", "fields": [
                    {"name": "sph", "label": "Sph", "decimals": 2, "prefix": "+"}
                ]}
            ]},
            {"name": "notes", "fields": [{"name": "text", "label": "Notes"}]}
        ],
        "cardFields": [
            ["Final Rx.od.sph"],
            ["Final Rx.od.add"],
            ["notes.text"],
            ["OS:", "Final Rx.os.sph"]
        ]
    }))
    .expect("rx to order")
}

fn refraction() -> ExamDefinition {
    serde_json::from_value(json!({
        "name": "Refraction",
        "fields": [
            {"name": "Wear Rx", "columns": [["od", "os", ">>"]], "fields": [
                {"name": "od", "label": "OD", "fields": [
                    {"name": "sph", "label": "Sph", "decimals": 2, "prefix": "+"},
                    {"name": "cyl", "label": "Cyl", "decimals": 2}
                ]},
                {"name": "os", "label": "OS", "fields": [
                    {"name": "sph", "label": "Sph", "decimals": 2, "prefix": "+"},
                    {"name": "cyl", "label": "Cyl", "decimals": 2}
                ]},
                {"name": "comment", "label": "Comment"}
            ]}
        ]
    }))
    .expect("refraction")
}

fn options() -> EngineOptions {
    EngineOptions::default().with_today(NaiveDate::from_ymd_opt(2024, 6, 1).expect("date"))
}

fn card_lines(exam: &Exam) -> String {
    let store = MemoryStore::new();
    let catalog = CodeCatalog::with_builtin_tables();
    let options = options();
    let renderer = CardRenderer::new(&store, exam, &catalog, &options);
    renderer
        .render_card_rows()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn rx_exam(instances: Value) -> Exam {
    Exam::new("exam-rx", rx_to_order()).with_values(json!({
        "Final Rx": instances,
        "notes": {"text": "Stable"}
    }))
}

#[test]
fn two_instances_expand_in_order() {
    let exam = rx_exam(json!([
        {"od": {"sph": 1.5, "add": 2}, "os": {"sph": -0.25}},
        {"od": {"sph": -2}}
    ]));
    assert_eq!(
        expand_multi_value_card_fields(&exam)
            .iter()
            .filter(|row| row.len() == 1 && row[0].ends_with("od.sph"))
            .map(|row| row[0].as_str())
            .collect::<Vec<_>>(),
        vec!["Final Rx[0].od.sph", "Final Rx[1].od.sph"]
    );
    insta::assert_snapshot!(card_lines(&exam), @r"
    Sph: +1.50
    OS: -0.25
    Sph: -2.00
    Notes: Stable
    ");
}

#[test]
fn zero_instances_drop_group_rows() {
    let exam = rx_exam(json!([]));
    assert_eq!(
        expand_multi_value_card_fields(&exam),
        vec![vec!["notes.text".to_string()]]
    );
    assert_eq!(card_lines(&exam), "Notes: Stable");
}

#[test]
fn empty_columned_rows_are_elided() {
    let exam = Exam::new("exam-ref", refraction()).with_values(json!({
        "Wear Rx": {"od": {}, "os": {"sph": -1}}
    }));
    let store = MemoryStore::new();
    let catalog = CodeCatalog::with_builtin_tables();
    let options = options();
    let renderer = CardRenderer::new(&store, &exam, &catalog, &options);
    let group = exam
        .definition
        .groups()
        .next()
        .expect("wear rx group");

    let rows = renderer.render_columned_rows(group, "od", None);
    assert_eq!(
        rows,
        vec![CardRow::new(vec![
            CardCell::empty(),
            CardCell::text("-1.00").with_label("Sph"),
        ])]
    );
    assert!(renderer.render_columned_rows(group, "os", None).is_empty());
}

#[test]
fn groups_render_without_card_fields() {
    let exam = Exam::new("exam-ref", refraction()).with_values(json!({
        "Wear Rx": {
            "od": {"sph": 0.5, "cyl": -0.75},
            "os": {"sph": -1},
            "comment": "New glasses"
        }
    }));
    let store = MemoryStore::new();
    let catalog = CodeCatalog::with_builtin_tables();
    let options = options();
    let card = CardRenderer::new(&store, &exam, &catalog, &options).render_card();
    insta::assert_snapshot!(card.to_string().trim_end(), @r"
    Refraction
      Sph: +0.50 -1.00
      Cyl: -0.75
      Comment: New glasses
    ");
}

#[test]
fn empty_exam_renders_title_only() {
    let exam = Exam::new("exam-ref", refraction()).with_values(json!({}));
    let store = MemoryStore::new();
    let catalog = CodeCatalog::with_builtin_tables();
    let options = options();
    let card = CardRenderer::new(&store, &exam, &catalog, &options).render_card();
    assert_eq!(card.title, "Refraction");
    assert!(card.is_empty());
}

#[test]
fn glasses_prescription_renders_per_eye() {
    let definition: ExamDefinition = serde_json::from_value(json!({
        "name": "Refraction",
        "fields": [{"name": "Wear Rx", "type": "SRx"}]
    }))
    .expect("refraction");
    let exam = Exam::new("exam-ref", definition).with_values(json!({
        "Wear Rx": {
            "od": {"sph": -1.25, "cyl": -0.5, "axis": 90, "add": 2, "prism1": 2, "prism1b": 1},
            "os": {"sph": 0.5, "va": "20/20"},
            "notes": "Scratched"
        }
    }));
    let store = MemoryStore::new();
    let catalog = CodeCatalog::with_builtin_tables();
    let options = options();
    let renderer = CardRenderer::new(&store, &exam, &catalog, &options);

    let sph = renderer
        .resolver()
        .try_field_definition("Wear Rx.od.sph")
        .expect("sph definition");
    assert_eq!(sph.field().decimals, Some(2));
    insta::assert_snapshot!(renderer.render_card().to_string().trim_end(), @r"
    Refraction
      Wear Rx
        OD: -1.25 -0.50 x90 Add: +2.00 Prism: 2ΔOut
        OS: +0.50 VA: 20/20
        Notes: Scratched
    ");
}

#[test]
fn prescription_without_sphere_labels_first_cell_with_eye() {
    let definition: ExamDefinition = serde_json::from_value(json!({
        "name": "Contacts",
        "fields": [{"name": "Lens Rx", "label": "Lenses", "type": "CRx"}]
    }))
    .expect("contacts");
    let exam = Exam::new("exam-cl", definition).with_values(json!({
        "Lens Rx": {"od": {"add": 1.5}, "os": {}}
    }));
    let store = MemoryStore::new();
    let catalog = CodeCatalog::with_builtin_tables();
    let options = options();
    let card = CardRenderer::new(&store, &exam, &catalog, &options).render_card();
    assert_eq!(card.sections[0].title.as_deref(), Some("Lenses"));
    assert_eq!(card.rows().map(ToString::to_string).collect::<Vec<_>>(), ["OD: Add: +1.50"]);
}

#[test]
fn nested_groups_keep_their_rows() {
    let definition: ExamDefinition = serde_json::from_value(json!({
        "name": "Slit lamp",
        "fields": [
            {"name": "Lids", "fields": [
                {"name": "od", "label": "OD", "fields": [
                    {"name": "lashes", "label": "Lashes"},
                    {"name": "margin", "label": "Margin"}
                ]},
                {"name": "comment", "label": "Comment"}
            ]}
        ]
    }))
    .expect("slit lamp");
    let exam = Exam::new("exam-sl", definition).with_values(json!({
        "Lids": {"od": {"lashes": "Trichiasis"}, "comment": "Mild"}
    }));
    let store = MemoryStore::new();
    let catalog = CodeCatalog::with_builtin_tables();
    let options = options();
    let card = CardRenderer::new(&store, &exam, &catalog, &options).render_card();
    insta::assert_snapshot!(card.to_string().trim_end(), @r"
    Slit lamp
      Lashes: Trichiasis
      Comment: Mild
    ");
}
