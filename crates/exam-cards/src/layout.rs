//! Schema-level layout questions: column pivots and card templates.

use std::collections::HashSet;

use exam_model::{Exam, GroupDefinition};
use tracing::trace;

/// True when the group pivots its fields into columns.
pub fn has_columns(group: &GroupDefinition) -> bool {
    group.columns.iter().any(|columns| !columns.is_empty())
}

/// Position of `name` inside the first column entry that lists it. Position
/// 0 marks a row template, later positions mirror it.
pub fn column_field_index(group: &GroupDefinition, name: &str) -> Option<usize> {
    group
        .columns
        .iter()
        .find_map(|columns| columns.iter().position(|column| column == name))
}

/// Column entry whose row template is `template`.
pub fn columns_of<'g>(group: &'g GroupDefinition, template: &str) -> Option<&'g [String]> {
    group
        .columns
        .iter()
        .find(|columns| columns.first().is_some_and(|first| first == template))
        .map(Vec::as_slice)
}

/// First repeating group named by the leading segment of a path in `row`.
pub fn multi_value_group<'g>(
    row: &[String],
    groups: &[&'g GroupDefinition],
) -> Option<&'g GroupDefinition> {
    row.iter().find_map(|path| {
        let (head, _) = path.split_once('.')?;
        groups.iter().copied().find(|group| group.name() == head)
    })
}

/// The exam's `cardFields` with every row that refers to a repeating group
/// materialised once per stored instance, `group.` rewritten to
/// `group[i].`. All rows of a group land where its first row stood,
/// instance by instance; groups without instances lose their rows.
pub fn expand_multi_value_card_fields(exam: &Exam) -> Vec<Vec<String>> {
    let definition = &exam.definition;
    let groups: Vec<&GroupDefinition> = definition
        .groups()
        .filter(|group| group.is_repeating())
        .collect();
    if groups.is_empty() {
        return definition.card_fields.clone();
    }

    let mut expanded = Vec::new();
    let mut seen = HashSet::new();
    for row in &definition.card_fields {
        let Some(group) = multi_value_group(row, &groups) else {
            expanded.push(row.clone());
            continue;
        };
        if !seen.insert(group.name()) {
            continue;
        }
        let count = instance_count(exam, group.name());
        trace!(group = %group.name(), count, "expanding card rows");
        let template: Vec<&Vec<String>> = definition
            .card_fields
            .iter()
            .filter(|row| {
                multi_value_group(row, &groups).is_some_and(|other| other.name() == group.name())
            })
            .collect();
        for index in 0..count {
            for row in &template {
                expanded.push(index_row(row, group.name(), index));
            }
        }
    }
    expanded
}

fn instance_count(exam: &Exam, group: &str) -> usize {
    exam.values()
        .and_then(|values| values.get(group))
        .and_then(|value| value.as_array())
        .map_or(0, Vec::len)
}

fn index_row(row: &[String], group: &str, index: usize) -> Vec<String> {
    let from = format!("{group}.");
    let to = format!("{group}[{index}].");
    row.iter().map(|path| path.replacen(&from, &to, 1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_model::ExamDefinition;
    use serde_json::json;

    fn group(value: serde_json::Value) -> GroupDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn column_positions() {
        let rx = group(json!({
            "name": "Rx",
            "columns": [["od", "os", ">>"]],
            "fields": [{"name": "od", "fields": []}, {"name": "os", "fields": []}, {"name": "notes"}]
        }));
        assert!(has_columns(&rx));
        assert_eq!(column_field_index(&rx, "od"), Some(0));
        assert_eq!(column_field_index(&rx, "os"), Some(1));
        assert_eq!(column_field_index(&rx, "notes"), None);
        assert_eq!(columns_of(&rx, "od").map(<[String]>::len), Some(3));
        assert_eq!(columns_of(&rx, "os"), None);
    }

    #[test]
    fn literal_tokens_never_name_a_group() {
        let rx = group(json!({"name": "Rx", "multiValue": true, "fields": []}));
        let groups = [&rx];
        assert!(multi_value_group(&["Rx".to_string()], &groups).is_none());
        assert!(multi_value_group(&["Rx.od.sph".to_string()], &groups).is_some());
    }

    #[test]
    fn rows_interleave_per_instance() {
        let definition: ExamDefinition = serde_json::from_value(json!({
            "name": "RxToOrder",
            "fields": [
                {"name": "Final Rx", "multiValue": true, "fields": [
                    {"name": "od", "fields": [{"name": "sph"}]},
                    {"name": "os", "fields": [{"name": "sph"}]}
                ]},
                {"name": "notes"}
            ],
            "cardFields": [
                ["Final Rx.od.sph"],
                ["notes.text"],
                ["OS", "Final Rx.os.sph"]
            ]
        }))
        .unwrap();
        let exam = Exam::new("exam-1", definition).with_values(json!({"Final Rx": [{}, {}]}));
        assert_eq!(
            expand_multi_value_card_fields(&exam),
            vec![
                vec!["Final Rx[0].od.sph".to_string()],
                vec!["OS".to_string(), "Final Rx[0].os.sph".to_string()],
                vec!["Final Rx[1].od.sph".to_string()],
                vec!["OS".to_string(), "Final Rx[1].os.sph".to_string()],
                vec!["notes.text".to_string()],
            ]
        );
    }
}
