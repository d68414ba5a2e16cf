//! Structural checks over a schema tree, run once at load.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::path::{FieldPath, PathError, strip_indices};
use crate::schema::{ACTION_COLUMN, Definition, ExamDefinition, GroupDefinition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIssue {
    #[error("`{parent}` holds more than one child named `{name}`")]
    DuplicateName { parent: String, name: String },
    #[error("`{parent}` holds a child without a name")]
    EmptyName { parent: String },
    #[error("`{group}` has an empty column entry")]
    EmptyColumns { group: String },
    #[error("column `{column}` of `{group}` names no child group")]
    UnknownColumn { group: String, column: String },
    #[error("column `{column}` of `{group}` does not match the shape of `{template}`")]
    ColumnShapeMismatch {
        group: String,
        template: String,
        column: String,
    },
    #[error("mapped field `{path}` of `{field}` is malformed: {source}")]
    MalformedMappedField {
        field: String,
        path: String,
        source: PathError,
    },
    #[error("mapped field `{path}` of `{field}` is not a known target")]
    UnknownMappedField { field: String, path: String },
    #[error("card field `{path}` is malformed: {source}")]
    MalformedCardField { path: String, source: PathError },
}

/// Validates a schema without a mapped-field target set.
pub fn validate(definition: &ExamDefinition) -> Vec<SchemaIssue> {
    SchemaValidator::new().validate(definition)
}

impl ExamDefinition {
    /// Parses a schema document and rejects it when any structural check
    /// fails.
    pub fn from_json_validated(json: &str) -> Result<Self> {
        let definition = Self::from_json(json)?;
        let issues = validate(&definition);
        if issues.is_empty() {
            Ok(definition)
        } else {
            Err(ModelError::InvalidSchema(issues))
        }
    }
}

/// Schema checks, optionally aware of the mapped-field targets that exist.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    mapped_targets: Option<HashSet<String>>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts `mappedField` to the given paths (indices are ignored).
    #[must_use]
    pub fn with_mapped_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mapped_targets = Some(
            targets
                .into_iter()
                .map(|target| strip_indices(target.as_ref()))
                .collect(),
        );
        self
    }

    pub fn validate(&self, definition: &ExamDefinition) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        self.check_level(&definition.name, &definition.fields, &mut issues);
        for path in definition.card_fields.iter().flatten() {
            if !path.contains('.') {
                continue;
            }
            if let Err(source) = FieldPath::parse(path) {
                issues.push(SchemaIssue::MalformedCardField {
                    path: path.clone(),
                    source,
                });
            }
        }
        debug!(exam = %definition.name, issues = issues.len(), "validated schema");
        issues
    }

    fn check_level(&self, parent: &str, fields: &[Definition], issues: &mut Vec<SchemaIssue>) {
        let mut seen = BTreeSet::new();
        for child in fields {
            let name = child.name();
            if name.trim().is_empty() {
                issues.push(SchemaIssue::EmptyName {
                    parent: parent.to_string(),
                });
            } else if !seen.insert(name) {
                issues.push(SchemaIssue::DuplicateName {
                    parent: parent.to_string(),
                    name: name.to_string(),
                });
            }
            let location = format!("{parent}.{name}");
            self.check_mapped_field(&location, child, issues);
            if let Definition::Group(group) = child {
                check_columns(&location, group, issues);
                self.check_level(&location, &group.fields, issues);
            }
        }
    }

    fn check_mapped_field(&self, location: &str, child: &Definition, issues: &mut Vec<SchemaIssue>) {
        let Some(path) = child.field().mapped_field.as_deref() else {
            return;
        };
        if let Err(source) = FieldPath::parse(path) {
            issues.push(SchemaIssue::MalformedMappedField {
                field: location.to_string(),
                path: path.to_string(),
                source,
            });
            return;
        }
        if let Some(targets) = &self.mapped_targets
            && !targets.contains(&strip_indices(path))
        {
            issues.push(SchemaIssue::UnknownMappedField {
                field: location.to_string(),
                path: path.to_string(),
            });
        }
    }
}

fn check_columns(location: &str, group: &GroupDefinition, issues: &mut Vec<SchemaIssue>) {
    for columns in &group.columns {
        let Some((template, rest)) = columns.split_first() else {
            issues.push(SchemaIssue::EmptyColumns {
                group: location.to_string(),
            });
            continue;
        };
        let Some(template_group) = group.child(template).and_then(Definition::as_group) else {
            issues.push(SchemaIssue::UnknownColumn {
                group: location.to_string(),
                column: template.clone(),
            });
            continue;
        };
        for column in rest.iter().filter(|column| column.as_str() != ACTION_COLUMN) {
            match group.child(column).and_then(Definition::as_group) {
                None => issues.push(SchemaIssue::UnknownColumn {
                    group: location.to_string(),
                    column: column.clone(),
                }),
                Some(column_group) if !same_shape(template_group, column_group) => {
                    issues.push(SchemaIssue::ColumnShapeMismatch {
                        group: location.to_string(),
                        template: template.clone(),
                        column: column.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }
}

fn same_shape(left: &GroupDefinition, right: &GroupDefinition) -> bool {
    left.fields.len() == right.fields.len()
        && left
            .fields
            .iter()
            .zip(&right.fields)
            .all(|(l, r)| l.name() == r.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exam(value: serde_json::Value) -> ExamDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flags_duplicate_siblings() {
        let definition = exam(json!({
            "name": "Exam",
            "fields": [{"name": "g", "fields": [{"name": "a"}, {"name": "a"}]}]
        }));
        assert_eq!(
            validate(&definition),
            vec![SchemaIssue::DuplicateName {
                parent: "Exam.g".into(),
                name: "a".into()
            }]
        );
    }

    #[test]
    fn columns_must_share_shape() {
        let definition = exam(json!({
            "name": "Exam",
            "fields": [{
                "name": "rx",
                "columns": [["od", "os", ">>"], ["od", "ou"]],
                "fields": [
                    {"name": "od", "fields": [{"name": "sph"}, {"name": "cyl"}]},
                    {"name": "os", "fields": [{"name": "sph"}, {"name": "cyl"}]},
                    {"name": "ou", "fields": [{"name": "sph"}]}
                ]
            }]
        }));
        assert_eq!(
            validate(&definition),
            vec![SchemaIssue::ColumnShapeMismatch {
                group: "Exam.rx".into(),
                template: "od".into(),
                column: "ou".into()
            }]
        );
    }

    #[test]
    fn mapped_fields_checked_against_targets() {
        let definition = exam(json!({
            "name": "Exam",
            "fields": [
                {"name": "a", "mappedField": "exam.Refraction.od.sph"},
                {"name": "b", "mappedField": "exam.Refraction.od.axis"},
                {"name": "c", "mappedField": "x[y]"}
            ],
            "cardFields": [["OD", "a.b[z]"]]
        }));
        let issues = SchemaValidator::new()
            .with_mapped_targets(["exam.Refraction.od.sph"])
            .validate(&definition);
        assert_eq!(issues.len(), 3);
        assert!(matches!(issues[0], SchemaIssue::UnknownMappedField { ref field, .. } if field == "Exam.b"));
        assert!(matches!(issues[1], SchemaIssue::MalformedMappedField { .. }));
        assert!(matches!(issues[2], SchemaIssue::MalformedCardField { .. }));
    }
}
