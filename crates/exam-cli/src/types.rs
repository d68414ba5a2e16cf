use std::path::PathBuf;

use exam_model::SchemaIssue;

#[derive(Debug)]
pub struct ValidationReport {
    pub schemas: Vec<SchemaReport>,
    pub has_issues: bool,
}

#[derive(Debug)]
pub struct SchemaReport {
    pub path: PathBuf,
    pub name: String,
    pub fields: usize,
    pub issues: Vec<SchemaIssue>,
}

/// Outcome of the `parse` command.
#[derive(Debug)]
pub struct ParseOutcome {
    pub value: Option<serde_json::Value>,
    pub error: Option<String>,
}
