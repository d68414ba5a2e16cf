use thiserror::Error;

use crate::validate::SchemaIssue;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema has {} issue(s), first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    InvalidSchema(Vec<SchemaIssue>),
}

pub type Result<T> = std::result::Result<T, ModelError>;
