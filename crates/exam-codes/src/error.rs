use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid code document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("code document must be a JSON object of tables")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, CatalogError>;
