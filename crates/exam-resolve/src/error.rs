use exam_model::PathError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),
    #[error("nothing found at `{path}`")]
    NotFound { path: String },
    #[error("`{path}` is ambiguous: more than one `{name}`")]
    Ambiguous { path: String, name: String },
    #[error("mapped field chain of `{path}` does not terminate: {}", .chain.join(" -> "))]
    MappedFieldCycle { path: String, chain: Vec<String> },
    #[error("exam `{exam_id}` has ended and cannot be edited")]
    Locked { exam_id: String },
    #[error("`{path}` cannot be written from this exam")]
    ReadOnly { path: String },
}

pub type Result<T> = std::result::Result<T, ResolveError>;
