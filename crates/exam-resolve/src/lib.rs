//! Field path resolution: values and effective definitions across the
//! exams of a visit, its visit record and its patient.

pub mod error;
pub mod resolver;
pub mod store;
pub mod tree;

pub use error::{ResolveError, Result};
pub use resolver::Resolver;
pub use store::{ItemKind, ItemStore, MemoryStore};
pub use tree::{FieldChange, FieldUpdate, get_value, set_field_value};
