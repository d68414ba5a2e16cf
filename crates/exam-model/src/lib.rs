//! Schema model for eye-care exams: field, group and exam definitions, code
//! entries, records and field paths.

pub mod code;
pub mod error;
pub mod field;
pub mod lookup;
pub mod options;
pub mod path;
pub mod prescription;
pub mod record;
pub mod schema;
pub mod selection;
pub mod validate;

pub use code::{CodeDefinition, CodeValue, format_number, number_to_json};
pub use error::{ModelError, Result};
pub use field::{
    Affix, FieldDefinition, FieldOptions, FieldType, StepSize, TableRef, Visibility,
};
pub use lookup::{FoldedSet, fold_key};
pub use options::{EngineOptions, OptionMatchingMode};
pub use path::{FieldPath, PathDomain, PathError, Segment, strip_indices};
pub use prescription::{EYES, PRISM_FIELDS, prescription_group};
pub use record::{Exam, Patient, Visit, dynamic_default_path, is_blank};
pub use schema::{ACTION_COLUMN, Definition, ExamDefinition, GroupDefinition};
pub use selection::{Certainty, Selection, selection_marker, strip_selection_marker};
pub use validate::{SchemaIssue, SchemaValidator, validate};
