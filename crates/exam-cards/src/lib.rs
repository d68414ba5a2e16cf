//! Card and summary rendering: column pivots, multi-value card expansion
//! and formatted card lines.

pub mod layout;
pub mod render;
pub mod row;

pub use layout::{
    column_field_index, columns_of, expand_multi_value_card_fields, has_columns,
    multi_value_group,
};
pub use render::CardRenderer;
pub use row::{Card, CardCell, CardRow, CardSection};
