//! Value formatting and parsing for exam fields.

pub mod context;
pub mod datetime;
pub mod error;
pub mod field;
pub mod number;
pub mod parse;
pub mod prism;
pub mod selection;

pub use context::FormatContext;
pub use datetime::{format_date, format_date_text, format_time, format_time_text, parse_date, parse_time};
pub use error::NumericError;
pub use field::{find_inline, format_field_value, format_label, format_value};
pub use number::{format_decimal, parse_f64};
pub use parse::{NumericInput, parse_numeric, parse_option_text};
pub use prism::{Prism, PrismComponent, format_prism};
pub use selection::{cycle_selection, toggle_selection};
