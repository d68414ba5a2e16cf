//! Code catalog for enumerated field values.

pub mod builtin;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod store;
pub mod table;

pub use catalog::{CodeCatalog, FormattedCodes, raw_text};
pub use error::{CatalogError, Result};
pub use loader::{load_labels, load_tables, parse_labels, parse_tables};
pub use store::{CatalogStore, LocaleRefresh};
pub use table::{CodeTable, passes_filter};
