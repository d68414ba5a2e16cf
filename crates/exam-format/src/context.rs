use chrono::{Local, NaiveDate};
use exam_codes::CodeCatalog;
use exam_model::EngineOptions;

/// What formatting needs besides the value and its definition.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub catalog: &'a CodeCatalog,
    pub options: &'a EngineOptions,
}

impl<'a> FormatContext<'a> {
    pub fn new(catalog: &'a CodeCatalog, options: &'a EngineOptions) -> Self {
        Self { catalog, options }
    }

    /// The configured reference date, else the local date.
    pub fn today(&self) -> NaiveDate {
        self.options
            .today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn separator(&self) -> &str {
        &self.options.list_separator
    }
}
