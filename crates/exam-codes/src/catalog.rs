//! Immutable code catalog snapshot.
//!
//! A catalog maps table names to [`CodeTable`]s and carries the label map
//! that resolves localisation keys. Table references may be dotted
//! (`insuranceProviders.povOnlineId`): the first segment picks the table,
//! the second names the entry attribute used as the match key and as the
//! display fallback.

use std::collections::BTreeMap;

use exam_model::{CodeDefinition, CodeValue, FoldedSet, TableRef, fold_key, format_number};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::table::CodeTable;

/// Display strings of a table, mirroring its flat or grouped shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FormattedCodes {
    Flat(Vec<String>),
    Grouped(Vec<Vec<String>>),
}

impl FormattedCodes {
    pub fn is_empty(&self) -> bool {
        match self {
            FormattedCodes::Flat(items) => items.is_empty(),
            FormattedCodes::Grouped(groups) => groups.iter().all(Vec::is_empty),
        }
    }

    /// Every display string in order.
    pub fn flatten(self) -> Vec<String> {
        match self {
            FormattedCodes::Flat(items) => items,
            FormattedCodes::Grouped(groups) => groups.into_iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeCatalog {
    tables: BTreeMap<String, CodeTable>,
    labels: BTreeMap<String, String>,
}

impl CodeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding only the built-in tables and their English labels.
    pub fn with_builtin_tables() -> Self {
        let mut catalog = Self::new();
        for (name, table) in crate::builtin::builtin_tables() {
            catalog.register(name, table);
        }
        catalog.labels = crate::builtin::builtin_labels();
        catalog
    }

    /// Adds or wholly replaces a table.
    pub fn register(&mut self, name: impl Into<String>, table: impl Into<CodeTable>) {
        self.tables.insert(name.into(), table.into());
    }

    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, table: impl Into<CodeTable>) -> Self {
        self.register(name, table);
        self
    }

    /// Adds or replaces localisation labels.
    pub fn set_labels<I, K, V>(&mut self, labels: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Copy of this catalog with `tables` registered over it.
    #[must_use]
    pub fn extended(&self, tables: BTreeMap<String, CodeTable>) -> Self {
        let mut next = self.clone();
        next.tables.extend(tables);
        next
    }

    pub fn table(&self, reference: &str) -> Option<&CodeTable> {
        self.tables.get(&TableRef::parse(reference).table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    fn table_or_warn(&self, reference: &TableRef) -> Option<&CodeTable> {
        let table = self.tables.get(&reference.table);
        if table.is_none() {
            warn!(table = %reference.table, "no codes defined for table");
        }
        table
    }

    /// Entries of a table, optionally filtered. Unknown tables yield nothing.
    pub fn entries(
        &self,
        reference: &str,
        filter: Option<&BTreeMap<String, String>>,
    ) -> Vec<&CodeDefinition> {
        let reference = TableRef::parse(reference);
        let Some(table) = self.table_or_warn(&reference) else {
            return Vec::new();
        };
        table
            .entries()
            .filter(|entry| filter.is_none_or(|filter| crate::table::passes_filter(entry, filter)))
            .collect()
    }

    /// Entry whose identifier attribute equals `value`.
    pub fn lookup(&self, reference: &str, value: &Value) -> Option<&CodeDefinition> {
        let reference = TableRef::parse(reference);
        let identifier = reference.identifier();
        self.table_or_warn(&reference)?.entries().find(|entry| {
            entry
                .attribute(identifier)
                .is_some_and(|attribute| attribute.matches_json(value))
        })
    }

    /// Display text of one entry: label for its key, then description, then
    /// the identifier attribute, then the code.
    pub fn format_entry(&self, entry: &CodeDefinition, identifier: Option<&str>) -> String {
        if let Some(label) = entry.key.as_deref().and_then(|key| self.label(key)) {
            return label.to_string();
        }
        if let Some(description) = &entry.description {
            return description.clone();
        }
        identifier
            .and_then(|identifier| entry.attribute(identifier))
            .unwrap_or_else(|| entry.code.clone())
            .to_string()
    }

    /// Display text of a stored value. Unknown codes print as themselves.
    pub fn format(&self, reference: &str, value: &Value) -> String {
        if value.is_null() {
            return String::new();
        }
        match self.lookup(reference, value) {
            Some(entry) => {
                let identifier = TableRef::parse(reference).identifier;
                self.format_entry(entry, identifier.as_deref())
            }
            None => raw_text(value),
        }
    }

    /// Display strings of a table in first-seen order, de-duplicated ignoring
    /// case and surrounding whitespace. Grouped tables keep their sub-lists.
    pub fn format_all(
        &self,
        reference: &str,
        filter: Option<&BTreeMap<String, String>>,
    ) -> FormattedCodes {
        let reference = TableRef::parse(reference);
        let Some(table) = self.table_or_warn(&reference) else {
            return FormattedCodes::Flat(Vec::new());
        };
        let identifier = reference.identifier.as_deref();
        let table = match filter {
            Some(filter) => table.filtered(filter),
            None => table.clone(),
        };
        match &table {
            CodeTable::Flat(entries) => FormattedCodes::Flat(self.format_options(entries, identifier)),
            CodeTable::Grouped(groups) => FormattedCodes::Grouped(
                groups
                    .iter()
                    .map(|entries| self.format_options(entries, identifier))
                    .collect(),
            ),
        }
    }

    /// Formats a list of entries, dropping later duplicates.
    pub fn format_options(&self, entries: &[CodeDefinition], identifier: Option<&str>) -> Vec<String> {
        let mut seen = FoldedSet::default();
        entries
            .iter()
            .map(|entry| self.format_entry(entry, identifier))
            .filter(|text| seen.insert(text))
            .collect()
    }

    /// Entry whose display text matches `text`, ignoring case and
    /// surrounding whitespace.
    pub fn find_by_text(
        &self,
        reference: &str,
        text: &str,
        identifier: Option<&str>,
    ) -> Option<&CodeDefinition> {
        let table_ref = TableRef::parse(reference);
        let identifier = identifier.or(table_ref.identifier.as_deref());
        let wanted = fold_key(text);
        self.table_or_warn(&table_ref)?
            .entries()
            .find(|entry| fold_key(&self.format_entry(entry, identifier)) == wanted)
    }

    /// Stored value for display text. Without a match the input comes back
    /// unchanged as text.
    pub fn parse(&self, reference: &str, text: &str, identifier: Option<&str>) -> CodeValue {
        self.try_parse(reference, text, identifier)
            .unwrap_or_else(|| CodeValue::Text(text.to_string()))
    }

    /// Stored value for display text, `None` without a match.
    pub fn try_parse(&self, reference: &str, text: &str, identifier: Option<&str>) -> Option<CodeValue> {
        let identifier = identifier
            .map(str::to_string)
            .or_else(|| TableRef::parse(reference).identifier);
        let entry = self.find_by_text(reference, text, identifier.as_deref())?;
        let key = identifier.as_deref().unwrap_or("code");
        Some(entry.attribute(key).unwrap_or_else(|| entry.code.clone()))
    }
}

/// Display form of a raw JSON scalar.
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.as_f64().map(format_number).unwrap_or_default(),
        other => other.to_string(),
    }
}
