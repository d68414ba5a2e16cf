//! Loads code tables and labels from their JSON wire format.
//!
//! A code document is an object mapping table names to either a flat list
//! of entries or a list of sub-lists. The server adds an `errors` member to
//! some responses; it is not a table.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use exam_model::{CodeDefinition, CodeValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::table::CodeTable;

const ERRORS_KEY: &str = "errors";

pub fn parse_tables(json: &str) -> Result<BTreeMap<String, CodeTable>> {
    tables_from_value(serde_json::from_str(json)?)
}

pub fn load_tables(path: &Path) -> Result<BTreeMap<String, CodeTable>> {
    parse_tables(&read(path)?)
}

pub fn tables_from_value(document: Value) -> Result<BTreeMap<String, CodeTable>> {
    let Value::Object(members) = document else {
        return Err(CatalogError::NotAnObject);
    };
    let mut tables = BTreeMap::new();
    for (name, value) in members {
        if name == ERRORS_KEY {
            continue;
        }
        match serde_json::from_value::<CodeTable>(value) {
            Ok(table) => {
                tables.insert(name.clone(), dedupe_text_codes(&name, table));
            }
            Err(error) => warn!(table = %name, %error, "skipping malformed code table"),
        }
    }
    debug!(tables = tables.len(), "parsed code tables");
    Ok(tables)
}

/// Labels document: an object of localisation key to display text.
pub fn parse_labels(json: &str) -> Result<BTreeMap<String, String>> {
    let Value::Object(members) = serde_json::from_str(json)? else {
        return Err(CatalogError::NotAnObject);
    };
    Ok(members
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(label) => Some((key, label)),
            _ => None,
        })
        .collect())
}

pub fn load_labels(path: &Path) -> Result<BTreeMap<String, String>> {
    parse_labels(&read(path)?)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Tables made only of bare strings lose repeated entries; the repeats are
/// logged.
fn dedupe_text_codes(name: &str, table: CodeTable) -> CodeTable {
    let CodeTable::Flat(entries) = table else {
        return table;
    };
    let text_only = entries
        .iter()
        .all(|entry| entry.is_bare() && matches!(entry.code, CodeValue::Text(_)));
    if !text_only {
        return CodeTable::Flat(entries);
    }
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    let mut unique: Vec<CodeDefinition> = Vec::with_capacity(entries.len());
    for entry in entries {
        let text = entry.code.to_string();
        if seen.insert(text.clone()) {
            unique.push(entry);
        } else {
            duplicates.push(text);
        }
    }
    if !duplicates.is_empty() {
        debug!(table = %name, duplicates = %duplicates.join(","), "duplicate codes removed");
    }
    CodeTable::Flat(unique)
}
