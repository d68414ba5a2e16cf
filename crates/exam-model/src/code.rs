//! Code definitions: single entries of an enumerated value table.
//!
//! Tables arrive in a loose shape. An entry is either a bare value
//! (`"OD"`, `3`, `true`) or an object carrying `code` plus an optional
//! `description` or localisation `key`, and any number of extra identifier
//! attributes. Both shapes are normalised into [`CodeDefinition`] here.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored code value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CodeValue {
    /// Convert a JSON scalar into a code value. Objects, arrays and null
    /// have no code representation.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => number.as_f64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    /// JSON form of the value; integral numbers stay integers.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => number_to_json(*number),
            Self::Text(text) => Value::String(text.clone()),
        }
    }

    /// Loose equality against a JSON value, the way stored values are
    /// compared with table codes.
    pub fn matches_json(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool(left), Value::Bool(right)) => left == right,
            (Self::Number(left), Value::Number(right)) => {
                right.as_f64().is_some_and(|right| *left == right)
            }
            (Self::Text(left), Value::String(right)) => left == right,
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => f.write_str(&format_number(*number)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for CodeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CodeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CodeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for CodeValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for CodeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for CodeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Formats a number the way stored numbers print: integers without a
/// fraction, everything else without trailing zeros.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{value}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// JSON number for an f64, keeping integral values as integers.
pub fn number_to_json(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// One entry of a code table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCode", into = "RawCode")]
pub struct CodeDefinition {
    /// The stored value.
    pub code: CodeValue,
    /// Literal display text.
    pub description: Option<String>,
    /// Localisation key; resolved through the catalog labels.
    pub key: Option<String>,
    /// Extra identifier attributes (e.g. `povOnlineId`, `category`).
    pub attributes: BTreeMap<String, Value>,
}

impl CodeDefinition {
    /// An entry with only a code.
    pub fn bare(code: impl Into<CodeValue>) -> Self {
        Self {
            code: code.into(),
            description: None,
            key: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn described(code: impl Into<CodeValue>, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::bare(code)
        }
    }

    pub fn keyed(code: impl Into<CodeValue>, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::bare(code)
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Reads an attribute by name. `code`, `description` and `key` map to
    /// the dedicated fields.
    pub fn attribute(&self, name: &str) -> Option<CodeValue> {
        match name {
            "code" => Some(self.code.clone()),
            "description" => self.description.clone().map(CodeValue::Text),
            "key" => self.key.clone().map(CodeValue::Text),
            other => self.attributes.get(other).and_then(CodeValue::from_json),
        }
    }

    /// Raw JSON of an attribute, used by table filters.
    pub fn attribute_json(&self, name: &str) -> Option<Value> {
        match name {
            "code" => Some(self.code.to_json()),
            "description" => self.description.clone().map(Value::String),
            "key" => self.key.clone().map(Value::String),
            other => self.attributes.get(other).cloned(),
        }
    }

    pub fn is_bare(&self) -> bool {
        self.description.is_none() && self.key.is_none() && self.attributes.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCode {
    Bare(CodeValue),
    Entry(RawCodeEntry),
}

#[derive(Serialize, Deserialize)]
struct RawCodeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<CodeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(flatten)]
    attributes: BTreeMap<String, Value>,
}

impl From<RawCode> for CodeDefinition {
    fn from(raw: RawCode) -> Self {
        match raw {
            RawCode::Bare(code) => Self::bare(code),
            RawCode::Entry(entry) => {
                // Entries without a code are addressed by their text.
                let code = entry.code.unwrap_or_else(|| {
                    CodeValue::Text(
                        entry
                            .description
                            .clone()
                            .or_else(|| entry.key.clone())
                            .unwrap_or_default(),
                    )
                });
                Self {
                    code,
                    description: entry.description,
                    key: entry.key,
                    attributes: entry.attributes,
                }
            }
        }
    }
}

impl From<CodeDefinition> for RawCode {
    fn from(definition: CodeDefinition) -> Self {
        if definition.is_bare() {
            return RawCode::Bare(definition.code);
        }
        RawCode::Entry(RawCodeEntry {
            code: Some(definition.code),
            description: definition.description,
            key: definition.key,
            attributes: definition.attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_object_entries_deserialize() {
        let entries: Vec<CodeDefinition> =
            serde_json::from_str(r#"["OD", 3, {"code": 0, "description": "In"}, {"code": "S", "key": "small", "group": "a"}]"#)
                .expect("parse entries");
        assert_eq!(entries[0], CodeDefinition::bare("OD"));
        assert_eq!(entries[1].code, CodeValue::Number(3.0));
        assert_eq!(entries[2].description.as_deref(), Some("In"));
        assert_eq!(entries[3].key.as_deref(), Some("small"));
        assert_eq!(entries[3].attribute("group"), Some(CodeValue::from("a")));
    }

    #[test]
    fn numbers_print_without_trailing_zeros() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-1.25), "-1.25");
        assert_eq!(CodeValue::Number(1.0).to_json(), serde_json::json!(1));
    }
}
