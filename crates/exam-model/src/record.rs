//! Exam, visit and patient records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::schema::{Definition, ExamDefinition, GroupDefinition};

/// A filled-in exam. The value tree lives under the key named after the
/// definition (`{"Refraction": {...}}`), next to the bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub definition: ExamDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<String>,
    #[serde(default)]
    pub has_started: bool,
    #[serde(default)]
    pub has_ended: bool,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Exam {
    /// A new exam holding the schema's static defaults.
    pub fn new(id: impl Into<String>, definition: ExamDefinition) -> Self {
        let mut data = Map::new();
        data.insert(definition.name.clone(), default_tree(&definition.fields));
        Self {
            id: id.into(),
            definition,
            visit_id: None,
            has_started: false,
            has_ended: false,
            is_dirty: false,
            data,
        }
    }

    #[must_use]
    pub fn with_visit(mut self, visit_id: impl Into<String>) -> Self {
        self.visit_id = Some(visit_id.into());
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Value) -> Self {
        self.data.insert(self.definition.name.clone(), values);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The value tree, if any was stored.
    pub fn values(&self) -> Option<&Value> {
        self.data.get(&self.definition.name)
    }

    /// Replaces the value tree and marks the exam dirty.
    pub fn set_values(&mut self, values: Value) {
        self.data.insert(self.definition.name.clone(), values);
        self.is_dirty = true;
    }

    /// Ended exams are read only.
    pub fn is_locked(&self) -> bool {
        self.has_ended
    }
}

/// A patient visit and the exams attached to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub custom_exam_ids: Vec<String>,
    #[serde(default)]
    pub pre_custom_exam_ids: Vec<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Visit {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Regular exams first, then pre-exams.
    pub fn exam_ids(&self) -> impl Iterator<Item = &str> {
        self.custom_exam_ids
            .iter()
            .chain(&self.pre_custom_exam_ids)
            .map(String::as_str)
    }

    /// JSON view of the whole record, used for `visit.` paths.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Patient {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A default value of the form `[path]`, resolved against live data.
pub fn dynamic_default_path(value: &Value) -> Option<&str> {
    value
        .as_str()?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|path| !path.is_empty())
}

/// Deep emptiness: null, blank strings, and lists or objects holding only
/// empty values.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.values().all(is_blank),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn default_tree(fields: &[Definition]) -> Value {
    let mut tree = Map::new();
    for definition in fields {
        if let Some(value) = default_value(definition) {
            tree.insert(definition.name().to_string(), value);
        }
    }
    Value::Object(tree)
}

fn default_value(definition: &Definition) -> Option<Value> {
    match definition {
        Definition::Group(group) => Some(group_default(group)),
        Definition::Field(field) => field
            .default_value
            .as_ref()
            .filter(|value| dynamic_default_path(value).is_none())
            .cloned(),
    }
}

fn group_default(group: &GroupDefinition) -> Value {
    if group.is_repeating() {
        return Value::Array(Vec::new());
    }
    default_tree(&group.fields)
}
