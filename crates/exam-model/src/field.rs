use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::code::CodeDefinition;

/// Field type tag, parsed once from the loose `type` string of a schema
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Numeric,
    EmailAddress,
    Phone,
    Prism,
    /// `SRx`: glasses prescription sub-schema.
    GlassesRx,
    /// `CRx`: contact lens prescription sub-schema.
    ContactsRx,
    /// Date family (`date`, `pastDate`, `recentDate`, `futureDate`, ...).
    Date(String),
    /// Date-time family (`futureDateTime`, ...).
    DateTime(String),
    /// Time family (`time`, `startTime`, ...).
    Time(String),
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Numeric => "numeric",
            FieldType::EmailAddress => "email-address",
            FieldType::Phone => "phone",
            FieldType::Prism => "prism",
            FieldType::GlassesRx => "SRx",
            FieldType::ContactsRx => "CRx",
            FieldType::Date(name)
            | FieldType::DateTime(name)
            | FieldType::Time(name)
            | FieldType::Other(name) => name,
        }
    }

    /// Date and date-time types both render as dates.
    pub fn is_date_family(&self) -> bool {
        matches!(self, FieldType::Date(_) | FieldType::DateTime(_))
    }

    pub fn is_time_family(&self) -> bool {
        matches!(self, FieldType::Time(_))
    }

    pub fn is_prescription(&self) -> bool {
        matches!(self, FieldType::GlassesRx | FieldType::ContactsRx)
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => FieldType::Text,
            "numeric" => FieldType::Numeric,
            "email-address" => FieldType::EmailAddress,
            "phone" => FieldType::Phone,
            "prism" => FieldType::Prism,
            "SRx" | "GlassesRx" => FieldType::GlassesRx,
            "CRx" | "ContactsRx" => FieldType::ContactsRx,
            "date" => FieldType::Date(name),
            "time" => FieldType::Time(name),
            _ if name.contains("DateTime") => FieldType::DateTime(name),
            _ if name.contains("Date") => FieldType::Date(name),
            _ if name.contains("Time") => FieldType::Time(name),
            _ => FieldType::Other(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldType::from(s.to_string()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a catalog table: `"table"` or `"table.identifierField"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TableRef {
    pub table: String,
    /// Entry attribute used as match/format key; `code` when absent.
    pub identifier: Option<String>,
}

impl TableRef {
    pub fn parse(reference: &str) -> Self {
        match reference.split_once('.') {
            Some((table, identifier)) if !identifier.is_empty() => Self {
                table: table.to_string(),
                identifier: Some(identifier.to_string()),
            },
            Some((table, _)) => Self {
                table: table.to_string(),
                identifier: None,
            },
            None => Self {
                table: reference.to_string(),
                identifier: None,
            },
        }
    }

    pub fn identifier(&self) -> &str {
        self.identifier.as_deref().unwrap_or("code")
    }
}

impl From<String> for TableRef {
    fn from(reference: String) -> Self {
        Self::parse(&reference)
    }
}

impl From<&str> for TableRef {
    fn from(reference: &str) -> Self {
        Self::parse(reference)
    }
}

impl From<TableRef> for String {
    fn from(reference: TableRef) -> Self {
        reference.to_string()
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(identifier) => write!(f, "{}.{}", self.table, identifier),
            None => f.write_str(&self.table),
        }
    }
}

/// Allowed values of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOptions {
    /// Values come from a catalog table.
    Table(TableRef),
    /// Values listed inline.
    Inline(Vec<CodeDefinition>),
    /// Inline values split into sub-lists (rendered as separate pickers).
    Grouped(Vec<Vec<CodeDefinition>>),
}

impl FieldOptions {
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            FieldOptions::Table(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn inline(&self) -> Option<&[CodeDefinition]> {
        match self {
            FieldOptions::Inline(entries) => Some(entries),
            _ => None,
        }
    }

    /// Number of inline entries; tables count as zero.
    pub fn len(&self) -> usize {
        match self {
            FieldOptions::Table(_) => 0,
            FieldOptions::Inline(entries) => entries.len(),
            FieldOptions::Grouped(groups) => groups.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when a JSON value equals one of the inline codes.
    pub fn contains_code(&self, value: &Value) -> bool {
        match self {
            FieldOptions::Table(_) => false,
            FieldOptions::Inline(entries) => entries.iter().any(|e| e.code.matches_json(value)),
            FieldOptions::Grouped(groups) => groups
                .iter()
                .flatten()
                .any(|e| e.code.matches_json(value)),
        }
    }
}

/// Prefix/suffix: display text, or an array sentinel reserved for
/// multi-column tiles (a sentinel prefix enables tri-state selection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Affix {
    Text(String),
    Sentinel(Vec<Value>),
}

impl Affix {
    pub fn text(&self) -> Option<&str> {
        match self {
            Affix::Text(text) => Some(text),
            Affix::Sentinel(_) => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Affix::Sentinel(_))
    }
}

/// Step size of a numeric field; a graded list uses its first entry as the
/// granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepSize {
    Single(f64),
    Graded(Vec<f64>),
}

impl StepSize {
    pub fn granularity(&self) -> Option<f64> {
        match self {
            StepSize::Single(step) => Some(*step),
            StepSize::Graded(steps) => steps.first().copied(),
        }
    }
}

/// Visibility rule: a flag or a bracketed expression such as `[path]`,
/// `[!path]` or `[path==value]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Visibility {
    Flag(bool),
    Expression(String),
}

/// Leaf node of the schema tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<FieldOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<StepSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freestyle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value: Option<bool>,

    /// Sentinel meaning "nothing abnormal to display".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Affix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<Affix>,

    /// Dotted path of the definition this one borrows from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_field: Option<String>,
    /// Catalog filter; `[relativePath]` values are filled from live data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<Visibility>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted_label: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Effective type: the explicit tag, else numeric when a range bound is
    /// present, else text.
    pub fn kind(&self) -> FieldType {
        if let Some(field_type) = &self.field_type {
            return field_type.clone();
        }
        if self.is_numeric() {
            FieldType::Numeric
        } else {
            FieldType::Text
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.min_value.is_some() || self.max_value.is_some()
    }

    /// Display label, falling back to the name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn is_multi_value(&self) -> bool {
        self.multi_value == Some(true)
    }

    pub fn is_freestyle(&self) -> bool {
        self.freestyle == Some(true)
    }

    pub fn is_required(&self) -> bool {
        self.required == Some(true)
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly == Some(true)
    }

    /// Tri-state selection is enabled by an array sentinel prefix.
    pub fn is_tri_state(&self) -> bool {
        self.prefix.as_ref().is_some_and(Affix::is_sentinel)
    }

    /// Catalog table backing this field, when options name one.
    pub fn code_table(&self) -> Option<&TableRef> {
        self.options.as_ref().and_then(FieldOptions::table)
    }

    pub fn inline_options(&self) -> Option<&[CodeDefinition]> {
        self.options.as_ref().and_then(FieldOptions::inline)
    }

    /// Two inline options whose first entry is the default: a checkbox.
    pub fn is_checkbox(&self) -> bool {
        match (self.inline_options(), &self.default_value) {
            (Some([first, _]), Some(default)) => first.code.matches_json(default),
            _ => false,
        }
    }

    /// Suffix text to render. Array sentinels and code-type suffixes
    /// (containing `Code`) render nothing.
    pub fn display_suffix(&self) -> &str {
        match self.suffix.as_ref().and_then(Affix::text) {
            Some(suffix) if !suffix.contains("Code") => suffix,
            _ => "",
        }
    }

    /// Prefix text to render for `value`. A `+` prefix is a sign rule, not
    /// text, and inline option values carry no prefix.
    pub fn display_prefix(&self, value: &Value) -> &str {
        let Some(prefix) = self.prefix.as_ref().and_then(Affix::text) else {
            return "";
        };
        if prefix == "+" {
            return "";
        }
        if self
            .options
            .as_ref()
            .is_some_and(|options| options.contains_code(value))
        {
            return "";
        }
        prefix
    }

    pub fn forces_sign(&self) -> bool {
        matches!(&self.prefix, Some(Affix::Text(prefix)) if prefix == "+")
    }

    /// True when `value` equals the normal value sentinel.
    pub fn is_normal(&self, value: &Value) -> bool {
        self.normal_value.as_ref().is_some_and(|normal| normal == value)
    }

    /// Copy of `target` with every attribute this definition sets laid over
    /// it. The name stays this definition's own.
    #[must_use]
    pub fn merged_over(&self, target: &FieldDefinition) -> FieldDefinition {
        let own = self.clone();
        let base = target.clone();
        FieldDefinition {
            name: own.name,
            label: own.label.or(base.label),
            field_type: own.field_type.or(base.field_type),
            options: own.options.or(base.options),
            min_value: own.min_value.or(base.min_value),
            max_value: own.max_value.or(base.max_value),
            step_size: own.step_size.or(base.step_size),
            group_size: own.group_size.or(base.group_size),
            decimals: own.decimals.or(base.decimals),
            min_length: own.min_length.or(base.min_length),
            max_length: own.max_length.or(base.max_length),
            required: own.required.or(base.required),
            readonly: own.readonly.or(base.readonly),
            freestyle: own.freestyle.or(base.freestyle),
            multi_value: own.multi_value.or(base.multi_value),
            normal_value: own.normal_value.or(base.normal_value),
            default_value: own.default_value.or(base.default_value),
            prefix: own.prefix.or(base.prefix),
            suffix: own.suffix.or(base.suffix),
            mapped_field: own.mapped_field.or(base.mapped_field),
            filter: own.filter.or(base.filter),
            visible: own.visible.or(base.visible),
            highlighted_label: own.highlighted_label.or(base.highlighted_label),
            highlighted_value: own.highlighted_value.or(base.highlighted_value),
            delimiter: own.delimiter.or(base.delimiter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags_parse_into_families() {
        assert_eq!(FieldType::from("pastDate".to_string()), FieldType::Date("pastDate".into()));
        assert_eq!(
            FieldType::from("futureDateTime".to_string()),
            FieldType::DateTime("futureDateTime".into())
        );
        assert_eq!(FieldType::from("SRx".to_string()), FieldType::GlassesRx);
        assert_eq!(FieldType::from("ContactsRx".to_string()), FieldType::ContactsRx);
        assert!(FieldType::from("startTime".to_string()).is_time_family());
        assert_eq!(FieldType::from("email-address".to_string()), FieldType::EmailAddress);
    }

    #[test]
    fn numeric_kind_is_inferred_from_range() {
        let field: FieldDefinition =
            serde_json::from_value(json!({"name": "sph", "minValue": -20, "maxValue": 20})).unwrap();
        assert_eq!(field.kind(), FieldType::Numeric);
        assert_eq!(FieldDefinition::new("notes").kind(), FieldType::Text);
    }

    #[test]
    fn options_accept_tables_and_inline_lists() {
        let table: FieldOptions = serde_json::from_value(json!("insuranceProviders.povOnlineId")).unwrap();
        assert_eq!(
            table.table(),
            Some(&TableRef {
                table: "insuranceProviders".into(),
                identifier: Some("povOnlineId".into())
            })
        );
        let inline: FieldOptions = serde_json::from_value(json!(["Clear", "Hazy"])).unwrap();
        assert_eq!(inline.len(), 2);
        let grouped: FieldOptions = serde_json::from_value(json!([["1", "2"], ["3"]])).unwrap();
        assert!(matches!(grouped, FieldOptions::Grouped(ref groups) if groups.len() == 2));
    }

    #[test]
    fn suffix_with_code_marker_is_hidden() {
        let mut field = FieldDefinition::new("va");
        field.suffix = Some(Affix::Text("vaCodes".into()));
        assert_eq!(field.display_suffix(), "");
        field.suffix = Some(Affix::Text(" mm".into()));
        assert_eq!(field.display_suffix(), " mm");
    }

    #[test]
    fn own_attributes_win_when_merging() {
        let mut target = FieldDefinition::new("sph");
        target.min_value = Some(-20.0);
        target.decimals = Some(2);
        target.label = Some("Sphere".into());
        let mut own = FieldDefinition::new("finalSph");
        own.label = Some("Final sphere".into());
        let merged = own.merged_over(&target);
        assert_eq!(merged.name, "finalSph");
        assert_eq!(merged.label(), "Final sphere");
        assert_eq!(merged.min_value, Some(-20.0));
        assert_eq!(merged.decimals, Some(2));
    }
}
