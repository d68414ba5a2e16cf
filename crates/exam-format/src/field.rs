//! Display text for a field value, driven by its definition.

use exam_model::{
    CodeDefinition, FieldDefinition, FieldOptions, FieldType, Selection, is_blank,
};
use exam_codes::raw_text;
use serde_json::Value;

use crate::context::FormatContext;
use crate::datetime::{format_date_text, format_time_text};
use crate::number::{format_decimal, is_numeric_text, with_sign};
use crate::prism::format_prism;

/// Display label of a definition.
pub fn format_label(definition: &FieldDefinition) -> &str {
    definition.label()
}

/// Formats a stored value for display. A missing value falls back to the
/// definition's default; blank values and the normal value render empty.
pub fn format_field_value(
    value: Option<&Value>,
    definition: &FieldDefinition,
    ctx: &FormatContext<'_>,
) -> String {
    let Some(value) = value.or(definition.default_value.as_ref()) else {
        return String::new();
    };
    if is_blank(value) || definition.is_normal(value) {
        return String::new();
    }
    if definition.is_checkbox() && *value == Value::Bool(true) {
        return definition.label().to_string();
    }

    let kind = definition.kind();
    if kind.is_date_family() || kind.is_time_family() {
        let text = raw_text(value);
        let core = if kind.is_date_family() {
            format_date_text(&text, ctx.today())
        } else {
            format_time_text(&text)
        };
        return wrap(definition, value, core);
    }
    if kind == FieldType::Prism {
        return format_prism(value, ctx.catalog);
    }

    match &definition.options {
        Some(FieldOptions::Table(reference)) => {
            let table = reference.to_string();
            let suffix = definition.display_suffix();
            format_each(value, ctx, |item| {
                format_code_item(item, suffix, |code| ctx.catalog.format(&table, code))
            })
        }
        Some(options @ (FieldOptions::Inline(_) | FieldOptions::Grouped(_))) => {
            let core = format_each(value, ctx, |item| {
                format_code_item(item, "", |code| format_inline(options, code, ctx))
            });
            wrap(definition, value, core)
        }
        None => {
            let core = format_each(value, ctx, |item| format_value(item, definition));
            wrap(definition, value, core)
        }
    }
}

/// Core text of a plain value: numbers honour `decimals`, and a `+` prefix
/// signs non-negative numbers and numeric text.
pub fn format_value(value: &Value, definition: &FieldDefinition) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::Number(number) => match number.as_f64() {
            Some(number) => format_decimal(number, definition.decimals),
            None => number.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(_) | Value::Object(_) => return String::new(),
    };
    let signed = match value {
        Value::Number(_) => true,
        Value::String(text) => is_numeric_text(text),
        _ => false,
    };
    if signed && definition.forces_sign() {
        with_sign(text)
    } else {
        text
    }
}

fn wrap(definition: &FieldDefinition, value: &Value, core: String) -> String {
    if core.is_empty() {
        return core;
    }
    format!(
        "{}{}{}",
        definition.display_prefix(value),
        core,
        definition.display_suffix()
    )
}

/// Lists format element by element and join with the configured
/// separator; blank elements are skipped.
fn format_each<F>(value: &Value, ctx: &FormatContext<'_>, mut format: F) -> String
where
    F: FnMut(&Value) -> String,
{
    match value {
        Value::Array(items) => items
            .iter()
            .map(&mut format)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(ctx.separator()),
        single => format(single),
    }
}

/// One code-backed entry: certainty marker, code text, suffix.
fn format_code_item<F>(item: &Value, suffix: &str, format_code: F) -> String
where
    F: FnOnce(&Value) -> String,
{
    if is_blank(item) {
        return String::new();
    }
    match item {
        Value::String(stored) => {
            let selection = Selection::decode(stored);
            let code = Value::String(selection.value.clone());
            format!("{}{}{}", selection.marker(), format_code(&code), suffix)
        }
        other => format!("{}{}", format_code(other), suffix),
    }
}

fn format_inline(options: &FieldOptions, code: &Value, ctx: &FormatContext<'_>) -> String {
    match find_inline(options, code) {
        Some(entry) => ctx.catalog.format_entry(entry, None),
        None => raw_text(code),
    }
}

/// Inline entry whose code equals `code`.
pub fn find_inline<'a>(options: &'a FieldOptions, code: &Value) -> Option<&'a CodeDefinition> {
    match options {
        FieldOptions::Table(_) => None,
        FieldOptions::Inline(entries) => entries.iter().find(|e| e.code.matches_json(code)),
        FieldOptions::Grouped(groups) => groups.iter().flatten().find(|e| e.code.matches_json(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use exam_codes::CodeCatalog;
    use exam_model::EngineOptions;
    use serde_json::json;

    fn field(value: Value) -> FieldDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn render(value: Value, definition: &FieldDefinition) -> String {
        let catalog = CodeCatalog::with_builtin_tables();
        let options = EngineOptions::default().with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        format_field_value(Some(&value), definition, &FormatContext::new(&catalog, &options))
    }

    #[test]
    fn signed_fixed_decimals() {
        let sph = field(json!({"name": "sph", "minValue": -20, "maxValue": 20, "decimals": 2, "prefix": "+"}));
        assert_eq!(render(json!(1.5), &sph), "+1.50");
        assert_eq!(render(json!(-0.25), &sph), "-0.25");
        assert_eq!(render(json!("2"), &sph), "+2");
        assert_eq!(render(json!("plano"), &sph), "plano");
    }

    #[test]
    fn normal_and_blank_values_render_empty() {
        let lids = field(json!({"name": "lids", "normalValue": "Normal"}));
        assert_eq!(render(json!("Normal"), &lids), "");
        assert_eq!(render(json!("  "), &lids), "");
        assert_eq!(render(json!([]), &lids), "");
    }

    #[test]
    fn code_lists_keep_markers_and_suffix() {
        let recall = field(json!({"name": "recall", "options": "recallCode", "multiValue": true, "suffix": " later"}));
        assert_eq!(render(json!([0, 2]), &recall), "Year(s) later, Week(s) later");
        let size = field(json!({"name": "size", "options": "size", "suffix": "sizeCode"}));
        assert_eq!(render(json!("(?) M"), &size), "(?) Medium");
    }

    #[test]
    fn checkbox_true_renders_label() {
        let dilated = field(json!({"name": "dilated", "label": "Dilated", "options": [false, true], "defaultValue": false}));
        assert_eq!(render(json!(true), &dilated), "Dilated");
    }

    #[test]
    fn inline_options_skip_prefix() {
        let va = field(json!({"name": "va", "prefix": "20/", "options": ["CF", "HM"]}));
        assert_eq!(render(json!("CF"), &va), "CF");
        assert_eq!(render(json!("40"), &va), "20/40");
    }

    #[test]
    fn dates_and_times_wrap_affixes() {
        let recheck = field(json!({"name": "recheck", "type": "futureDate", "prefix": "on "}));
        assert_eq!(render(json!("2025-01-03"), &recheck), "on Jan 3rd 2025");
        let start = field(json!({"name": "start", "type": "startTime"}));
        assert_eq!(render(json!("09:15"), &start), "9:15 AM");
    }
}
