//! Turning entered text back into stored values.

use exam_model::{CodeValue, FieldDefinition, FieldOptions, Selection, fold_key, format_number};
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::context::FormatContext;
use crate::error::NumericError;
use crate::number::parse_f64;

/// Maps display text of an option back to its stored code. A certainty
/// marker on the text is carried over to the stored value. Text matching no
/// option is kept only for freestyle fields.
pub fn parse_option_text(
    definition: &FieldDefinition,
    text: &str,
    ctx: &FormatContext<'_>,
) -> Option<Value> {
    let selection = Selection::decode(text);
    if selection.value.trim().is_empty() {
        return None;
    }
    let code = match &definition.options {
        None => return Some(Value::String(text.to_string())),
        Some(FieldOptions::Table(reference)) => {
            ctx.catalog
                .try_parse(&reference.to_string(), &selection.value, None)
        }
        Some(options) => match_inline(options, &selection.value, ctx),
    };
    match code {
        Some(code) => Some(encode(code, &selection)),
        None if definition.is_freestyle() && ctx.options.allows_freestyle() => {
            Some(Value::String(text.to_string()))
        }
        None => {
            trace!(field = %definition.name, %text, "text matches no option");
            None
        }
    }
}

fn match_inline(options: &FieldOptions, text: &str, ctx: &FormatContext<'_>) -> Option<CodeValue> {
    let wanted = fold_key(text);
    let entries: Vec<_> = match options {
        FieldOptions::Table(_) => return None,
        FieldOptions::Inline(entries) => entries.iter().collect(),
        FieldOptions::Grouped(groups) => groups.iter().flatten().collect(),
    };
    entries
        .into_iter()
        .find(|entry| fold_key(&ctx.catalog.format_entry(entry, None)) == wanted)
        .map(|entry| entry.code.clone())
}

fn encode(code: CodeValue, selection: &Selection) -> Value {
    if selection.certainty.is_none() {
        return code.to_json();
    }
    Value::String(Selection::new(code.to_string(), selection.certainty).encode())
}

/// Outcome of reading a numeric field entry. The entered text is always
/// kept so the field can show what was typed next to the error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericInput {
    pub value: Value,
    pub text: String,
    pub error: Option<NumericError>,
}

impl NumericInput {
    fn accepted(value: Value, text: String) -> Self {
        Self {
            value,
            text,
            error: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

pub fn parse_numeric(input: &Value, definition: &FieldDefinition) -> NumericInput {
    match input {
        Value::Null => NumericInput::accepted(Value::Null, String::new()),
        Value::Number(number) => {
            let text = number.as_f64().map(format_number).unwrap_or_default();
            let error = number.as_f64().and_then(|v| check_range(v, definition));
            NumericInput {
                value: input.clone(),
                text,
                error,
            }
        }
        Value::String(text) => parse_numeric_text(text, definition),
        other => NumericInput {
            value: other.clone(),
            text: other.to_string(),
            error: Some(NumericError::NotANumber),
        },
    }
}

fn parse_numeric_text(text: &str, definition: &FieldDefinition) -> NumericInput {
    if text.trim().is_empty() {
        return NumericInput::accepted(Value::Null, text.to_string());
    }
    let is_option = definition
        .options
        .as_ref()
        .is_some_and(|options| options.contains_code(&Value::String(text.to_string())));
    let code_suffix = definition
        .suffix
        .as_ref()
        .and_then(|suffix| suffix.text())
        .is_some_and(|suffix| suffix.ends_with("Codes"));
    if definition.is_freestyle() || is_option || code_suffix {
        return NumericInput::accepted(Value::String(text.to_string()), text.to_string());
    }
    match parse_f64(text) {
        Some(number) => NumericInput {
            value: exam_model::number_to_json(number),
            text: text.to_string(),
            error: check_range(number, definition),
        },
        None => NumericInput {
            value: Value::String(text.to_string()),
            text: text.to_string(),
            error: Some(NumericError::NotANumber),
        },
    }
}

fn check_range(value: f64, definition: &FieldDefinition) -> Option<NumericError> {
    if let Some(minimum) = definition.min_value
        && value < minimum
    {
        return Some(NumericError::BelowMinimum { minimum });
    }
    if let Some(maximum) = definition.max_value
        && value > maximum
    {
        return Some(NumericError::AboveMaximum { maximum });
    }
    let step = definition.step_size.as_ref()?.granularity()?;
    if off_step(value, step) {
        return Some(NumericError::OffStep { step });
    }
    None
}

/// Step check in thousandths, only for steps that are whole thousandths.
fn off_step(value: f64, step: f64) -> bool {
    let step_milli = step * 1000.0;
    if step_milli <= 0.0 || (step_milli - step_milli.round()).abs() > 1e-9 {
        return false;
    }
    let value_milli = (value * 1000.0).round() as i64;
    value_milli % (step_milli.round() as i64) != 0
}
