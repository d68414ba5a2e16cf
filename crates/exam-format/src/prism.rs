//! Prism prescriptions.
//!
//! A prism value holds up to two components: a horizontal magnitude
//! `prism1` with direction `prism1b` (in/out) and a vertical magnitude
//! `prism2` with direction `prism2b` (up/down).
//!
//! Older records store the prism as text instead: `<amount> <I|O|U|D>`,
//! optionally followed by a second `<amount> <U|D>` pair. A `0`/`1`
//! direction in the first pair means in/out.

use exam_codes::CodeCatalog;
use serde_json::Value;

use crate::number::{format_decimal, parse_f64};

pub const HORIZONTAL_TABLE: &str = "prism1b";
pub const VERTICAL_TABLE: &str = "prism2b";

#[derive(Debug, Clone, PartialEq)]
pub struct PrismComponent {
    pub magnitude: f64,
    pub direction: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prism {
    pub horizontal: Option<PrismComponent>,
    pub vertical: Option<PrismComponent>,
}

impl Prism {
    /// Reads the four prism attributes, or the text form. Missing or zero
    /// magnitudes leave the component out.
    pub fn from_value(value: &Value) -> Self {
        if let Value::String(text) = value {
            return Self::parse(text);
        }
        let component = |magnitude: &str, direction: &str| {
            let magnitude = value.get(magnitude).and_then(magnitude_of)?;
            Some(PrismComponent {
                magnitude,
                direction: value.get(direction).cloned().unwrap_or(Value::Null),
            })
        };
        Self {
            horizontal: component("prism1", "prism1b"),
            vertical: component("prism2", "prism2b"),
        }
    }

    pub fn parse(text: &str) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let component = |magnitude: &str, direction: Option<&str>| {
            Some(PrismComponent {
                magnitude: parse_f64(magnitude).filter(|magnitude| *magnitude != 0.0)?,
                direction: direction.map_or(Value::Null, direction_code),
            })
        };
        match tokens.as_slice() {
            [] => Self::default(),
            [magnitude] => Self {
                horizontal: component(*magnitude, None),
                vertical: None,
            },
            [magnitude, direction @ ("U" | "D")] => Self {
                horizontal: None,
                vertical: component(*magnitude, Some(*direction)),
            },
            [magnitude, direction] => Self {
                horizontal: component(*magnitude, Some(*direction)),
                vertical: None,
            },
            [horizontal, h_direction, vertical, rest @ ..] => Self {
                horizontal: component(*horizontal, Some(*h_direction)),
                vertical: component(*vertical, rest.first().copied()),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.horizontal.is_none() && self.vertical.is_none()
    }

    /// `2ΔIn 1.5ΔUp`, directions formatted through the catalog.
    pub fn format(&self, catalog: &CodeCatalog) -> String {
        let parts = [
            (self.horizontal.as_ref(), HORIZONTAL_TABLE),
            (self.vertical.as_ref(), VERTICAL_TABLE),
        ];
        parts
            .into_iter()
            .filter_map(|(component, table)| {
                let component = component?;
                let direction = catalog.format(table, &component.direction);
                Some(format!(
                    "{}\u{0394}{}",
                    format_decimal(component.magnitude, None),
                    direction
                ))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn magnitude_of(value: &Value) -> Option<f64> {
    let magnitude = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_f64(text),
        _ => None,
    }?;
    (magnitude != 0.0).then_some(magnitude)
}

/// Catalog code of a text direction letter; `0`/`1` are the legacy in/out
/// digits.
fn direction_code(direction: &str) -> Value {
    match direction {
        "I" | "0" | "U" => Value::from(0),
        "O" | "1" | "D" => Value::from(1),
        other => Value::String(other.to_string()),
    }
}

pub fn format_prism(value: &Value, catalog: &CodeCatalog) -> String {
    Prism::from_value(value).format(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_components_are_dropped() {
        let catalog = CodeCatalog::with_builtin_tables();
        assert_eq!(
            format_prism(&json!({"prism1": 2, "prism1b": 1, "prism2": 0, "prism2b": 0}), &catalog),
            "2\u{0394}Out"
        );
        assert_eq!(
            format_prism(&json!({"prism1": 0.5, "prism1b": 0, "prism2": "1.5", "prism2b": 0}), &catalog),
            "0.5\u{0394}In 1.5\u{0394}Up"
        );
        assert_eq!(format_prism(&json!({}), &catalog), "");
    }

    #[test]
    fn text_prisms_are_parsed() {
        let catalog = CodeCatalog::with_builtin_tables();
        assert_eq!(format_prism(&json!("2 O 1 U"), &catalog), "2\u{0394}Out 1\u{0394}Up");
        assert_eq!(format_prism(&json!("1.5 D"), &catalog), "1.5\u{0394}Down");
        assert_eq!(format_prism(&json!("3 0"), &catalog), "3\u{0394}In");
        assert_eq!(format_prism(&json!("0 I 0 U"), &catalog), "");
        assert_eq!(format_prism(&json!("  "), &catalog), "");
        assert_eq!(
            Prism::parse("2 I 1"),
            Prism {
                horizontal: Some(PrismComponent {
                    magnitude: 2.0,
                    direction: json!(0)
                }),
                vertical: Some(PrismComponent {
                    magnitude: 1.0,
                    direction: Value::Null
                }),
            }
        );
    }
}
