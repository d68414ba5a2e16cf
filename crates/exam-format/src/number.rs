//! Number display.

use exam_model::format_number;

/// Parses trimmed text as a finite f64.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn is_numeric_text(value: &str) -> bool {
    parse_f64(value).is_some()
}

/// Fixed decimals when configured, else the shortest form. A negative
/// count means free-form.
pub fn format_decimal(value: f64, decimals: Option<i32>) -> String {
    match decimals.and_then(|decimals| usize::try_from(decimals).ok()) {
        Some(places) => format!("{value:.places$}"),
        None => format_number(value),
    }
}

/// Puts an explicit `+` in front of text that carries no sign yet.
pub fn with_sign(text: String) -> String {
    if text.is_empty() || text.starts_with('-') || text.starts_with('+') {
        text
    } else {
        format!("+{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_and_free_decimals() {
        assert_eq!(format_decimal(1.5, Some(2)), "1.50");
        assert_eq!(format_decimal(1.5, None), "1.5");
        assert_eq!(format_decimal(2.0, None), "2");
        assert_eq!(format_decimal(2.4, Some(-1)), "2.4");
        assert_eq!(format_decimal(2.4, Some(0)), "2");
        assert_eq!(with_sign("1.50".into()), "+1.50");
        assert_eq!(with_sign("-0.25".into()), "-0.25");
    }

    #[test]
    fn rejects_non_finite_text() {
        assert_eq!(parse_f64(" +1.50 "), Some(1.5));
        assert_eq!(parse_f64("inf"), None);
        assert_eq!(parse_f64("abc"), None);
    }
}
