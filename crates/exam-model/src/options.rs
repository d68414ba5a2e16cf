//! Engine configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How free text that matches no option is treated when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionMatchingMode {
    /// Unmatched text is rejected even for freestyle fields.
    Strict,
    /// Freestyle fields keep unmatched text verbatim.
    #[default]
    Lenient,
}

/// Options shared by the formatter, resolver and card renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Separator between formatted multi-value entries.
    pub list_separator: String,

    /// Longest mapped-field chain followed before giving up.
    pub max_mapped_depth: usize,

    /// Reference date for deciding whether a date shows its year.
    /// Defaults to the local date at formatting time.
    pub today: Option<NaiveDate>,

    pub option_matching: OptionMatchingMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            list_separator: ", ".to_string(),
            max_mapped_depth: 16,
            today: None,
            option_matching: OptionMatchingMode::Lenient,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that never keep unmatched option text.
    pub fn strict() -> Self {
        Self {
            option_matching: OptionMatchingMode::Strict,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    #[must_use]
    pub fn with_list_separator(mut self, separator: impl Into<String>) -> Self {
        self.list_separator = separator.into();
        self
    }

    #[must_use]
    pub fn with_max_mapped_depth(mut self, depth: usize) -> Self {
        self.max_mapped_depth = depth;
        self
    }

    pub fn allows_freestyle(&self) -> bool {
        self.option_matching == OptionMatchingMode::Lenient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let options: EngineOptions = serde_json::from_str(r#"{"listSeparator": " / "}"#).unwrap();
        assert_eq!(options.list_separator, " / ");
        assert_eq!(options.max_mapped_depth, 16);
        assert!(options.allows_freestyle());
        assert!(!EngineOptions::strict().allows_freestyle());
    }
}
