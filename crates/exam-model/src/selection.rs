//! Certainty markers on selected findings.
//!
//! A stored selection may start with one of the literal 4-character markers
//! `(+) `, `(-) ` or `(?) `. The marker is only an encoding; inside the
//! engine a selection is a value plus an optional [`Certainty`].

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Certainty {
    /// `(+)`: finding confirmed present.
    Present,
    /// `(-)`: finding confirmed absent.
    Absent,
    /// `(?)`: finding uncertain.
    Uncertain,
}

impl Certainty {
    pub const ALL: [Certainty; 3] = [Certainty::Present, Certainty::Absent, Certainty::Uncertain];

    /// Printable marker including the trailing space.
    pub const fn marker(self) -> &'static str {
        match self {
            Certainty::Present => "(+) ",
            Certainty::Absent => "(-) ",
            Certainty::Uncertain => "(?) ",
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Certainty::Present => '+',
            Certainty::Absent => '-',
            Certainty::Uncertain => '?',
        }
    }

    /// Detects a leading marker.
    pub fn of(text: &str) -> Option<Certainty> {
        Self::ALL
            .into_iter()
            .find(|certainty| text.starts_with(certainty.marker()))
    }
}

/// A selected value with its optional certainty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub value: String,
    pub certainty: Option<Certainty>,
}

impl Selection {
    pub fn new(value: impl Into<String>, certainty: Option<Certainty>) -> Self {
        Self {
            value: value.into(),
            certainty,
        }
    }

    /// Splits a stored string into marker and value.
    pub fn decode(stored: &str) -> Self {
        match Certainty::of(stored) {
            Some(certainty) => Self::new(&stored[certainty.marker().len()..], Some(certainty)),
            None => Self::new(stored, None),
        }
    }

    /// The stored string form.
    pub fn encode(&self) -> String {
        format!("{}{}", self.marker(), self.value)
    }

    /// Marker text, empty when no certainty is attached.
    pub fn marker(&self) -> &'static str {
        self.certainty.map(Certainty::marker).unwrap_or("")
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.marker(), self.value)
    }
}

/// Marker of a stored string, or `""`.
pub fn selection_marker(stored: &str) -> &'static str {
    Certainty::of(stored).map(Certainty::marker).unwrap_or("")
}

/// Stored string without its marker.
pub fn strip_selection_marker(stored: &str) -> &str {
    match Certainty::of(stored) {
        Some(certainty) => &stored[certainty.marker().len()..],
        None => stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_and_encode_markers() {
        let selection = Selection::decode("(?) Cataract");
        assert_eq!(selection.value, "Cataract");
        assert_eq!(selection.certainty, Some(Certainty::Uncertain));
        assert_eq!(selection.encode(), "(?) Cataract");

        let plain = Selection::decode("Cataract");
        assert_eq!(plain.certainty, None);
        assert_eq!(plain.encode(), "Cataract");
    }

    #[test]
    fn marker_requires_trailing_space() {
        assert_eq!(selection_marker("(+)x"), "");
        assert_eq!(strip_selection_marker("(-) Floaters"), "Floaters");
    }
}
