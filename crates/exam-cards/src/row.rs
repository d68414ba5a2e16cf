//! Rendered card output.

use std::fmt;

use serde::Serialize;

/// One piece of a card line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardCell {
    /// Field label shown before the text, as in `Sphere: +1.50`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "is_false")]
    pub label_highlighted: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub highlighted: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl CardCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.text.trim().is_empty()
    }

    /// Cells that only announce something, like `Sph:`, carry no data.
    pub fn is_label_only(&self) -> bool {
        self.label.is_none() && self.text.trim().ends_with(':')
    }
}

impl fmt::Display for CardCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label}: {}", self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// A line of a card. Columned rows keep one cell per column, empty or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardRow {
    pub cells: Vec<CardCell>,
}

impl CardRow {
    pub fn new(cells: Vec<CardCell>) -> Self {
        Self { cells }
    }

    /// True when some cell holds data rather than nothing or a bare label.
    pub fn has_content(&self) -> bool {
        self.cells
            .iter()
            .any(|cell| !cell.is_empty() && !cell.is_label_only())
    }
}

impl fmt::Display for CardRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .cells
            .iter()
            .filter(|cell| !cell.is_empty())
            .map(ToString::to_string)
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// Rows under an optional subtitle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub rows: Vec<CardRow>,
}

/// Summary card of one exam.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Card {
    pub title: String,
    pub sections: Vec<CardSection>,
}

impl Card {
    pub fn rows(&self) -> impl Iterator<Item = &CardRow> {
        self.sections.iter().flat_map(|section| section.rows.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|section| section.rows.is_empty())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for section in &self.sections {
            let indent = if let Some(title) = &section.title {
                writeln!(f, "  {title}")?;
                "    "
            } else {
                "  "
            };
            for row in &section.rows {
                writeln!(f, "{indent}{row}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_only_rows_have_no_content() {
        let row = CardRow::new(vec![CardCell::text("Sph:"), CardCell::empty()]);
        assert!(!row.has_content());
        let row = CardRow::new(vec![CardCell::text("OD"), CardCell::empty()]);
        assert!(row.has_content());
    }

    #[test]
    fn display_skips_empty_cells() {
        let row = CardRow::new(vec![
            CardCell::text("+1.50").with_label("Sph"),
            CardCell::empty(),
            CardCell::text("-0.25"),
        ]);
        assert_eq!(row.to_string(), "Sph: +1.50 -0.25");
    }
}
