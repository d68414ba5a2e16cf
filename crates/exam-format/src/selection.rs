//! Tri-state selection of findings.
//!
//! Tapping a finding repeatedly walks it through absent, uncertain and
//! present before clearing it again. Fields without tri-state selection
//! simply toggle membership.

use exam_model::{Certainty, FieldDefinition, Selection, strip_selection_marker};

/// Next state of `item` after a tap. `None` means not selected.
pub fn cycle_selection(current: Option<&Selection>, item: &str) -> Option<Selection> {
    let next = match current.and_then(|selection| selection.certainty) {
        None => Certainty::Absent,
        Some(Certainty::Absent) => Certainty::Uncertain,
        Some(Certainty::Uncertain) => Certainty::Present,
        Some(Certainty::Present) => return None,
    };
    Some(Selection::new(item, Some(next)))
}

/// Applies a tap on `item` to the stored multi-value list of `definition`.
/// The entry keeps its position while it stays selected; new entries are
/// appended.
pub fn toggle_selection(
    stored: &[String],
    item: &str,
    definition: &FieldDefinition,
) -> Vec<String> {
    let position = stored
        .iter()
        .position(|entry| strip_selection_marker(entry) == item);
    let mut next = stored.to_vec();
    if !definition.is_tri_state() {
        match position {
            Some(index) => {
                next.remove(index);
            }
            None => next.push(item.to_string()),
        }
        return next;
    }
    let current = position.map(|index| Selection::decode(&stored[index]));
    match (position, cycle_selection(current.as_ref(), item)) {
        (Some(index), Some(selection)) => next[index] = selection.encode(),
        (Some(index), None) => {
            next.remove(index);
        }
        (None, Some(selection)) => next.push(selection.encode()),
        (None, None) => {}
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn findings(tri_state: bool) -> FieldDefinition {
        let prefix = if tri_state { json!([]) } else { json!("") };
        serde_json::from_value(json!({"name": "findings", "multiValue": true, "prefix": prefix}))
            .unwrap()
    }

    #[test]
    fn cycle_walks_through_every_certainty() {
        let findings = findings(true);
        let mut stored: Vec<String> = Vec::new();
        let mut seen = Vec::new();
        for _ in 0..4 {
            stored = toggle_selection(&stored, "Floaters", &findings);
            seen.push(stored.first().cloned().unwrap_or_default());
        }
        assert_eq!(seen, ["(-) Floaters", "(?) Floaters", "(+) Floaters", ""]);
    }

    #[test]
    fn legacy_plain_entry_advances_to_absent() {
        let stored = vec!["Cataract".to_string(), "Floaters".to_string()];
        assert_eq!(
            toggle_selection(&stored, "Floaters", &findings(true)),
            ["Cataract", "(-) Floaters"]
        );
    }

    #[test]
    fn plain_toggle_adds_and_removes() {
        let findings = findings(false);
        let stored = toggle_selection(&[], "Dry eye", &findings);
        assert_eq!(stored, ["Dry eye"]);
        assert!(toggle_selection(&stored, "Dry eye", &findings).is_empty());
    }
}
