//! The recursive schema tree: exams hold groups, groups hold fields or
//! further groups.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::field::FieldDefinition;
use crate::prescription::prescription_group;

/// Column entry marking an action column that renders no cell.
pub const ACTION_COLUMN: &str = ">>";

/// A schema node. A node carrying `fields` is a group, anything else a leaf.
/// Prescription nodes (`SRx`, `CRx`) are groups even without `fields`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Definition {
    Group(GroupDefinition),
    Field(FieldDefinition),
}

impl<'de> Deserialize<'de> for Definition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Node {
            Group(GroupDefinition),
            Field(FieldDefinition),
        }

        Ok(match Node::deserialize(deserializer)? {
            Node::Group(group) => Definition::Group(group),
            Node::Field(field) if field.kind().is_prescription() => {
                Definition::Group(prescription_group(field))
            }
            Node::Field(field) => Definition::Field(field),
        })
    }
}

impl Definition {
    pub fn name(&self) -> &str {
        &self.field().name
    }

    /// Leaf attributes of the node; for groups the attributes it shares with
    /// fields.
    pub fn field(&self) -> &FieldDefinition {
        match self {
            Definition::Group(group) => &group.field,
            Definition::Field(field) => field,
        }
    }

    pub fn field_mut(&mut self) -> &mut FieldDefinition {
        match self {
            Definition::Group(group) => &mut group.field,
            Definition::Field(field) => field,
        }
    }

    pub fn as_group(&self) -> Option<&GroupDefinition> {
        match self {
            Definition::Group(group) => Some(group),
            Definition::Field(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Definition::Group(_))
    }

    /// This node's attributes laid over `target`. A leaf mapped onto a group
    /// takes the group's structure.
    #[must_use]
    pub fn merged_over(&self, target: &Definition) -> Definition {
        let field = self.field().merged_over(target.field());
        match (self, target) {
            (Definition::Group(own), _) => Definition::Group(GroupDefinition {
                field,
                ..own.clone()
            }),
            (Definition::Field(_), Definition::Group(group)) => {
                Definition::Group(GroupDefinition {
                    field,
                    ..group.clone()
                })
            }
            (Definition::Field(_), Definition::Field(_)) => Definition::Field(field),
        }
    }
}

impl From<FieldDefinition> for Definition {
    fn from(field: FieldDefinition) -> Self {
        Definition::Field(field)
    }
}

impl From<GroupDefinition> for Definition {
    fn from(group: GroupDefinition) -> Self {
        Definition::Group(group)
    }
}

/// An inner node of the schema tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    #[serde(flatten)]
    pub field: FieldDefinition,
    pub fields: Vec<Definition>,
    /// Column groups. The first name of each entry is the row template;
    /// the rest name sibling groups of the same shape or [`ACTION_COLUMN`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Vec<String>>,
    /// Layout rows; each lists sibling field names sharing a line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_fields: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_column_label: Option<bool>,
}

impl GroupDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<Definition>) -> Self {
        Self {
            field: FieldDefinition::new(name),
            fields,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn child(&self, name: &str) -> Option<&Definition> {
        self.fields.iter().find(|child| child.name() == name)
    }

    pub fn is_multi_value(&self) -> bool {
        self.field.is_multi_value()
    }

    /// Multi-value groups without options hold a list of instances.
    pub fn is_repeating(&self) -> bool {
        self.field.is_multi_value() && self.field.options.is_none()
    }

    pub fn shows_column_label(&self) -> bool {
        self.show_column_label == Some(true)
    }
}

/// Root of a schema tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<Definition>,
    /// Summary rows; each entry is a list of field paths or literal tokens.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_fields: Vec<Vec<String>>,
    /// Group rendered alone on the summary card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_group: Option<String>,
    #[serde(default)]
    pub show_subtitles: bool,
    #[serde(default)]
    pub is_pre_exam: bool,
}

impl ExamDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<Definition>) -> Self {
        Self {
            name: name.into(),
            fields,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn child(&self, name: &str) -> Option<&Definition> {
        self.fields.iter().find(|child| child.name() == name)
    }

    /// Top level groups, in schema order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupDefinition> {
        self.fields.iter().filter_map(Definition::as_group)
    }

    pub fn card_group(&self) -> Option<&GroupDefinition> {
        let name = self.card_group.as_deref()?;
        self.groups().find(|group| group.name() == name)
    }

    /// Walks a chain of child names from the root. Every name but the last
    /// must resolve to a group.
    pub fn find<'a, I>(&self, names: I) -> Option<&Definition>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names = names.into_iter();
        let mut node = self.child(names.next()?)?;
        for name in names {
            node = node.as_group()?.child(name)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nodes_with_fields_are_groups() {
        let exam: ExamDefinition = serde_json::from_value(json!({
            "name": "Refraction",
            "fields": [
                {"name": "od", "label": "OD", "fields": [{"name": "sph", "minValue": -20}]},
                {"name": "notes"}
            ]
        }))
        .unwrap();
        assert!(exam.fields[0].is_group());
        assert!(!exam.fields[1].is_group());
        let sph = exam.find(["od", "sph"]).unwrap();
        assert_eq!(sph.field().min_value, Some(-20.0));
        assert!(exam.find(["notes", "x"]).is_none());
    }

    #[test]
    fn prescription_nodes_get_eye_groups() {
        let exam: ExamDefinition = serde_json::from_value(json!({
            "name": "Refraction",
            "fields": [
                {"name": "Wear Rx", "type": "SRx"},
                {"name": "Contacts", "type": "CRx", "label": "Contact lenses"}
            ]
        }))
        .unwrap();
        assert!(exam.fields[0].is_group());
        let sph = exam.find(["Wear Rx", "od", "sph"]).unwrap().field();
        assert!(sph.forces_sign());
        assert_eq!(sph.decimals, Some(2));
        assert!(exam.find(["Wear Rx", "os", "prism2b"]).is_some());
        let contacts = exam.find(["Contacts"]).unwrap();
        assert_eq!(contacts.field().label(), "Contact lenses");
        assert!(contacts.field().kind().is_prescription());

        let reloaded: ExamDefinition =
            serde_json::from_value(serde_json::to_value(&exam).unwrap()).unwrap();
        assert_eq!(reloaded, exam);
    }

    #[test]
    fn leaf_mapped_onto_group_takes_structure() {
        let group = Definition::Group(GroupDefinition::new(
            "od",
            vec![FieldDefinition::new("sph").into()],
        ));
        let mut leaf = FieldDefinition::new("rightEye");
        leaf.label = Some("Right".into());
        let merged = Definition::Field(leaf).merged_over(&group);
        let merged = merged.as_group().unwrap();
        assert_eq!(merged.name(), "rightEye");
        assert_eq!(merged.field.label(), "Right");
        assert_eq!(merged.fields.len(), 1);
    }
}
