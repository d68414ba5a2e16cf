//! Fixed sub-schema of glasses (`SRx`) and contact lens (`CRx`)
//! prescriptions.
//!
//! A prescription node in a schema document usually carries no `fields` of
//! its own. It still holds one group per eye plus the lens type and notes,
//! so the structure is filled in when the node is loaded.

use crate::field::{Affix, FieldDefinition, FieldOptions, StepSize, TableRef};
use crate::schema::{Definition, GroupDefinition};

/// Eye groups of a prescription, right eye first.
pub const EYES: [(&str, &str); 2] = [("od", "OD"), ("os", "OS")];

/// Horizontal and vertical prism attributes of one eye.
pub const PRISM_FIELDS: [&str; 4] = ["prism1", "prism1b", "prism2", "prism2b"];

fn labelled(name: &str, label: &str) -> FieldDefinition {
    FieldDefinition {
        label: Some(label.to_string()),
        ..FieldDefinition::new(name)
    }
}

fn power(name: &str, label: &str, min: f64, max: f64, signed: bool) -> FieldDefinition {
    FieldDefinition {
        min_value: Some(min),
        max_value: Some(max),
        step_size: Some(StepSize::Single(0.25)),
        decimals: Some(2),
        prefix: signed.then(|| Affix::Text("+".to_string())),
        ..labelled(name, label)
    }
}

fn prism_amount(name: &str) -> FieldDefinition {
    FieldDefinition {
        min_value: Some(0.0),
        max_value: Some(20.0),
        step_size: Some(StepSize::Single(0.5)),
        ..labelled(name, "Prism")
    }
}

fn prism_direction(name: &str) -> FieldDefinition {
    FieldDefinition {
        options: Some(FieldOptions::Table(TableRef::parse(name))),
        ..labelled(name, "Prism")
    }
}

fn eye(name: &str, label: &str) -> Definition {
    let fields = vec![
        power("sph", "Sph", -20.0, 20.0, true),
        power("cyl", "Cyl", -10.0, 10.0, false),
        FieldDefinition {
            min_value: Some(0.0),
            max_value: Some(180.0),
            step_size: Some(StepSize::Single(1.0)),
            decimals: Some(0),
            prefix: Some(Affix::Text("x".to_string())),
            ..labelled("axis", "Axis")
        },
        power("add", "Add", 0.0, 5.0, true),
        prism_amount("prism1"),
        prism_direction("prism1b"),
        prism_amount("prism2"),
        prism_direction("prism2b"),
        labelled("va", "VA"),
        labelled("addVa", "Add VA"),
    ];
    let mut group = GroupDefinition::new(name, fields.into_iter().map(Definition::from).collect());
    group.field.label = Some(label.to_string());
    Definition::Group(group)
}

/// The prescription group for a `SRx`/`CRx` node: its own attributes over
/// the eye groups, lens type and notes.
pub fn prescription_group(field: FieldDefinition) -> GroupDefinition {
    let mut fields: Vec<Definition> = EYES.iter().map(|(name, label)| eye(name, label)).collect();
    fields.push(labelled("lensType", "Lens type").into());
    fields.push(labelled("notes", "Notes").into());
    GroupDefinition {
        field,
        fields,
        columns: vec![EYES.iter().map(|(name, _)| (*name).to_string()).collect()],
        ..GroupDefinition::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_eyes_share_one_shape() {
        let group = prescription_group(FieldDefinition::new("Wear Rx"));
        let eyes: Vec<&GroupDefinition> = group.fields.iter().filter_map(Definition::as_group).collect();
        assert_eq!(eyes.len(), 2);
        assert_eq!(eyes[0].fields, eyes[1].fields);
        assert_eq!(eyes[1].field.label(), "OS");
        let names: Vec<&str> = eyes[0].fields.iter().map(Definition::name).collect();
        assert_eq!(
            names,
            ["sph", "cyl", "axis", "add", "prism1", "prism1b", "prism2", "prism2b", "va", "addVa"]
        );
        assert!(group.child("lensType").is_some());
    }
}
