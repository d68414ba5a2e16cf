//! Formatting schema rows and card templates into card lines.

use exam_codes::CodeCatalog;
use exam_format::{FormatContext, format_field_value, format_prism};
use exam_model::{
    ACTION_COLUMN, Definition, EngineOptions, Exam, FieldDefinition, FieldPath, GroupDefinition,
    PRISM_FIELDS, Segment, is_blank,
};
use exam_resolve::{ItemStore, Resolver};
use tracing::{debug, warn};

use crate::layout::{column_field_index, columns_of, expand_multi_value_card_fields};
use crate::row::{Card, CardCell, CardRow, CardSection};

/// Prescription fields shown without their label.
const SPHERO_CYLINDER: [&str; 3] = ["sph", "cyl", "axis"];

/// Where a columned cell puts its field's delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Before,
    After,
    Omitted,
}

/// Renders the summary card of one exam.
pub struct CardRenderer<'a, S: ItemStore + ?Sized> {
    resolver: Resolver<'a, S>,
    format: FormatContext<'a>,
}

impl<'a, S: ItemStore + ?Sized> CardRenderer<'a, S> {
    pub fn new(
        store: &'a S,
        exam: &'a Exam,
        catalog: &'a CodeCatalog,
        options: &'a EngineOptions,
    ) -> Self {
        Self {
            resolver: Resolver::new(store, exam, options),
            format: FormatContext::new(catalog, options),
        }
    }

    pub fn resolver(&self) -> &Resolver<'a, S> {
        &self.resolver
    }

    fn exam(&self) -> &'a Exam {
        self.resolver.exam()
    }

    /// The card: the exam's `cardFields` when it declares any, otherwise its
    /// groups (or just its card group).
    pub fn render_card(&self) -> Card {
        let definition = &self.exam().definition;
        let sections = if self.exam().values().is_none_or(is_blank) {
            Vec::new()
        } else if definition.card_fields.is_empty() {
            self.render_groups()
        } else {
            vec![CardSection {
                title: None,
                rows: self.render_card_rows(),
            }]
        };
        Card {
            title: definition.label().to_string(),
            sections,
        }
    }

    // Card templates

    /// One line per expanded `cardFields` row. Rows holding nothing but
    /// labels are dropped.
    pub fn render_card_rows(&self) -> Vec<CardRow> {
        expand_multi_value_card_fields(self.exam())
            .iter()
            .map(|paths| {
                let single = paths.len() == 1;
                CardRow::new(
                    paths
                        .iter()
                        .map(|path| self.render_card_cell(path, single))
                        .collect(),
                )
            })
            .filter(CardRow::has_content)
            .collect()
    }

    fn render_card_cell(&self, path: &str, single: bool) -> CardCell {
        if !path.contains('.') {
            return CardCell::text(path);
        }
        let Some(definition) = self.resolver.field_definition(path) else {
            warn!(exam = %self.exam().id, %path, "card field has no definition");
            return CardCell::empty();
        };
        let definition = definition.field();
        if !self.resolver.is_visible(definition) {
            return CardCell::empty();
        }
        let text = self.display(self.resolver.field_value(path), definition);
        if text.is_empty() {
            return CardCell::empty();
        }
        let label = definition.label();
        if single && text != label {
            return CardCell::text(text).with_label(label);
        }
        CardCell {
            highlighted: definition.highlighted_value == Some(true),
            ..CardCell::text(text)
        }
    }

    // Schema rows

    /// Sections for the card group, or for every top level field.
    pub fn render_groups(&self) -> Vec<CardSection> {
        let definition = &self.exam().definition;
        if let Some(group) = definition.card_group() {
            return self.render_group(group);
        }
        definition
            .fields
            .iter()
            .flat_map(|field| match field {
                Definition::Group(group) => self.render_group(group),
                Definition::Field(field) => self.render_checklist(field).into_iter().collect(),
            })
            .collect()
    }

    fn render_group(&self, group: &GroupDefinition) -> Vec<CardSection> {
        let merged = group
            .field
            .mapped_field
            .as_ref()
            .and_then(|_| self.resolver.field_definition(group.name()));
        let group = match &merged {
            Some(Definition::Group(merged)) => merged,
            _ => group,
        };
        let definition = &self.exam().definition;
        let prescription = group.field.kind().is_prescription();
        let title = |show: bool| (show || prescription).then(|| group.field.label().to_string());

        if group.is_repeating() {
            let count = self
                .resolver
                .field_value(group.name())
                .and_then(|value| value.as_array().map(Vec::len))
                .unwrap_or(0);
            return (0..count)
                .map(|index| CardSection {
                    title: title(definition.show_subtitles),
                    rows: self.render_group_rows(group, Some(index)),
                })
                .filter(|section| !section.rows.is_empty())
                .collect();
        }

        let lone_field =
            definition.fields.len() == 1 && !definition.fields[0].field().is_multi_value();
        let section = CardSection {
            title: title(definition.show_subtitles && !lone_field),
            rows: self.render_group_rows(group, None),
        };
        if section.rows.is_empty() {
            Vec::new()
        } else {
            vec![section]
        }
    }

    fn render_checklist(&self, field: &FieldDefinition) -> Option<CardSection> {
        let path = FieldPath::local(vec![Segment::new(field.name.clone())]);
        let text = self.display(self.resolver.try_value(&path).ok().flatten(), field);
        if text.is_empty() {
            return None;
        }
        let cell = CardCell {
            label_highlighted: field.highlighted_label == Some(true),
            ..CardCell::text(text).with_label(field.label())
        };
        Some(CardSection {
            title: None,
            rows: vec![CardRow::new(vec![cell])],
        })
    }

    /// Rows of one group instance in schema order: row templates expand to
    /// columned rows, mirrored columns are skipped, nested groups add their
    /// own rows and anything else is a `label: value` row.
    pub fn render_group_rows(&self, group: &GroupDefinition, instance: Option<usize>) -> Vec<CardRow> {
        self.rows_at(group, &group_path(group, instance))
    }

    fn rows_at(&self, group: &GroupDefinition, base: &FieldPath) -> Vec<CardRow> {
        let stored = self.resolver.try_value(base).ok().flatten();
        if stored.as_ref().is_none_or(is_blank) {
            debug!(group = %group.name(), path = %base, "nothing stored for group");
            return Vec::new();
        }
        if group.field.kind().is_prescription() {
            return self.prescription_rows(group, base);
        }

        let mut rows = Vec::new();
        for child in &group.fields {
            match (column_field_index(group, child.name()), child) {
                (Some(0), _) => rows.extend(self.columned_rows_at(group, child.name(), base)),
                (Some(_), _) => {}
                (None, Definition::Group(nested)) => rows.extend(self.nested_rows(nested, base)),
                (None, Definition::Field(field)) => {
                    let value = self.resolver.try_value(&child_path(base, field)).ok().flatten();
                    let text = self.display(value, field);
                    if text.is_empty() {
                        continue;
                    }
                    let label = field.label();
                    let mut cell = CardCell::text(text.clone());
                    if !label.trim().is_empty() && text != label {
                        cell.label = Some(label.to_string());
                        cell.label_highlighted = field.highlighted_label == Some(true);
                    }
                    rows.push(CardRow::new(vec![cell]));
                }
            }
        }
        rows
    }

    fn nested_rows(&self, nested: &GroupDefinition, base: &FieldPath) -> Vec<CardRow> {
        let path = child_path(base, &nested.field);
        if !nested.is_repeating() {
            return self.rows_at(nested, &path);
        }
        let count = self
            .resolver
            .try_value(&path)
            .ok()
            .flatten()
            .and_then(|value| value.as_array().map(Vec::len))
            .unwrap_or(0);
        (0..count)
            .flat_map(|index| {
                let instance = base.join(&FieldPath::local(vec![Segment::indexed(
                    nested.name().to_string(),
                    index,
                )]));
                self.rows_at(nested, &instance)
            })
            .collect()
    }

    /// One row per eye, `OD: -1.25 -0.50 x90 Add: +2.00 Prism: 2ΔIn`,
    /// then the lens type and notes.
    fn prescription_rows(&self, group: &GroupDefinition, base: &FieldPath) -> Vec<CardRow> {
        let mut rows = Vec::new();
        for child in &group.fields {
            match child {
                Definition::Group(eye) => {
                    let row = self.prescription_eye_row(eye, &child_path(base, &eye.field));
                    if row.has_content() {
                        rows.push(row);
                    }
                }
                Definition::Field(field) => {
                    let value = self.resolver.try_value(&child_path(base, field)).ok().flatten();
                    let text = self.display(value, field);
                    if !text.is_empty() {
                        rows.push(CardRow::new(vec![CardCell::text(text).with_label(field.label())]));
                    }
                }
            }
        }
        rows
    }

    fn prescription_eye_row(&self, eye: &GroupDefinition, path: &FieldPath) -> CardRow {
        let Some(stored) = self.resolver.try_value(path).ok().flatten() else {
            return CardRow::default();
        };
        let mut cells = Vec::new();
        for child in &eye.fields {
            let field = child.field();
            let name = field.name.as_str();
            let cell = if name == PRISM_FIELDS[0] {
                let prism = format_prism(&stored, self.format.catalog);
                (!prism.is_empty()).then(|| CardCell::text(prism).with_label(field.label()))
            } else if PRISM_FIELDS.contains(&name) {
                None
            } else {
                let text = self.display(stored.get(name).cloned(), field);
                let bare = SPHERO_CYLINDER.contains(&name);
                (!text.is_empty()).then(|| {
                    let cell = CardCell::text(text);
                    if bare { cell } else { cell.with_label(field.label()) }
                })
            };
            cells.extend(cell);
        }
        if let Some(first) = cells.first_mut() {
            let text = match first.label.take() {
                Some(label) => format!("{label}: {}", first.text),
                None => std::mem::take(&mut first.text),
            };
            *first = CardCell::text(text).with_label(eye.field.label());
        }
        CardRow::new(cells)
    }

    /// One row per field of the row template `template`, one cell per
    /// column. The label goes on the first cell with a value; rows without
    /// any value are left out.
    pub fn render_columned_rows(
        &self,
        group: &GroupDefinition,
        template: &str,
        instance: Option<usize>,
    ) -> Vec<CardRow> {
        self.columned_rows_at(group, template, &group_path(group, instance))
    }

    fn columned_rows_at(&self, group: &GroupDefinition, template: &str, base: &FieldPath) -> Vec<CardRow> {
        let Some(columns) = columns_of(group, template) else {
            return Vec::new();
        };
        let row_count = group
            .child(template)
            .and_then(Definition::as_group)
            .map_or(0, |template| template.fields.len());
        (0..row_count)
            .map(|row| self.render_columned_row(group, columns, row, base))
            .filter(|row| row.cells.iter().any(|cell| !cell.is_empty()))
            .collect()
    }

    fn render_columned_row(
        &self,
        group: &GroupDefinition,
        columns: &[String],
        row: usize,
        base: &FieldPath,
    ) -> CardRow {
        let mut show_label = true;
        let mut delimiter = Delimiter::After;
        let mut previous_empty = true;
        let mut cells = Vec::new();

        for (position, column) in columns.iter().enumerate() {
            if column == ACTION_COLUMN {
                continue;
            }
            if position + 1 == columns.len() {
                delimiter = Delimiter::Omitted;
            }
            if position != 0 && previous_empty {
                delimiter = Delimiter::Before;
            }
            let Some(column_group) = group.child(column).and_then(Definition::as_group) else {
                warn!(group = %group.name(), %column, "column is not a group");
                previous_empty = true;
                cells.push(CardCell::empty());
                continue;
            };
            let Some(field) = column_group.fields.get(row).map(Definition::field) else {
                previous_empty = true;
                cells.push(CardCell::empty());
                continue;
            };

            let path = base.join(&FieldPath::local(vec![
                Segment::new(column.clone()),
                Segment::new(field.name.clone()),
            ]));
            let value = self.resolver.try_value(&path).ok().flatten();
            let text = self.display(value, field);
            if text.is_empty() {
                previous_empty = true;
                cells.push(CardCell::empty());
                continue;
            }

            let mut core = String::new();
            if let Some(mark) = &field.delimiter
                && delimiter == Delimiter::Before
            {
                core.push_str(mark);
                core.push(' ');
            }
            if group.shows_column_label() {
                core.push_str(column_group.field.label());
                core.push_str(": ");
            }
            core.push_str(&text);
            if let Some(mark) = &field.delimiter
                && delimiter == Delimiter::After
            {
                core.push(' ');
                core.push_str(mark);
            }

            let label = field.label();
            let mut cell = CardCell::text(core);
            if show_label && !label.trim().is_empty() && text != label {
                cell.label = Some(label.to_string());
                cell.label_highlighted = field.highlighted_label == Some(true);
            }
            show_label = false;
            previous_empty = false;
            cells.push(cell);
        }
        CardRow::new(cells)
    }

    /// Display text of a value, using the definition's live default when
    /// nothing is stored.
    fn display(&self, value: Option<serde_json::Value>, definition: &FieldDefinition) -> String {
        let value = value.or_else(|| self.resolver.dynamic_default(definition));
        format_field_value(value.as_ref(), definition, &self.format)
    }
}

fn child_path(base: &FieldPath, field: &FieldDefinition) -> FieldPath {
    base.join(&FieldPath::local(vec![Segment::new(field.name.clone())]))
}

fn group_path(group: &GroupDefinition, instance: Option<usize>) -> FieldPath {
    let name = group.name().to_string();
    let segment = match instance {
        Some(index) => Segment::indexed(name, index),
        None => Segment::new(name),
    };
    FieldPath::local(vec![segment])
}
