use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};
use exam_cards::Card;
use exam_codes::FormattedCodes;

use crate::types::{ParseOutcome, ValidationReport};

pub fn print_validation(report: &ValidationReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Schema"),
        header_cell("File"),
        header_cell("Fields"),
        header_cell("Issues"),
    ]);
    apply_validation_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    let mut total_issues = 0usize;
    for schema in &report.schemas {
        total_issues += schema.issues.len();
        table.add_row(vec![
            Cell::new(&schema.name).add_attribute(Attribute::Bold),
            dim_cell(schema.path.display()),
            Cell::new(schema.fields),
            count_cell(schema.issues.len(), Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(total_issues, Color::Yellow),
    ]);
    println!("{table}");

    if report.has_issues {
        print_issue_table(report);
    }
}

fn print_issue_table(report: &ValidationReport) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Schema"), header_cell("Issue")]);
    apply_table_style(&mut table);
    for schema in &report.schemas {
        for issue in &schema.issues {
            table.add_row(vec![
                Cell::new(&schema.name),
                Cell::new(issue).fg(Color::Yellow),
            ]);
        }
    }
    println!();
    println!("{table}");
}

pub fn print_card(card: &Card) {
    print!("{card}");
}

pub fn print_codes(reference: &str, codes: &FormattedCodes) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Group"), header_cell(reference)]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    match codes {
        FormattedCodes::Flat(items) => {
            for item in items {
                table.add_row(vec![dim_cell("-"), Cell::new(item)]);
            }
        }
        FormattedCodes::Grouped(groups) => {
            for (index, items) in groups.iter().enumerate() {
                for item in items {
                    table.add_row(vec![dim_cell(index + 1), Cell::new(item)]);
                }
            }
        }
    }
    println!("{table}");
}

pub fn print_parse(outcome: &ParseOutcome) {
    match &outcome.value {
        Some(value) => println!("{value}"),
        None => println!("null"),
    }
    if let Some(error) = &outcome.error {
        eprintln!("warning: {error}");
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_validation_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Percentage(30)),
        ColumnConstraint::UpperBoundary(Width::Percentage(50)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}
