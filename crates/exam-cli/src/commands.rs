use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use exam_cards::{Card, CardRenderer};
use exam_cli::documents::{
    ItemDefinitions, load_catalog, load_definitions, load_options, mapped_targets, read_json,
};
use exam_cli::logging::redact_value;
use exam_codes::{CodeCatalog, FormattedCodes};
use exam_format::{
    FormatContext, format_field_value, parse_date, parse_numeric, parse_option_text, parse_time,
};
use exam_model::{
    Definition, EngineOptions, Exam, ExamDefinition, FieldDefinition, FieldType,
    OptionMatchingMode, Patient, SchemaValidator, Visit, strip_indices,
};
use exam_resolve::MemoryStore;
use serde_json::Value;
use tracing::{debug, info, info_span};

use crate::cli::{CardArgs, Cli, CodesArgs, FormatArgs, ParseArgs, ValidateArgs};
use crate::types::{ParseOutcome, SchemaReport, ValidationReport};

/// Options and code catalog shared by every command.
pub struct Engine {
    pub options: EngineOptions,
    pub catalog: CodeCatalog,
}

impl Engine {
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut options = load_options(cli.config.as_deref())?;
        if cli.strict {
            options.option_matching = OptionMatchingMode::Strict;
        }
        let catalog = load_catalog(cli.codes.as_deref(), cli.labels.as_deref())?;
        debug!(tables = catalog.len(), "code catalog ready");
        Ok(Self { options, catalog })
    }

    fn format_context(&self) -> FormatContext<'_> {
        FormatContext::new(&self.catalog, &self.options)
    }
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidationReport> {
    let definitions = load_definitions(&args.schemas)?;
    let mut validator = SchemaValidator::new();
    if args.check_mapped {
        let items = ItemDefinitions::load(args.items.as_deref())?;
        let schemas: Vec<ExamDefinition> = definitions
            .iter()
            .map(|(_, definition)| definition.clone())
            .collect();
        validator = validator.with_mapped_targets(mapped_targets(&schemas, &items));
    }

    let schemas: Vec<SchemaReport> = definitions
        .into_iter()
        .map(|(path, definition)| {
            let issues = validator.validate(&definition);
            info!(schema = %definition.name, issues = issues.len(), "validated");
            SchemaReport {
                path,
                fields: count_fields(&definition.fields),
                name: definition.name,
                issues,
            }
        })
        .collect();
    let has_issues = schemas.iter().any(|schema| !schema.issues.is_empty());
    Ok(ValidationReport {
        schemas,
        has_issues,
    })
}

pub fn run_card(engine: &Engine, args: &CardArgs) -> Result<Card> {
    let exam: Exam = read_json(&args.exam)?;
    let span = info_span!("card", exam = %exam.id);
    let _guard = span.enter();

    let mut store = MemoryStore::new();
    for path in &args.others {
        let other: Exam = read_json(path)?;
        debug!(exam = %other.id, name = %other.name(), "loaded visit exam");
        store.insert_exam(other);
    }
    for (_, definition) in load_definitions(&args.schemas)? {
        store.insert_exam_definition(definition);
    }
    if let Some(path) = &args.visit {
        let visit: Visit = read_json(path)?;
        store.insert_visit(visit);
    }
    if let Some(path) = &args.patient {
        let patient: Patient = read_json(path)?;
        info!(patient = %redact_value(&patient.id), "loaded patient");
        store.insert_patient(patient);
    }
    ItemDefinitions::load(args.items.as_deref())?.register(&mut store);
    store.insert_exam(exam.clone());

    let card = CardRenderer::new(&store, &exam, &engine.catalog, &engine.options).render_card();
    info!(rows = card.rows().count(), "rendered card");
    Ok(card)
}

pub fn run_format(engine: &Engine, args: &FormatArgs) -> Result<String> {
    let definition: ExamDefinition = read_json(&args.schema)?;
    let field = find_field(&definition, &args.field)?;
    let value: Value =
        serde_json::from_str(&args.value).unwrap_or_else(|_| Value::String(args.value.clone()));
    Ok(format_field_value(Some(&value), field, &engine.format_context()))
}

pub fn run_parse(engine: &Engine, args: &ParseArgs) -> Result<ParseOutcome> {
    let definition: ExamDefinition = read_json(&args.schema)?;
    let field = find_field(&definition, &args.field)?;
    Ok(parse_entry(engine, field, &args.text))
}

/// Stored value for text entered into `field`.
fn parse_entry(engine: &Engine, field: &FieldDefinition, text: &str) -> ParseOutcome {
    let kind = field.kind();
    if kind == FieldType::Numeric {
        let input = parse_numeric(&Value::String(text.to_string()), field);
        return ParseOutcome {
            error: input.error.as_ref().map(ToString::to_string),
            value: Some(input.value),
        };
    }
    if field.options.is_some() {
        let value = parse_option_text(field, text, &engine.format_context());
        return ParseOutcome {
            error: value.is_none().then(|| format!("`{text}` matches no option")),
            value,
        };
    }
    let parsed = if kind.is_date_family() {
        parse_date(text).map(|date| date.to_string())
    } else if kind.is_time_family() {
        parse_time(text).map(|time| time.format("%H:%M").to_string())
    } else {
        return ParseOutcome {
            value: (!text.trim().is_empty()).then(|| Value::String(text.to_string())),
            error: None,
        };
    };
    match parsed {
        Some(text) => ParseOutcome {
            value: Some(Value::String(text)),
            error: None,
        },
        None => ParseOutcome {
            value: None,
            error: Some(format!("`{text}` is not a valid {}", kind.as_str())),
        },
    }
}

pub fn run_codes(engine: &Engine, args: &CodesArgs) -> Result<FormattedCodes> {
    if engine.catalog.table(&args.table).is_none() {
        bail!("unknown code table `{}`", args.table);
    }
    let filter = parse_filters(&args.filters)?;
    Ok(engine.catalog.format_all(&args.table, filter.as_ref()))
}

fn parse_filters(filters: &[String]) -> Result<Option<BTreeMap<String, String>>> {
    if filters.is_empty() {
        return Ok(None);
    }
    filters
        .iter()
        .map(|filter| {
            filter
                .split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| anyhow!("filter `{filter}` is not key=value"))
        })
        .collect::<Result<BTreeMap<_, _>>>()
        .map(Some)
}

/// Leaf definition at a schema-relative path. Instance indices are ignored.
fn find_field<'a>(definition: &'a ExamDefinition, path: &str) -> Result<&'a FieldDefinition> {
    let bare = strip_indices(path);
    definition
        .find(bare.split('.'))
        .map(Definition::field)
        .with_context(|| format!("`{path}` is not a field of {}", definition.name))
}

fn count_fields(fields: &[Definition]) -> usize {
    fields
        .iter()
        .map(|field| match field {
            Definition::Group(group) => 1 + count_fields(&group.fields),
            Definition::Field(_) => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> Engine {
        Engine {
            options: EngineOptions::default(),
            catalog: CodeCatalog::new(),
        }
    }

    #[test]
    fn filters_need_key_and_value() {
        let filters = parse_filters(&["os = true".to_string()]).unwrap();
        assert_eq!(
            filters.unwrap().get("os").map(String::as_str),
            Some("true")
        );
        assert!(parse_filters(&["os".to_string()]).is_err());
        assert!(parse_filters(&[]).unwrap().is_none());
    }

    #[test]
    fn finds_leaf_through_indices() {
        let definition: ExamDefinition = serde_json::from_value(json!({
            "name": "RxToOrder",
            "fields": [{"name": "Final Rx", "multiValue": true, "fields": [
                {"name": "od", "fields": [{"name": "sph"}]}
            ]}]
        }))
        .unwrap();
        assert_eq!(
            find_field(&definition, "Final Rx[1].od.sph").unwrap().name,
            "sph"
        );
        assert!(find_field(&definition, "Final Rx.os.sph").is_err());
        assert_eq!(count_fields(&definition.fields), 3);
    }

    #[test]
    fn parses_entries_by_field_kind() {
        let engine = engine();
        let numeric: FieldDefinition =
            serde_json::from_value(json!({"name": "sph", "minValue": -20, "maxValue": 20}))
                .unwrap();
        let outcome = parse_entry(&engine, &numeric, "1.25");
        assert_eq!(outcome.value, Some(json!(1.25)));
        assert!(outcome.error.is_none());
        assert!(parse_entry(&engine, &numeric, "abc").error.is_some());

        let date: FieldDefinition =
            serde_json::from_value(json!({"name": "seen", "type": "pastDate"})).unwrap();
        assert_eq!(
            parse_entry(&engine, &date, "2024/06/01").value,
            Some(json!("2024-06-01"))
        );
        assert!(parse_entry(&engine, &date, "soon").value.is_none());

        let time: FieldDefinition =
            serde_json::from_value(json!({"name": "at", "type": "time"})).unwrap();
        assert_eq!(parse_entry(&engine, &time, "09:05").value, Some(json!("09:05")));

        let text = FieldDefinition::new("notes");
        assert!(parse_entry(&engine, &text, "  ").value.is_none());
    }
}
