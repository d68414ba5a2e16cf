//! Loading the JSON documents the CLI works on: engine options, code
//! tables, schemas, records and item definitions.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use exam_codes::{CodeCatalog, load_labels, load_tables};
use exam_model::{Definition, EngineOptions, ExamDefinition};
use exam_resolve::{ItemKind, MemoryStore};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Reads and deserializes one JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

pub fn options_from_json(json: &str) -> Result<EngineOptions> {
    serde_json::from_str(json).context("parse engine options")
}

/// Engine options from a config file, or the defaults.
pub fn load_options(path: Option<&Path>) -> Result<EngineOptions> {
    let Some(path) = path else {
        return Ok(EngineOptions::default());
    };
    let options: EngineOptions = read_json(path)?;
    debug!(path = %path.display(), ?options, "loaded engine options");
    Ok(options)
}

/// The built-in tables, extended by a code document and relabelled by a
/// labels document when given.
pub fn load_catalog(codes: Option<&Path>, labels: Option<&Path>) -> Result<CodeCatalog> {
    let mut catalog = CodeCatalog::with_builtin_tables();
    if let Some(path) = codes {
        let tables = load_tables(path).with_context(|| format!("load codes {}", path.display()))?;
        info!(tables = tables.len(), path = %path.display(), "loaded code tables");
        catalog = catalog.extended(tables);
    }
    if let Some(path) = labels {
        let labels =
            load_labels(path).with_context(|| format!("load labels {}", path.display()))?;
        catalog.set_labels(labels);
    }
    Ok(catalog)
}

pub fn load_definitions(paths: &[PathBuf]) -> Result<Vec<(PathBuf, ExamDefinition)>> {
    paths
        .iter()
        .map(|path| {
            let definition: ExamDefinition = read_json(path)?;
            Ok((path.clone(), definition))
        })
        .collect()
}

/// Field definitions of visit and patient records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDefinitions {
    #[serde(default)]
    pub visit: Vec<Definition>,
    #[serde(default)]
    pub patient: Vec<Definition>,
}

impl ItemDefinitions {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), read_json)
    }

    /// Hands both definition lists to a store.
    pub fn register(&self, store: &mut MemoryStore) {
        store.insert_item_definitions(ItemKind::Visit, self.visit.clone());
        store.insert_item_definitions(ItemKind::Patient, self.patient.clone());
    }
}

/// Every addressable definition path: local paths of each schema, the same
/// paths under `exam.<name>.`, and the `visit.`/`patient.` item paths.
pub fn mapped_targets(definitions: &[ExamDefinition], items: &ItemDefinitions) -> Vec<String> {
    let mut targets = Vec::new();
    for definition in definitions {
        collect_paths("", &definition.fields, &mut targets);
        collect_paths(&format!("exam.{}", definition.name), &definition.fields, &mut targets);
    }
    collect_paths("visit", &items.visit, &mut targets);
    collect_paths("patient", &items.patient, &mut targets);
    targets
}

fn collect_paths(prefix: &str, fields: &[Definition], out: &mut Vec<String>) {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name().to_string()
        } else {
            format!("{prefix}.{}", field.name())
        };
        if let Definition::Group(group) = field {
            collect_paths(&path, &group.fields, out);
        }
        out.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_local_and_exam_paths() {
        let definition: ExamDefinition = serde_json::from_value(json!({
            "name": "Refraction",
            "fields": [{"name": "Wear Rx", "fields": [{"name": "od", "fields": [{"name": "sph"}]}]}]
        }))
        .unwrap();
        let items: ItemDefinitions =
            serde_json::from_value(json!({"patient": [{"name": "pd"}]})).unwrap();
        let targets = mapped_targets(&[definition], &items);
        assert!(targets.contains(&"Wear Rx.od.sph".to_string()));
        assert!(targets.contains(&"exam.Refraction.Wear Rx.od".to_string()));
        assert!(targets.contains(&"patient.pd".to_string()));
        assert!(!targets.iter().any(|target| target.starts_with("visit.")));
    }
}
