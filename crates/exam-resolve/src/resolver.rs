//! Resolving field paths to values and effective definitions.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use chrono::{Local, NaiveDate};
use exam_codes::raw_text;
use exam_model::{
    Definition, EngineOptions, Exam, ExamDefinition, FieldDefinition, FieldPath, PathDomain,
    Patient, Segment, Visibility, Visit, dynamic_default_path, is_blank,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{ResolveError, Result};
use crate::store::{ItemKind, ItemStore};
use crate::tree::{FieldUpdate, get_value, set_field_value};

/// Where a path is rooted once its domain is looked up.
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    Exam(&'a Exam),
    /// An exam type the visit holds no exam of: definitions only.
    Schema(&'a ExamDefinition),
    Visit,
    Patient,
}

impl Scope<'_> {
    fn label(&self) -> String {
        match self {
            Scope::Exam(exam) => format!("exam.{}", exam.name()),
            Scope::Schema(definition) => format!("exam.{}", definition.name),
            Scope::Visit => "visit".to_string(),
            Scope::Patient => "patient".to_string(),
        }
    }

    /// Identity of a definition node, used to detect mapped-field cycles.
    fn key(&self, path: &FieldPath) -> String {
        let names: Vec<_> = path.names().collect();
        format!("{}.{}", self.label(), names.join("."))
    }
}

/// Resolves paths on behalf of one exam: local paths read its value tree,
/// `exam.<name>` paths read the other exams of its visit.
pub struct Resolver<'a, S: ItemStore + ?Sized> {
    store: &'a S,
    exam: &'a Exam,
    options: &'a EngineOptions,
}

impl<'a, S: ItemStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S, exam: &'a Exam, options: &'a EngineOptions) -> Self {
        Self {
            store,
            exam,
            options,
        }
    }

    pub fn exam(&self) -> &'a Exam {
        self.exam
    }

    pub fn options(&self) -> &'a EngineOptions {
        self.options
    }

    pub fn visit(&self) -> Option<&'a Visit> {
        self.store.visit(self.exam.visit_id.as_deref()?)
    }

    pub fn patient(&self) -> Option<&'a Patient> {
        self.store.patient(self.visit()?.patient_id.as_deref()?)
    }

    /// The visit's exam named `name`: regular exams first, then pre-exams.
    /// The resolver's own exam stands in for its stored copy.
    pub fn find_exam(&self, name: &str) -> Result<Option<&'a Exam>> {
        if let Some(visit) = self.visit() {
            for ids in [&visit.custom_exam_ids, &visit.pre_custom_exam_ids] {
                let mut matches = ids
                    .iter()
                    .filter_map(|id| self.store.exam(id))
                    .filter(|exam| exam.name() == name);
                let Some(found) = matches.next() else {
                    continue;
                };
                if matches.next().is_some() {
                    return Err(ResolveError::Ambiguous {
                        path: format!("exam.{name}"),
                        name: name.to_string(),
                    });
                }
                if found.id == self.exam.id {
                    return Ok(Some(self.exam));
                }
                return Ok(Some(found));
            }
        }
        Ok((self.exam.name() == name).then_some(self.exam))
    }

    fn scope(&self, path: &FieldPath, base: Scope<'a>) -> Result<Scope<'a>> {
        match &path.domain {
            PathDomain::Local => Ok(base),
            PathDomain::Visit => Ok(Scope::Visit),
            PathDomain::Patient => Ok(Scope::Patient),
            PathDomain::Exam(name) => {
                if let Some(exam) = self.find_exam(name)? {
                    return Ok(Scope::Exam(exam));
                }
                self.store
                    .exam_definition(name)
                    .map(Scope::Schema)
                    .ok_or_else(|| ResolveError::NotFound {
                        path: path.to_string(),
                    })
            }
        }
    }

    /// Parses a path given by a caller. A local path may spell out the
    /// exam's own name first (`RxToOrder.Final Rx[0].od.sph`) unless the
    /// schema has a top level field of that name.
    fn parse_path(&self, path: &str) -> Result<FieldPath> {
        let parsed = FieldPath::parse(path)?;
        let name = self.exam.name();
        match parsed.segments.split_first() {
            Some((head, rest))
                if parsed.is_local()
                    && !rest.is_empty()
                    && head.index.is_none()
                    && head.name == name
                    && self.exam.definition.child(name).is_none() =>
            {
                Ok(FieldPath::local(rest.to_vec()))
            }
            _ => Ok(parsed),
        }
    }

    // Values

    /// Value at `path`, `None` when absent or unresolvable.
    pub fn field_value(&self, path: &str) -> Option<Value> {
        self.try_field_value(path).unwrap_or_else(|error| {
            debug!(%path, %error, "field value unresolved");
            None
        })
    }

    pub fn try_field_value(&self, path: &str) -> Result<Option<Value>> {
        self.try_value(&self.parse_path(path)?)
    }

    /// Value at a parsed path. A missing value falls back to the value of
    /// the field the definition is mapped to.
    pub fn try_value(&self, path: &FieldPath) -> Result<Option<Value>> {
        let mut chain = Vec::new();
        self.value_in(path, Scope::Exam(self.exam), &mut chain)
    }

    fn value_in(
        &self,
        path: &FieldPath,
        base: Scope<'a>,
        chain: &mut Vec<String>,
    ) -> Result<Option<Value>> {
        let scope = self.scope(path, base)?;
        if let Some(value) = self.stored_value(path, scope)? {
            return Ok(Some(value));
        }

        let definition = match self.definition_in(path, scope) {
            Ok(definition) => definition,
            Err(ResolveError::NotFound { .. }) => return Ok(None),
            Err(error) => return Err(error),
        };
        let Some(mapped) = &definition.field().mapped_field else {
            return Ok(None);
        };
        self.enter(path, scope, chain)?;
        let target = FieldPath::parse(mapped)?;
        trace!(path = %path, mapped = %target, "following mapped value");
        self.value_in(&target, scope, chain)
    }

    fn stored_value(&self, path: &FieldPath, scope: Scope<'a>) -> Result<Option<Value>> {
        let root: Cow<'_, Value> = match scope {
            Scope::Exam(exam) => match exam.values() {
                Some(values) => Cow::Borrowed(values),
                None => return Ok(None),
            },
            Scope::Schema(_) => return Ok(None),
            Scope::Visit => match self.visit() {
                Some(visit) => Cow::Owned(visit.to_value()),
                None => {
                    return Err(ResolveError::NotFound {
                        path: path.to_string(),
                    });
                }
            },
            Scope::Patient => match self.patient() {
                Some(patient) => Cow::Owned(patient.to_value()),
                None => {
                    return Err(ResolveError::NotFound {
                        path: path.to_string(),
                    });
                }
            },
        };
        let segments = match scope {
            Scope::Visit => visit_segments(&path.segments),
            _ => Cow::Borrowed(path.segments.as_slice()),
        };
        Ok(get_value(&root, &segments)
            .filter(|value| !value.is_null())
            .cloned())
    }

    // Definitions

    /// Effective definition at `path`, `None` when unresolvable.
    pub fn field_definition(&self, path: &str) -> Option<Definition> {
        match self.try_field_definition(path) {
            Ok(definition) => Some(definition),
            Err(error @ ResolveError::MappedFieldCycle { .. }) => {
                warn!(%path, %error, "mapped field chain abandoned");
                None
            }
            Err(error) => {
                debug!(%path, %error, "field definition unresolved");
                None
            }
        }
    }

    pub fn try_field_definition(&self, path: &str) -> Result<Definition> {
        self.try_definition(&self.parse_path(path)?)
    }

    /// Definition at a parsed path with its mapped-field chain merged in.
    /// The nearest definition wins each attribute and the first
    /// `mappedField` is kept.
    pub fn try_definition(&self, path: &FieldPath) -> Result<Definition> {
        let scope = self.scope(path, Scope::Exam(self.exam))?;
        let own = self.definition_in(path, scope)?;
        let Some(first_mapped) = own.field().mapped_field.clone() else {
            return Ok(own.clone());
        };

        let mut merged = own.clone();
        let mut visited = HashSet::from([scope.key(path)]);
        let mut chain = vec![scope.key(path)];
        let mut pending = vec![(first_mapped.clone(), scope)];
        while let Some((mapped, base)) = pending.pop() {
            let target = FieldPath::parse(&mapped)?;
            let target_scope = self.scope(&target, base)?;
            let key = target_scope.key(&target);
            chain.push(key.clone());
            if !visited.insert(key) || chain.len() > self.options.max_mapped_depth + 1 {
                return Err(ResolveError::MappedFieldCycle {
                    path: path.to_string(),
                    chain,
                });
            }
            let next = self.definition_in(&target, target_scope)?;
            merged = merged.merged_over(next);
            if let Some(further) = &next.field().mapped_field {
                pending.push((further.clone(), target_scope));
            }
        }
        merged.field_mut().mapped_field = Some(first_mapped);
        Ok(merged)
    }

    /// Walks the schema of `scope` by segment name, indices ignored.
    fn definition_in(&self, path: &FieldPath, scope: Scope<'a>) -> Result<&'a Definition> {
        let not_found = || ResolveError::NotFound {
            path: path.to_string(),
        };
        let mut level: &'a [Definition] = match scope {
            Scope::Exam(exam) => &exam.definition.fields,
            Scope::Schema(definition) => &definition.fields,
            Scope::Visit => self
                .store
                .item_definitions(ItemKind::Visit)
                .ok_or_else(not_found)?,
            Scope::Patient => self
                .store
                .item_definitions(ItemKind::Patient)
                .ok_or_else(not_found)?,
        };
        let mut found = None;
        for name in path.names() {
            let mut matches = level.iter().filter(|definition| definition.name() == name);
            let definition = matches.next().ok_or_else(not_found)?;
            if matches.next().is_some() {
                return Err(ResolveError::Ambiguous {
                    path: path.to_string(),
                    name: name.to_string(),
                });
            }
            level = match definition {
                Definition::Group(group) => &group.fields,
                Definition::Field(_) => &[],
            };
            found = Some(definition);
        }
        found.ok_or_else(not_found)
    }

    fn enter(&self, path: &FieldPath, scope: Scope<'a>, chain: &mut Vec<String>) -> Result<()> {
        let key = scope.key(path);
        let repeated = chain.contains(&key);
        chain.push(key);
        if repeated || chain.len() > self.options.max_mapped_depth {
            return Err(ResolveError::MappedFieldCycle {
                path: path.to_string(),
                chain: chain.clone(),
            });
        }
        Ok(())
    }

    // Expressions

    /// Catalog filter of `definition` with every `[relativePath]` value
    /// replaced by the live value below `base`. Unresolved values become
    /// blank, which the catalog treats as no constraint.
    pub fn resolve_filter(
        &self,
        definition: &FieldDefinition,
        base: &FieldPath,
    ) -> BTreeMap<String, String> {
        let Some(filter) = &definition.filter else {
            return BTreeMap::new();
        };
        filter
            .iter()
            .map(|(key, value)| {
                let resolved = match bracketed(value) {
                    None => value.clone(),
                    Some(relative) => match FieldPath::parse(relative) {
                        Ok(relative) => self
                            .try_value(&base.join(&relative))
                            .ok()
                            .flatten()
                            .map(|value| raw_text(&value))
                            .unwrap_or_default(),
                        Err(error) => {
                            warn!(field = %definition.name, %value, %error, "bad filter path");
                            String::new()
                        }
                    },
                };
                (key.clone(), resolved)
            })
            .collect()
    }

    /// Evaluates the `visible` rule. `[path]` requires a non-blank value,
    /// `[!path]` a blank one and `[path==value]` a value whose text equals
    /// `value`. Anything else is visible.
    pub fn is_visible(&self, definition: &FieldDefinition) -> bool {
        let expression = match &definition.visible {
            None => return true,
            Some(Visibility::Flag(flag)) => return *flag,
            Some(Visibility::Expression(expression)) => expression,
        };
        let Some(inner) = bracketed(expression) else {
            return true;
        };
        if let Some(path) = inner.strip_prefix('!') {
            return self.field_value(path.trim()).is_none_or(|value| is_blank(&value));
        }
        if let Some((path, expected)) = inner.split_once("==") {
            let actual = self.field_value(path.trim());
            return actual.is_some_and(|value| raw_text(&value) == expected.trim());
        }
        self.field_value(inner.trim())
            .is_some_and(|value| !is_blank(&value))
    }

    /// Default of `definition`. `[currentDate]` yields today's ISO date,
    /// other `[path]` defaults read live data; static defaults pass through.
    pub fn dynamic_default(&self, definition: &FieldDefinition) -> Option<Value> {
        let default = definition.default_value.as_ref()?;
        let Some(path) = dynamic_default_path(default) else {
            return Some(default.clone());
        };
        match path {
            "currentDate" => Some(Value::String(self.today().format("%Y-%m-%d").to_string())),
            user if user.starts_with("user.") => {
                debug!(field = %definition.name, %user, "user defaults are not available");
                None
            }
            path => self.field_value(path),
        }
    }

    fn today(&self) -> NaiveDate {
        self.options
            .today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    // Updates

    /// Stores `value` at a local `path` of the resolver's exam and returns
    /// the new value tree. Ended exams refuse edits.
    pub fn set_field_value(&self, path: &str, value: Value) -> Result<FieldUpdate> {
        let path = self.parse_path(path)?;
        if !path.is_local() {
            return Err(ResolveError::ReadOnly {
                path: path.to_string(),
            });
        }
        if self.exam.is_locked() {
            return Err(ResolveError::Locked {
                exam_id: self.exam.id.clone(),
            });
        }
        let empty = Value::Object(Default::default());
        let tree = self.exam.values().unwrap_or(&empty);
        let update = set_field_value(tree, &path, value)?;
        debug!(exam = %self.exam.id, path = %update.change.path, "field updated");
        Ok(update)
    }
}

/// `examDate` on a visit is stored as `date`.
fn visit_segments(segments: &[Segment]) -> Cow<'_, [Segment]> {
    match segments.split_first() {
        Some((head, rest)) if head.name == "examDate" => {
            let mut renamed = Vec::with_capacity(segments.len());
            renamed.push(Segment {
                name: "date".to_string(),
                index: head.index,
            });
            renamed.extend_from_slice(rest);
            Cow::Owned(renamed)
        }
        _ => Cow::Borrowed(segments),
    }
}

fn bracketed(text: &str) -> Option<&str> {
    text.trim().strip_prefix('[')?.strip_suffix(']')
}
