//! Access to cached items.

use std::collections::HashMap;

use exam_model::{Definition, Exam, ExamDefinition, Patient, Visit};

/// Kinds of non-exam items whose fields are addressable by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Visit,
    Patient,
}

/// Read access to the items the resolver walks. Implementations usually sit
/// on top of a local cache filled by the sync layer.
pub trait ItemStore {
    fn exam(&self, id: &str) -> Option<&Exam>;
    fn visit(&self, id: &str) -> Option<&Visit>;
    fn patient(&self, id: &str) -> Option<&Patient>;
    /// Schema of an exam type, used when the visit holds no such exam.
    fn exam_definition(&self, name: &str) -> Option<&ExamDefinition>;
    /// Field definitions of visit or patient records.
    fn item_definitions(&self, kind: ItemKind) -> Option<&[Definition]>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    exams: HashMap<String, Exam>,
    visits: HashMap<String, Visit>,
    patients: HashMap<String, Patient>,
    exam_definitions: HashMap<String, ExamDefinition>,
    item_definitions: HashMap<ItemKind, Vec<Definition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_exam(&mut self, exam: Exam) {
        self.exams.insert(exam.id.clone(), exam);
    }

    pub fn insert_visit(&mut self, visit: Visit) {
        self.visits.insert(visit.id.clone(), visit);
    }

    pub fn insert_patient(&mut self, patient: Patient) {
        self.patients.insert(patient.id.clone(), patient);
    }

    pub fn insert_exam_definition(&mut self, definition: ExamDefinition) {
        self.exam_definitions
            .insert(definition.name.clone(), definition);
    }

    pub fn insert_item_definitions(&mut self, kind: ItemKind, definitions: Vec<Definition>) {
        self.item_definitions.insert(kind, definitions);
    }

    #[must_use]
    pub fn with_exam(mut self, exam: Exam) -> Self {
        self.insert_exam(exam);
        self
    }

    #[must_use]
    pub fn with_visit(mut self, visit: Visit) -> Self {
        self.insert_visit(visit);
        self
    }

    #[must_use]
    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.insert_patient(patient);
        self
    }

    /// Replaces a stored exam, typically after an edit.
    pub fn exam_mut(&mut self, id: &str) -> Option<&mut Exam> {
        self.exams.get_mut(id)
    }
}

impl ItemStore for MemoryStore {
    fn exam(&self, id: &str) -> Option<&Exam> {
        self.exams.get(id)
    }

    fn visit(&self, id: &str) -> Option<&Visit> {
        self.visits.get(id)
    }

    fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.get(id)
    }

    fn exam_definition(&self, name: &str) -> Option<&ExamDefinition> {
        self.exam_definitions.get(name)
    }

    fn item_definitions(&self, kind: ItemKind) -> Option<&[Definition]> {
        self.item_definitions.get(&kind).map(Vec::as_slice)
    }
}
