use crate::data::{ClassId, ClassUnit};
use serde::Serialize;
use std::fmt;

pub const NO_CANDIDATE_REASON: &str = "no valid slot/room combination (conflicts or capacity)";

/// A session unit that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementFailure {
    pub hour_type: String,
    pub reason: String,
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.hour_type, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOutcome {
    pub class_id: ClassId,
    pub program: String,
    pub course_unit: String,
    pub created: u32,
    pub failures: Vec<PlacementFailure>,
    /// Set when the class could not be attempted at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The final output of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub ok: bool,
    pub created: u32,
    pub classes_processed: usize,
    pub details: Vec<ClassOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GenerationReport {
    pub fn empty(message: &str) -> Self {
        Self {
            ok: true,
            created: 0,
            classes_processed: 0,
            details: Vec::new(),
            message: Some(message.to_string()),
        }
    }

    pub fn failed_units(&self) -> usize {
        self.details.iter().map(|d| d.failures.len()).sum()
    }
}

/// Collects per-class outcomes while a run progresses.
#[derive(Debug, Default)]
pub struct OutcomeAggregator {
    details: Vec<ClassOutcome>,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the tally for a class; later records go to it.
    pub fn begin_class(&mut self, class: &ClassUnit) {
        self.details.push(ClassOutcome {
            class_id: class.id,
            program: class.program_code.clone(),
            course_unit: class.course_unit_code.clone(),
            created: 0,
            failures: Vec::new(),
            error: None,
        });
    }

    pub fn record_placed(&mut self) {
        if let Some(current) = self.details.last_mut() {
            current.created += 1;
        }
    }

    pub fn record_failure(&mut self, hour_type: &str, reason: impl Into<String>) {
        if let Some(current) = self.details.last_mut() {
            current.failures.push(PlacementFailure {
                hour_type: hour_type.to_string(),
                reason: reason.into(),
            });
        }
    }

    pub fn record_class_error(&mut self, error: impl Into<String>) {
        if let Some(current) = self.details.last_mut() {
            current.error = Some(error.into());
        }
    }

    pub fn finish(self) -> GenerationReport {
        GenerationReport {
            ok: true,
            created: self.details.iter().map(|d| d.created).sum(),
            classes_processed: self.details.len(),
            details: self.details,
            message: None,
        }
    }
}
