//! Ordered multi-document write sequences
//!
//! Property deletion and legacy migration are not atomic. Each write is
//! recorded with its outcome so a partial run can be diagnosed and resumed.

use std::fmt;

use uuid::Uuid;

use crate::error::Result;

/// One write in a cascade or migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DeleteGuests { property_id: Uuid },
    DeleteSettings { property_id: Uuid },
    DeleteProperty { property_id: Uuid },
    CreateProperty { owner_id: Uuid },
    CopySettings { property_id: Uuid },
    CopyGuest { guest_id: Uuid },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::DeleteGuests { property_id } => write!(f, "delete guests of {}", property_id),
            Step::DeleteSettings { property_id } => {
                write!(f, "delete settings of {}", property_id)
            }
            Step::DeleteProperty { property_id } => write!(f, "delete property {}", property_id),
            Step::CreateProperty { owner_id } => write!(f, "create property for {}", owner_id),
            Step::CopySettings { property_id } => {
                write!(f, "copy legacy settings into {}", property_id)
            }
            Step::CopyGuest { guest_id } => write!(f, "copy legacy guest {}", guest_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Completed, with the number of documents written or removed
    Done { affected: usize },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Per-step results of a sequence, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    records: Vec<StepRecord>,
}

impl StepReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one step and capture its outcome. Errors are recorded, then returned.
    pub fn run<F>(&mut self, step: Step, write: F) -> Result<usize>
    where
        F: FnOnce() -> Result<usize>,
    {
        let result = write();
        self.record(step, &result, |affected| *affected);
        result
    }

    /// Run a step that writes a single document and hands it back
    pub fn run_one<T, F>(&mut self, step: Step, write: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let result = write();
        self.record(step, &result, |_| 1);
        result
    }

    fn record<T>(&mut self, step: Step, result: &Result<T>, affected: impl FnOnce(&T) -> usize) {
        let outcome = match result {
            Ok(value) => StepOutcome::Done {
                affected: affected(value),
            },
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        self.records.push(StepRecord { step, outcome });
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Steps in execution order
    pub fn steps(&self) -> Vec<Step> {
        self.records.iter().map(|r| r.step).collect()
    }

    /// Number of steps that finished successfully
    pub fn completed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Done { .. }))
            .count()
    }

    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.records
            .iter()
            .find(|r| matches!(r.outcome, StepOutcome::Failed(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn append(&mut self, other: StepReport) {
        self.records.extend(other.records);
    }
}
