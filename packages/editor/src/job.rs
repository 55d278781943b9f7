//! Reversible unit of document mutation

use std::fmt;

use scenekit_model::Document;

/// Trait for reversible edits
///
/// Each job:
/// - checks up front whether it can run against the current graph
/// - records on `execute` whatever it needs to reverse itself
/// - undoes/redoes from that record only, never recomputing
pub trait Job: fmt::Debug {
    /// Pure predicate on the current graph state
    fn is_executable(&self, doc: &Document) -> bool;

    fn execute(&mut self, doc: &mut Document);

    fn undo(&mut self, doc: &mut Document);

    fn redo(&mut self, doc: &mut Document);

    /// Human readable label, e.g. for an Edit menu
    fn description(&self) -> String;
}

/// Lifecycle of a job: pending → executed ↔ undone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Pending,
    Executed,
    Undone,
}

impl JobState {
    pub fn executed(&mut self) {
        assert_eq!(*self, JobState::Pending, "job executed twice");
        *self = JobState::Executed;
    }

    pub fn undone(&mut self) {
        assert_eq!(*self, JobState::Executed, "undo of a job that is not executed");
        *self = JobState::Undone;
    }

    pub fn redone(&mut self) {
        assert_eq!(*self, JobState::Undone, "redo of a job that is not undone");
        *self = JobState::Executed;
    }
}
