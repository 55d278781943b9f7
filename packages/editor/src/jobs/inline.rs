//! Record-then-replay support for composite jobs.
//!
//! A composite plans by running: every sub-job executes as soon as it is
//! produced, so later steps see the graph the earlier ones left behind.
//! The recorder keeps that exact list; undo walks it backwards and redo
//! forwards, so a redo never plans again.

use scenekit_model::Document;
use tracing::{trace, warn};

use crate::job::Job;

#[derive(Debug, Default)]
pub struct JobRecorder {
    jobs: Vec<Box<dyn Job>>,
}

impl JobRecorder {
    /// Run `plan` inside one update bracket and keep what it executed
    pub fn record(doc: &mut Document, plan: impl FnOnce(&mut Document, &mut JobRecorder)) -> Self {
        let mut recorder = JobRecorder::default();
        doc.update(|doc| plan(doc, &mut recorder));
        recorder
    }

    /// Execute `job` if it is executable right now. Returns whether it ran.
    pub fn run(&mut self, doc: &mut Document, job: impl Job + 'static) -> bool {
        self.run_boxed(doc, Box::new(job))
    }

    pub fn run_boxed(&mut self, doc: &mut Document, mut job: Box<dyn Job>) -> bool {
        if !job.is_executable(doc) {
            trace!(job = %job.description(), "sub-job skipped");
            return false;
        }
        job.execute(doc);
        self.jobs.push(job);
        true
    }

    /// Run dependent steps as one unit. When `steps` returns false
    /// everything they executed is undone and nothing is recorded.
    pub fn all_or_nothing(
        &mut self,
        doc: &mut Document,
        steps: impl FnOnce(&mut Document, &mut JobRecorder) -> bool,
    ) -> bool {
        let mut nested = JobRecorder::default();
        if steps(doc, &mut nested) {
            self.jobs.append(&mut nested.jobs);
            return true;
        }
        if !nested.is_empty() {
            warn!(steps = nested.len(), "dependent step refused, rolling back");
            nested.undo(doc);
        }
        false
    }

    pub fn undo(&mut self, doc: &mut Document) {
        doc.update(|doc| {
            for job in self.jobs.iter_mut().rev() {
                job.undo(doc);
            }
        });
    }

    pub fn redo(&mut self, doc: &mut Document) {
        doc.update(|doc| {
            for job in self.jobs.iter_mut() {
                job.redo(doc);
            }
        });
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Descriptions of the recorded sub-jobs, in execution order
    pub fn descriptions(&self) -> Vec<String> {
        self.jobs.iter().map(|job| job.description()).collect()
    }
}
