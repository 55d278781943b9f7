use scenekit_model::Document;

use crate::job::{Job, JobState};
use crate::jobs::JobRecorder;

/// Fixed list of jobs run in order as one undoable step.
///
/// Jobs that are not executable by the time their turn comes are skipped.
#[derive(Debug)]
pub struct BatchJob {
    pending: Vec<Box<dyn Job>>,
    description: String,
    recorded: JobRecorder,
    state: JobState,
}

impl BatchJob {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            pending: Vec::new(),
            description: description.into(),
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    pub fn with_job(mut self, job: impl Job + 'static) -> Self {
        self.pending.push(Box::new(job));
        self
    }

    pub fn push(&mut self, job: Box<dyn Job>) {
        assert_eq!(self.state, JobState::Pending, "batch already executed");
        self.pending.push(job);
    }
}

impl Job for BatchJob {
    fn is_executable(&self, doc: &Document) -> bool {
        self.pending
            .first()
            .map(|job| job.is_executable(doc))
            .unwrap_or(false)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let pending = std::mem::take(&mut self.pending);
        self.recorded = JobRecorder::record(doc, |doc, jobs| {
            for job in pending {
                jobs.run_boxed(doc, job);
            }
        });
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        self.recorded.undo(doc);
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        self.recorded.redo(doc);
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}
