//! # Undo/Redo Stack
//!
//! Linear job history for one document.
//!
//! ## Design
//!
//! - A job is executed when pushed and kept with the state it recorded
//! - Undo calls the job's own `undo` and moves it to the redo stack
//! - Redo calls `redo`, which replays the recorded state
//! - Pushing after an undo clears the redo stack
//! - Batches group several jobs into one undo step
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! let mut doc = Document::from_json(source)?;
//!
//! stack.push(ModifyFxIdJob::new(button, Some("ok".into())), &mut doc)?;
//! stack.undo(&mut doc);
//! stack.redo(&mut doc);
//! ```

use scenekit_model::Document;
use tracing::debug;

use crate::{EditorError, Job};

/// Jobs that are undone/redone together
#[derive(Debug, Default)]
pub struct JobBatch {
    /// The jobs in this batch (in execution order)
    pub jobs: Vec<Box<dyn Job>>,

    /// Optional description of this batch
    pub description: Option<String>,
}

impl JobBatch {
    pub fn single(job: Box<dyn Job>) -> Self {
        Self {
            jobs: vec![job],
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Explicit description, or the one of the last job
    pub fn description(&self) -> Option<String> {
        self.description
            .clone()
            .or_else(|| self.jobs.last().map(|job| job.description()))
    }
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct UndoStack {
    /// Executed batches (most recent last)
    undo_stack: Vec<JobBatch>,

    /// Undone batches (most recent last)
    redo_stack: Vec<JobBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Currently building a batch
    current_batch: Option<JobBatch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Execute a job and record it for undo
    pub fn push(&mut self, job: impl Job + 'static, doc: &mut Document) -> Result<(), EditorError> {
        self.push_boxed(Box::new(job), doc)
    }

    pub fn push_boxed(&mut self, mut job: Box<dyn Job>, doc: &mut Document) -> Result<(), EditorError> {
        if !job.is_executable(doc) {
            return Err(EditorError::NotExecutable(job.description()));
        }

        job.execute(doc);
        debug!(job = %job.description(), revision = doc.revision(), "job executed");
        self.record(job);
        Ok(())
    }

    /// Record a job the caller already executed
    pub fn push_executed(&mut self, job: Box<dyn Job>) {
        debug!(job = %job.description(), "executed job recorded");
        self.record(job);
    }

    fn record(&mut self, job: Box<dyn Job>) {
        if let Some(batch) = &mut self.current_batch {
            batch.jobs.push(job);
        } else {
            self.push_batch(JobBatch::single(job));
        }
    }

    /// Start a batch of jobs (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        assert!(self.current_batch.is_none(), "batch already open");
        self.current_batch = Some(JobBatch::default());
    }

    /// End the current batch and push to undo stack
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.jobs.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    pub fn is_batching(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push_batch(&mut self, batch: JobBatch) {
        self.undo_stack.push(batch);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates the future
        self.redo_stack.clear();
    }

    /// Undo the most recent job/batch
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        assert!(self.current_batch.is_none(), "undo while a batch is open");
        let Some(mut batch) = self.undo_stack.pop() else {
            return false;
        };

        doc.update(|doc| {
            for job in batch.jobs.iter_mut().rev() {
                job.undo(doc);
            }
        });
        debug!(job = ?batch.description(), revision = doc.revision(), "undo");

        self.redo_stack.push(batch);
        true
    }

    /// Redo the most recently undone job/batch
    pub fn redo(&mut self, doc: &mut Document) -> bool {
        assert!(self.current_batch.is_none(), "redo while a batch is open");
        let Some(mut batch) = self.redo_stack.pop() else {
            return false;
        };

        doc.update(|doc| {
            for job in batch.jobs.iter_mut() {
                job.redo(doc);
            }
        });
        debug!(job = ?batch.description(), revision = doc.revision(), "redo");

        self.undo_stack.push(batch);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    /// Description of the next undo step
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().and_then(|batch| batch.description())
    }

    /// Description of the next redo step
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().and_then(|batch| batch.description())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
