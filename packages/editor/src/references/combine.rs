use scenekit_model::{expression_for, Document, IntrinsicKind, ObjectId, PropertyId};

use crate::job::{Job, JobState};
use crate::jobs::{JobRecorder, ReplaceObjectJob, ReplacePropertyJob};

/// The declaration of `fx_id` exists and does not live inside `subtree`
fn declared_outside(doc: &Document, fx_id: &str, subtree: ObjectId) -> bool {
    doc.search_with_fx_id(fx_id)
        .map(|referee| !doc.is_within(referee, subtree))
        .unwrap_or(false)
}

/// Replace an inlined copy by an `fx:reference` to `fx_id`
#[derive(Debug)]
pub struct CombineIntrinsicReferenceJob {
    object: ObjectId,
    fx_id: String,
    recorded: JobRecorder,
    state: JobState,
}

impl CombineIntrinsicReferenceJob {
    pub fn new(object: ObjectId, fx_id: impl Into<String>) -> Self {
        Self {
            object,
            fx_id: fx_id.into(),
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let reference = doc.new_intrinsic(IntrinsicKind::Reference, self.fx_id.clone());
        jobs.run(doc, ReplaceObjectJob::new(self.object, reference));
    }
}

impl Job for CombineIntrinsicReferenceJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.object(self.object).parent().is_some()
            && doc.is_attached(self.object)
            && declared_outside(doc, &self.fx_id, self.object)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let recorded = JobRecorder::record(doc, |doc, jobs| self.plan(doc, jobs));
        self.recorded = recorded;
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
        format!("Combine into reference to '{}'", self.fx_id)
    }
}

/// Replace a property holding one inlined copy by a `$fx_id` value
#[derive(Debug)]
pub struct CombineExpressionReferenceJob {
    property: PropertyId,
    fx_id: String,
    recorded: JobRecorder,
    state: JobState,
}

impl CombineExpressionReferenceJob {
    pub fn new(property: PropertyId, fx_id: impl Into<String>) -> Self {
        Self {
            property,
            fx_id: fx_id.into(),
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let name = doc.property(self.property).name().to_string();
        let replacement = doc.new_value_property(name, expression_for(&self.fx_id));
        jobs.run(doc, ReplacePropertyJob::new(self.property, replacement));
    }
}

impl Job for CombineExpressionReferenceJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let property = doc.property(self.property);
        let attached = property
            .owner()
            .map(|owner| doc.is_attached(owner))
            .unwrap_or(false);
        match property.values() {
            [inlined] => attached && declared_outside(doc, &self.fx_id, *inlined),
            _ => false,
        }
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let recorded = JobRecorder::record(doc, |doc, jobs| self.plan(doc, jobs));
        self.recorded = recorded;
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
        format!("Combine into ${}", self.fx_id)
    }
}
