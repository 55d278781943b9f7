use scenekit_model::{Document, ObjectId};

use crate::job::{Job, JobState};
use crate::jobs::atomic::object_label;
use crate::jobs::{AddPropertyJob, JobRecorder, ModifyValueJob, RemovePropertyJob};

/// Set or clear the value property `name` of an object.
///
/// Creates the property when missing, removes it when `value` is `None`,
/// and replaces a collection property of the same name by a value.
#[derive(Debug)]
pub struct ModifyObjectJob {
    object: ObjectId,
    name: String,
    value: Option<String>,
    recorded: JobRecorder,
    state: JobState,
}

impl ModifyObjectJob {
    pub fn new(object: ObjectId, name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            object,
            name: name.into(),
            value,
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    pub fn set(object: ObjectId, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(object, name, Some(value.into()))
    }

    /// Description naming the edited object, for menus
    pub fn describe(&self, doc: &Document) -> String {
        format!("{} on {}", self.description(), object_label(doc, self.object))
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let existing = doc.property_named(self.object, &self.name);
        match (existing, &self.value) {
            (Some(property), Some(value)) if !doc.property(property).is_collection() => {
                jobs.run(doc, ModifyValueJob::new(property, value.clone()));
            }
            (Some(property), Some(value)) => {
                let index = doc.property_index(property);
                let replacement = doc.new_value_property(self.name.clone(), value.clone());
                jobs.all_or_nothing(doc, |doc, jobs| {
                    jobs.run(doc, RemovePropertyJob::new(property))
                        && jobs.run(doc, AddPropertyJob::new(replacement, self.object, index))
                });
            }
            (Some(property), None) => {
                jobs.run(doc, RemovePropertyJob::new(property));
            }
            (None, Some(value)) => {
                let property = doc.new_value_property(self.name.clone(), value.clone());
                jobs.run(doc, AddPropertyJob::new(property, self.object, None));
            }
            (None, None) => {}
        }
    }
}

impl Job for ModifyObjectJob {
    fn is_executable(&self, doc: &Document) -> bool {
        if !doc.object(self.object).owns_properties() {
            return false;
        }
        let existing = doc.property_named(self.object, &self.name);
        match (existing, &self.value) {
            (Some(property), Some(value)) => doc.property(property).value() != Some(value.as_str()),
            (Some(_), None) => true,
            (None, value) => value.is_some(),
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
        match &self.value {
            Some(value) => format!("Set {} to '{}'", self.name, value),
            None => format!("Clear {}", self.name),
        }
    }
}
