use scenekit_model::{Alias, Document, IntrinsicKind, ObjectId};

use crate::job::{Job, JobState};
use crate::jobs::{AddPropertyValueJob, JobRecorder, ReplaceObjectJob, ReplacePropertyJob};

/// Make a group alias the home of its group.
///
/// When the group is declared later in the document, the declaration moves
/// to the alias site and an `fx:reference` takes its old place. When it is
/// not declared at all, a new group object declaring the fx:id is created
/// at the alias site. Either way every later alias resolves.
#[derive(Debug)]
pub struct FixGroupReferenceJob {
    alias: Alias,
    group_class: String,
    recorded: JobRecorder,
    state: JobState,
}

impl FixGroupReferenceJob {
    pub fn new(alias: Alias, group_class: impl Into<String>) -> Self {
        Self {
            alias,
            group_class: group_class.into(),
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    /// Detach the current declaration, leaving a reference in its slot
    fn take_declaration(doc: &mut Document, jobs: &mut JobRecorder, referee: ObjectId, fx_id: &str) -> bool {
        let placeholder = doc.new_intrinsic(IntrinsicKind::Reference, fx_id);
        jobs.run(doc, ReplaceObjectJob::new(referee, placeholder))
    }

    fn new_group(&self, doc: &mut Document, fx_id: &str) -> ObjectId {
        let group = doc.new_instance(self.group_class.clone());
        doc.set_fx_id(group, Some(fx_id.to_string()));
        group
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) -> bool {
        let fx_id = self.alias.source(doc).to_string();
        let referee = doc.search_with_fx_id(&fx_id);

        match self.alias {
            Alias::Intrinsic(reference) => {
                let group = match referee {
                    Some(referee) => {
                        if !Self::take_declaration(doc, jobs, referee, &fx_id) {
                            return false;
                        }
                        referee
                    }
                    None => self.new_group(doc, &fx_id),
                };
                jobs.run(doc, ReplaceObjectJob::new(reference, group))
            }
            Alias::Expression(property) => {
                let name = doc.property(property).name().to_string();
                let replacement = doc.new_collection_property(name);
                match referee {
                    Some(referee) => {
                        if !(Self::take_declaration(doc, jobs, referee, &fx_id)
                            && jobs.run(doc, AddPropertyValueJob::new(referee, replacement, None)))
                        {
                            return false;
                        }
                    }
                    None => {
                        let group = self.new_group(doc, &fx_id);
                        doc.add_value(replacement, group, None);
                    }
                }
                jobs.run(doc, ReplacePropertyJob::new(property, replacement))
            }
        }
    }
}

impl Job for FixGroupReferenceJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let Some(anchor) = self.alias.anchor(doc) else {
            return false;
        };
        if !doc.is_attached(anchor) {
            return false;
        }
        match doc.search_with_fx_id(self.alias.source(doc)) {
            // the declaration cannot move below itself
            Some(referee) => doc.root() != Some(referee) && !doc.is_within(anchor, referee),
            None => true,
        }
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let recorded = JobRecorder::record(doc, |doc, jobs| {
            jobs.all_or_nothing(doc, |doc, jobs| self.plan(doc, jobs));
        });
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
        "Fix group reference".to_string()
    }
}
