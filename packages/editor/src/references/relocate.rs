use scenekit_model::{Alias, Document, ObjectId};

use crate::job::{Job, JobState};
use crate::jobs::{
    AddPropertyValueJob, JobRecorder, RemoveObjectJob, ReplaceObjectJob, ReplacePropertyJob,
};

/// Replace a live alias by the object it points to.
///
/// The referee leaves its current slot and takes the alias's place; the
/// alias is gone afterwards.
#[derive(Debug)]
pub struct RelocateRefereeJob {
    alias: Alias,
    recorded: JobRecorder,
    state: JobState,
}

impl RelocateRefereeJob {
    pub fn new(alias: Alias) -> Self {
        Self {
            alias,
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    /// Move `referee` to where `alias` sits. Shared with referee deletion.
    /// Either every step runs or none does.
    pub(crate) fn relocate(doc: &mut Document, jobs: &mut JobRecorder, alias: Alias, referee: ObjectId) -> bool {
        jobs.all_or_nothing(doc, |doc, jobs| {
            if !jobs.run(doc, RemoveObjectJob::new(referee)) {
                return false;
            }
            match alias {
                Alias::Intrinsic(reference) => jobs.run(doc, ReplaceObjectJob::new(reference, referee)),
                Alias::Expression(property) => {
                    let name = doc.property(property).name().to_string();
                    let replacement = doc.new_collection_property(name);
                    jobs.run(doc, AddPropertyValueJob::new(referee, replacement, None))
                        && jobs.run(doc, ReplacePropertyJob::new(property, replacement))
                }
            }
        })
    }

    /// Whether `referee` can move to `alias` without landing below itself
    pub(crate) fn can_relocate(doc: &Document, alias: Alias, referee: ObjectId) -> bool {
        let Some(anchor) = alias.anchor(doc) else {
            return false;
        };
        doc.object(referee).parent().is_some() && !doc.is_within(anchor, referee)
    }
}

impl Job for RelocateRefereeJob {
    fn is_executable(&self, doc: &Document) -> bool {
        if !self.alias.is_attached(doc) {
            return false;
        }
        doc.search_with_fx_id(self.alias.source(doc))
            .map(|referee| Self::can_relocate(doc, self.alias, referee))
            .unwrap_or(false)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let alias = self.alias;
        self.recorded = JobRecorder::record(doc, |doc, jobs| {
            let source = alias.source(doc).to_string();
            if let Some(referee) = doc.search_with_fx_id(&source) {
                Self::relocate(doc, jobs, alias, referee);
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
        "Move referenced object here".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_model::{DocumentSpec, NodeSpec};

    #[test]
    fn test_referee_takes_alias_slot() {
        let spec = DocumentSpec {
            root: Some(NodeSpec::instance("SplitPane").with_values(
                "items",
                vec![
                    NodeSpec::instance("ListView").with_fx_id("list"),
                    NodeSpec::instance("ScrollPane").with_values("content", vec![NodeSpec::reference("list")]),
                ],
            )),
        };
        let mut doc = Document::from_spec(&spec).unwrap();
        let root = doc.root().unwrap();
        let list = doc.search_with_fx_id("list").unwrap();
        let scroll = doc.children_of(root)[1];
        let reference = doc.children_of(scroll)[0];
        let before = doc.snapshot();

        let mut job = RelocateRefereeJob::new(Alias::Intrinsic(reference));
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);

        assert_eq!(doc.children_of(root), vec![scroll]);
        assert_eq!(doc.children_of(scroll), vec![list]);
        assert!(doc.collect_aliases(None).is_empty());

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }
}
