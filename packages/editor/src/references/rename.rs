use scenekit_model::{expression_for, Alias, Document, ObjectId};

use crate::job::{Job, JobState};
use crate::jobs::{JobRecorder, ModifyFxIdJob, ModifyIntrinsicSourceJob, ModifyValueJob};

/// Change an fx:id and make every alias follow
#[derive(Debug)]
pub struct RenameFxIdJob {
    object: ObjectId,
    fx_id: String,
    recorded: JobRecorder,
    state: JobState,
}

impl RenameFxIdJob {
    pub fn new(object: ObjectId, fx_id: impl Into<String>) -> Self {
        Self {
            object,
            fx_id: fx_id.into(),
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let Some(old) = doc.object(self.object).fx_id().map(str::to_string) else {
            return;
        };
        let aliases = doc.collect_aliases(Some(&old));

        jobs.run(doc, ModifyFxIdJob::new(self.object, Some(self.fx_id.clone())));
        for alias in aliases {
            match alias {
                Alias::Intrinsic(reference) => {
                    jobs.run(doc, ModifyIntrinsicSourceJob::new(reference, self.fx_id.clone()));
                }
                Alias::Expression(property) => {
                    jobs.run(doc, ModifyValueJob::new(property, expression_for(&self.fx_id)));
                }
            }
        }
    }
}

impl Job for RenameFxIdJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.object(self.object).fx_id().is_some()
            && ModifyFxIdJob::new(self.object, Some(self.fx_id.clone())).is_executable(doc)
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
        format!("Rename to '{}'", self.fx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_model::{DocumentSpec, NodeSpec};

    #[test]
    fn test_aliases_follow_rename() {
        let spec = DocumentSpec {
            root: Some(NodeSpec::instance("VBox").with_values(
                "children",
                vec![
                    NodeSpec::instance("TextField").with_fx_id("name"),
                    NodeSpec::instance("Label").with_value("labelFor", "$name"),
                    NodeSpec::reference("name"),
                    NodeSpec::reference("other"),
                ],
            )),
        };
        let mut doc = Document::from_spec(&spec).unwrap();
        let field = doc.search_with_fx_id("name").unwrap();
        let before = doc.snapshot();

        let mut job = RenameFxIdJob::new(field, "email");
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);

        assert_eq!(doc.collect_aliases(Some("email")).len(), 2);
        assert!(doc.collect_aliases(Some("name")).is_empty());
        assert_eq!(doc.collect_aliases(Some("other")).len(), 1);

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_rename_refuses_ids_expressions_cannot_name() {
        let spec = DocumentSpec {
            root: Some(
                NodeSpec::instance("Button")
                    .with_values("graphic", vec![NodeSpec::instance("ImageView").with_fx_id("icon")])
                    .with_value("tooltip", "$icon"),
            ),
        };
        let mut doc = Document::from_spec(&spec).unwrap();
        let icon = doc.search_with_fx_id("icon").unwrap();
        let before = doc.snapshot();

        assert!(!RenameFxIdJob::new(icon, "main-icon").is_executable(&doc));
        assert_eq!(doc.snapshot(), before);

        let mut job = RenameFxIdJob::new(icon, "mainIcon");
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);
        assert_eq!(doc.collect_aliases(Some("mainIcon")).len(), 1);
    }
}
