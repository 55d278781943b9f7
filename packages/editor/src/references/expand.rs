use scenekit_model::{expression_source, Document, FxIdGenerator, ObjectId, PropertyId};

use crate::job::{Job, JobState};
use crate::jobs::{JobRecorder, ReplaceObjectJob, ReplacePropertyJob};

/// Replace an `fx:reference` / `fx:copy` by a clone of its target
#[derive(Debug)]
pub struct ExpandIntrinsicReferenceJob {
    reference: ObjectId,
    recorded: JobRecorder,
    state: JobState,
}

impl ExpandIntrinsicReferenceJob {
    pub fn new(reference: ObjectId) -> Self {
        Self {
            reference,
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let Some(referee) = referee_of_intrinsic(doc, self.reference) else {
            return;
        };
        let mut ids = FxIdGenerator::new(doc);
        let clone = doc.clone_subtree(referee, &mut ids);
        jobs.run(doc, ReplaceObjectJob::new(self.reference, clone));
    }
}

fn referee_of_intrinsic(doc: &Document, reference: ObjectId) -> Option<ObjectId> {
    let source = doc.object(reference).intrinsic()?.source();
    doc.search_with_fx_id(source)
}

impl Job for ExpandIntrinsicReferenceJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.location_of(self.reference).is_some()
            && referee_of_intrinsic(doc, self.reference).is_some()
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
        "Expand reference".to_string()
    }
}

/// Replace a `$id` value by a property holding a clone of the target
#[derive(Debug)]
pub struct ExpandExpressionReferenceJob {
    property: PropertyId,
    recorded: JobRecorder,
    state: JobState,
}

impl ExpandExpressionReferenceJob {
    pub fn new(property: PropertyId) -> Self {
        Self {
            property,
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let Some(referee) = referee_of_expression(doc, self.property) else {
            return;
        };
        let mut ids = FxIdGenerator::new(doc);
        let clone = doc.clone_subtree(referee, &mut ids);

        // both nodes are fresh: linking them needs no job
        let name = doc.property(self.property).name().to_string();
        let replacement = doc.new_collection_property(name);
        doc.add_value(replacement, clone, None);
        jobs.run(doc, ReplacePropertyJob::new(self.property, replacement));
    }
}

fn referee_of_expression(doc: &Document, property: PropertyId) -> Option<ObjectId> {
    let source = doc.property(property).value().and_then(expression_source)?;
    doc.search_with_fx_id(source)
}

impl Job for ExpandExpressionReferenceJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.property(self.property).owner().is_some()
            && referee_of_expression(doc, self.property).is_some()
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
        "Expand expression".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_model::{DocumentSpec, NodeSpec};

    fn doc_with(children: Vec<NodeSpec>) -> Document {
        let spec = DocumentSpec {
            root: Some(NodeSpec::instance("VBox").with_values("children", children)),
        };
        Document::from_spec(&spec).unwrap()
    }

    #[test]
    fn test_expand_intrinsic_inlines_clone() {
        let mut doc = doc_with(vec![
            NodeSpec::reference("title"),
            NodeSpec::instance("Label").with_fx_id("title").with_value("text", "Hi"),
        ]);
        let root = doc.root().unwrap();
        let reference = doc.children_of(root)[0];
        let before = doc.snapshot();

        let mut job = ExpandIntrinsicReferenceJob::new(reference);
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);

        let clone = doc.children_of(root)[0];
        assert_eq!(doc.object(clone).class_name(), Some("Label"));
        assert_eq!(doc.object(clone).fx_id(), Some("title1"));
        assert_eq!(doc.value_of(clone, "text"), Some("Hi"));
        assert!(doc.duplicate_fx_ids().is_empty());

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_expand_expression_swaps_property() {
        let mut doc = doc_with(vec![
            NodeSpec::instance("Button").with_value("graphic", "$icon"),
            NodeSpec::instance("ImageView").with_fx_id("icon"),
        ]);
        let root = doc.root().unwrap();
        let button = doc.children_of(root)[0];
        let graphic = doc.property_named(button, "graphic").unwrap();
        let before = doc.snapshot();

        let mut job = ExpandExpressionReferenceJob::new(graphic);
        job.execute(&mut doc);

        let expanded = doc.property_named(button, "graphic").unwrap();
        assert_ne!(expanded, graphic);
        let inlined = doc.property(expanded).values()[0];
        assert_eq!(doc.object(inlined).class_name(), Some("ImageView"));

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
        job.redo(&mut doc);
        assert_eq!(doc.property_named(button, "graphic"), Some(expanded));
    }

    #[test]
    fn test_dangling_alias_cannot_expand() {
        let doc = doc_with(vec![NodeSpec::reference("missing")]);
        let root = doc.root().unwrap();
        let reference = doc.children_of(root)[0];
        assert!(!ExpandIntrinsicReferenceJob::new(reference).is_executable(&doc));
    }
}
