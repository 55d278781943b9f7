use scenekit_model::{Alias, Document, ObjectId};
use tracing::debug;

use crate::job::{Job, JobState};
use crate::jobs::atomic::object_label;
use crate::jobs::{JobRecorder, RemoveObjectJob, RemovePropertyJob, SetDocumentRootJob};
use crate::references::{ReferencePolicy, RelocateRefereeJob, Strength};

/// Delete an object without leaving aliases behind.
///
/// Every object of the deleted subtree that declares an fx:id is looked at,
/// depth first:
///
/// - aliases inside the deleted subtree disappear with it
/// - weak aliases outside are deleted
/// - the first remaining alias, in document order, is replaced by the object
///   itself, which then survives at that spot
///
/// A promoted object carries its own aliases out of the subtree, so the
/// pass repeats until nothing more is promoted.
#[derive(Debug)]
pub struct DeleteObjectJob {
    object: ObjectId,
    policy: ReferencePolicy,
    label: String,
    recorded: JobRecorder,
    state: JobState,
}

impl DeleteObjectJob {
    pub fn new(object: ObjectId, policy: ReferencePolicy) -> Self {
        Self {
            object,
            policy,
            label: String::new(),
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let target = self.object;
        let mut target_survives = false;

        loop {
            let mut promoted = false;
            for object in doc.subtree_order(target) {
                // promoted along with an ancestor
                if !doc.is_within(object, target) {
                    continue;
                }
                if self.release_referee(doc, jobs, object, target) {
                    promoted = true;
                    if object == target {
                        target_survives = true;
                        break;
                    }
                }
            }
            if target_survives || !promoted {
                break;
            }
        }

        if target_survives {
            debug!(object = %target, "deleted object replaced its first alias");
        } else if doc.root() == Some(target) {
            jobs.run(doc, SetDocumentRootJob::new(None));
        } else {
            jobs.run(doc, RemoveObjectJob::new(target));
        }
    }

    /// Clear the aliases of `object` that live outside `target`. Returns true
    /// when `object` was promoted to the first strong alias.
    fn release_referee(&self, doc: &mut Document, jobs: &mut JobRecorder, object: ObjectId, target: ObjectId) -> bool {
        let Some(fx_id) = doc.object(object).fx_id().map(str::to_string) else {
            return false;
        };
        let outside: Vec<Alias> = doc
            .collect_aliases(Some(&fx_id))
            .into_iter()
            .filter(|alias| !alias.is_within(doc, target))
            .collect();
        if outside.is_empty() {
            return false;
        }

        let (weak, strong): (Vec<Alias>, Vec<Alias>) = outside
            .into_iter()
            .partition(|alias| self.policy.strength_of(doc, *alias) == Strength::Weak);
        for alias in weak {
            match alias {
                Alias::Intrinsic(reference) => jobs.run(doc, RemoveObjectJob::new(reference)),
                Alias::Expression(property) => jobs.run(doc, RemovePropertyJob::new(property)),
            };
        }

        match strong.into_iter().next() {
            Some(alias) if RelocateRefereeJob::can_relocate(doc, alias, object) => {
                RelocateRefereeJob::relocate(doc, jobs, alias, object)
            }
            _ => false,
        }
    }
}

impl Job for DeleteObjectJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.is_attached(self.object)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.label = object_label(doc, self.object);
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
        if self.label.is_empty() {
            "Delete".to_string()
        } else {
            format!("Delete {}", self.label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_model::{DocumentSpec, NodeSpec};

    fn form(children: Vec<NodeSpec>) -> Document {
        let spec = DocumentSpec {
            root: Some(NodeSpec::instance("VBox").with_values("children", children)),
        };
        Document::from_spec(&spec).unwrap()
    }

    #[test]
    fn test_plain_delete() {
        let mut doc = form(vec![NodeSpec::instance("Button"), NodeSpec::instance("Label")]);
        let root = doc.root().unwrap();
        let button = doc.children_of(root)[0];
        let before = doc.snapshot();

        let mut job = DeleteObjectJob::new(button, ReferencePolicy::default());
        job.execute(&mut doc);
        assert_eq!(doc.children_of(root).len(), 1);
        assert_eq!(job.description(), "Delete Button");

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_weak_aliases_go_with_the_referee() {
        let mut doc = form(vec![
            NodeSpec::instance("Label").with_value("labelFor", "$name").with_value("text", "Name"),
            NodeSpec::instance("TextField").with_fx_id("name"),
        ]);
        let root = doc.root().unwrap();
        let label = doc.children_of(root)[0];
        let field = doc.search_with_fx_id("name").unwrap();

        let mut job = DeleteObjectJob::new(field, ReferencePolicy::default());
        job.execute(&mut doc);
        assert_eq!(doc.children_of(root), vec![label]);
        assert_eq!(doc.property_named(label, "labelFor"), None);
        assert!(doc.collect_aliases(None).is_empty());

        job.undo(&mut doc);
        assert_eq!(doc.value_of(label, "labelFor"), Some("$name"));
    }

    #[test]
    fn test_strong_alias_is_promoted() {
        let mut doc = form(vec![
            NodeSpec::instance("Label").with_value("labelFor", "$name"),
            NodeSpec::instance("TitledPane").with_fx_id("pane"),
            NodeSpec::instance("Accordion").with_values("panes", vec![NodeSpec::reference("pane")]),
        ]);
        let root = doc.root().unwrap();
        let pane = doc.search_with_fx_id("pane").unwrap();
        let accordion = doc.children_of(root)[2];
        let before = doc.snapshot();

        let mut job = DeleteObjectJob::new(pane, ReferencePolicy::default());
        job.execute(&mut doc);
        assert_eq!(doc.children_of(accordion), vec![pane]);
        assert_eq!(doc.children_of(root).len(), 2);
        assert!(doc.is_attached(pane));

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_descendant_referee_survives_parent_delete() {
        let mut doc = form(vec![
            NodeSpec::instance("HBox").with_values(
                "children",
                vec![NodeSpec::instance("ImageView").with_fx_id("logo")],
            ),
            NodeSpec::instance("Button").with_values("graphic", vec![NodeSpec::reference("logo")]),
        ]);
        let root = doc.root().unwrap();
        let hbox = doc.children_of(root)[0];
        let button = doc.children_of(root)[1];
        let logo = doc.search_with_fx_id("logo").unwrap();

        let mut job = DeleteObjectJob::new(hbox, ReferencePolicy::default());
        job.execute(&mut doc);
        assert_eq!(doc.children_of(root), vec![button]);
        assert_eq!(doc.children_of(button), vec![logo]);
    }

    #[test]
    fn test_promoted_referee_takes_its_sibling_along() {
        // `chart` survives inside `dashboard`; its alias to `legend` would
        // dangle if `legend` went down with the box
        let mut doc = form(vec![
            NodeSpec::instance("VBox").with_values(
                "children",
                vec![
                    NodeSpec::instance("Label").with_fx_id("legend"),
                    NodeSpec::instance("Pane")
                        .with_fx_id("chart")
                        .with_values("children", vec![NodeSpec::reference("legend")]),
                ],
            ),
            NodeSpec::instance("Pane")
                .with_fx_id("dashboard")
                .with_values("children", vec![NodeSpec::reference("chart")]),
        ]);
        let root = doc.root().unwrap();
        let doomed = doc.children_of(root)[0];
        let legend = doc.search_with_fx_id("legend").unwrap();
        let chart = doc.search_with_fx_id("chart").unwrap();
        let dashboard = doc.search_with_fx_id("dashboard").unwrap();
        let before = doc.snapshot();

        let mut job = DeleteObjectJob::new(doomed, ReferencePolicy::default());
        job.execute(&mut doc);
        assert!(!doc.is_attached(doomed));
        assert_eq!(doc.children_of(dashboard), vec![chart]);
        assert_eq!(doc.children_of(chart), vec![legend]);
        for alias in doc.collect_aliases(None) {
            assert!(doc.is_declared(alias.source(&doc)));
        }

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_delete_root_clears_document() {
        let mut doc = form(vec![]);
        let root = doc.root().unwrap();
        let mut job = DeleteObjectJob::new(root, ReferencePolicy::default());
        job.execute(&mut doc);
        assert_eq!(doc.root(), None);
        job.undo(&mut doc);
        assert_eq!(doc.root(), Some(root));
    }
}
