use std::collections::HashSet;

use scenekit_model::{Alias, Document, Location, ObjectId, PropertyId};
use tracing::{info, warn};

use crate::job::{Job, JobState};
use crate::jobs::{JobRecorder, RemoveObjectJob, RemovePropertyJob};
use crate::references::{
    classify, entry_for, AliasOutcome, ExpandExpressionReferenceJob, ExpandIntrinsicReferenceJob,
    FixGroupReferenceJob, ReferencePolicy, RepairReport,
};

/// Whole-document reference repair.
///
/// One walk in document order; an fx:id counts as declared once the walk
/// has entered its object. Aliases naming something not declared yet are
/// repaired on the spot and the walk continues into whatever replaced them.
/// A forward alias met again inside its own inlined copy is a cycle: it is
/// reported and left in place.
#[derive(Debug)]
pub struct ReferencesUpdaterJob {
    policy: ReferencePolicy,
    report: RepairReport,
    recorded: JobRecorder,
    state: JobState,
}

impl ReferencesUpdaterJob {
    pub fn new(policy: ReferencePolicy) -> Self {
        Self {
            policy,
            report: RepairReport::default(),
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    /// What the last execution found and did
    pub fn report(&self) -> &RepairReport {
        &self.report
    }

    /// Whether the walk changed anything
    pub fn changed(&self) -> bool {
        !self.recorded.is_empty()
    }
}

impl Job for ReferencesUpdaterJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.root().is_some()
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let policy = &self.policy;
        let mut report = RepairReport::default();
        let recorded = JobRecorder::record(doc, |doc, jobs| {
            let mut walk = RepairWalk {
                policy,
                declared: HashSet::new(),
                expanding: Vec::new(),
                report: RepairReport::default(),
            };
            if let Some(root) = doc.root() {
                walk.visit_object(doc, jobs, root);
            }
            report = walk.report;
        });

        info!(
            aliases = report.entries.len(),
            inlined = report.count(AliasOutcome::Inlined),
            deleted = report.count(AliasOutcome::Deleted),
            retargeted = report.count(AliasOutcome::Retargeted),
            reported = report.count(AliasOutcome::Reported),
            "references updated"
        );
        self.recorded = recorded;
        self.report = report;
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
        "Update references".to_string()
    }
}

/// Whether a slot still holds something after the walk went through it
enum Slot {
    Kept,
    Removed,
}

enum Resolution {
    Keep,
    Removed,
    Object(ObjectId, Option<String>),
    Property(PropertyId, Option<String>),
}

/// Where an alias sits, so its replacement can be found afterwards
enum Site {
    Object(Location),
    Property { owner: ObjectId, index: usize },
}

struct RepairWalk<'a> {
    policy: &'a ReferencePolicy,
    declared: HashSet<String>,
    /// fx:ids whose inlined copies the walk is currently inside
    expanding: Vec<String>,
    report: RepairReport,
}

impl RepairWalk<'_> {
    fn visit_object(&mut self, doc: &mut Document, jobs: &mut JobRecorder, object: ObjectId) -> Slot {
        if let Some(alias) = Alias::of_object(doc, object) {
            return match self.resolve(doc, jobs, alias) {
                Resolution::Removed => Slot::Removed,
                Resolution::Object(replacement, inlined) => {
                    self.inside(inlined, |walk| walk.visit_object(doc, jobs, replacement))
                }
                Resolution::Keep | Resolution::Property(..) => Slot::Kept,
            };
        }

        if let Some(fx_id) = doc.object(object).fx_id() {
            self.declared.insert(fx_id.to_string());
        }

        let mut index = 0;
        while let Some(property) = doc.object(object).properties().get(index).copied() {
            if let Slot::Kept = self.visit_property(doc, jobs, property) {
                index += 1;
            }
        }
        let mut index = 0;
        while let Some(item) = doc.object(object).items().get(index).copied() {
            if let Slot::Kept = self.visit_object(doc, jobs, item) {
                index += 1;
            }
        }
        Slot::Kept
    }

    fn visit_property(&mut self, doc: &mut Document, jobs: &mut JobRecorder, property: PropertyId) -> Slot {
        if doc.property(property).is_collection() {
            let mut index = 0;
            let mut removed = false;
            while let Some(value) = doc.property(property).values().get(index).copied() {
                match self.visit_object(doc, jobs, value) {
                    Slot::Kept => index += 1,
                    Slot::Removed => removed = true,
                }
            }
            // a property emptied by the repair goes too
            if removed
                && doc.property(property).values().is_empty()
                && jobs.run(doc, RemovePropertyJob::new(property))
            {
                return Slot::Removed;
            }
            return Slot::Kept;
        }

        match Alias::of_property(doc, property) {
            Some(alias) => match self.resolve(doc, jobs, alias) {
                Resolution::Removed => Slot::Removed,
                Resolution::Property(replacement, inlined) => {
                    self.inside(inlined, |walk| walk.visit_property(doc, jobs, replacement))
                }
                Resolution::Keep | Resolution::Object(..) => Slot::Kept,
            },
            None => Slot::Kept,
        }
    }

    /// Visit an inlined copy of `inlined` with that id marked as expanding
    fn inside(&mut self, inlined: Option<String>, visit: impl FnOnce(&mut Self) -> Slot) -> Slot {
        let pushed = inlined.is_some();
        self.expanding.extend(inlined);
        let slot = visit(self);
        if pushed {
            self.expanding.pop();
        }
        slot
    }

    fn resolve(&mut self, doc: &mut Document, jobs: &mut JobRecorder, alias: Alias) -> Resolution {
        let (state, mut outcome) = classify(doc, self.policy, &self.declared, alias);
        let cyclic = outcome == Some(AliasOutcome::Inlined)
            && self.expanding.iter().any(|fx_id| fx_id == alias.source(doc));
        if cyclic {
            outcome = Some(AliasOutcome::Reported);
        }
        self.report.push(entry_for(doc, alias, state, outcome));

        match outcome {
            None => Resolution::Keep,
            Some(AliasOutcome::Reported) if cyclic => {
                warn!(
                    fx_id = alias.source(doc),
                    property = alias.property_name(doc).unwrap_or_default(),
                    "cyclic forward reference left in place"
                );
                Resolution::Keep
            }
            Some(AliasOutcome::Reported) => {
                warn!(
                    fx_id = alias.source(doc),
                    property = alias.property_name(doc).unwrap_or_default(),
                    "reference to undeclared fx:id left in place"
                );
                Resolution::Keep
            }
            Some(AliasOutcome::Deleted) => {
                let removed = match alias {
                    Alias::Intrinsic(reference) => jobs.run(doc, RemoveObjectJob::new(reference)),
                    Alias::Expression(property) => jobs.run(doc, RemovePropertyJob::new(property)),
                };
                if removed {
                    Resolution::Removed
                } else {
                    Resolution::Keep
                }
            }
            Some(AliasOutcome::Inlined) => {
                let inlined = Some(alias.source(doc).to_string());
                match alias {
                    Alias::Intrinsic(reference) => {
                        Self::replace(doc, jobs, alias, ExpandIntrinsicReferenceJob::new(reference), inlined)
                    }
                    Alias::Expression(property) => {
                        Self::replace(doc, jobs, alias, ExpandExpressionReferenceJob::new(property), inlined)
                    }
                }
            }
            Some(AliasOutcome::Retargeted) => {
                let group_class = alias
                    .property_name(doc)
                    .and_then(|name| self.policy.group_class(name))
                    .map(str::to_string);
                match group_class {
                    Some(class) => Self::replace(doc, jobs, alias, FixGroupReferenceJob::new(alias, class), None),
                    None => Resolution::Keep,
                }
            }
        }
    }

    /// Run `job`, which swaps the alias for something else, and return that
    fn replace(
        doc: &mut Document,
        jobs: &mut JobRecorder,
        alias: Alias,
        job: impl Job + 'static,
        inlined: Option<String>,
    ) -> Resolution {
        let site = match alias {
            Alias::Intrinsic(reference) => doc.location_of(reference).map(Site::Object),
            Alias::Expression(property) => {
                let owner = doc.property(property).owner();
                owner.zip(doc.property_index(property))
                    .map(|(owner, index)| Site::Property { owner, index })
            }
        };
        let Some(site) = site else {
            return Resolution::Keep;
        };
        if !jobs.run(doc, job) {
            return Resolution::Keep;
        }

        match site {
            Site::Object(location) => doc
                .object_at(location)
                .map(|object| Resolution::Object(object, inlined))
                .unwrap_or(Resolution::Keep),
            Site::Property { owner, index } => doc
                .object(owner)
                .properties()
                .get(index)
                .copied()
                .map(|property| Resolution::Property(property, inlined))
                .unwrap_or(Resolution::Keep),
        }
    }
}

/// Run a job, then repair references, as one undoable step
#[derive(Debug)]
pub struct UpdateReferencesJob {
    inner: Box<dyn Job>,
    updater: ReferencesUpdaterJob,
    state: JobState,
}

impl UpdateReferencesJob {
    pub fn new(inner: impl Job + 'static, policy: ReferencePolicy) -> Self {
        Self::boxed(Box::new(inner), policy)
    }

    pub fn boxed(inner: Box<dyn Job>, policy: ReferencePolicy) -> Self {
        Self {
            inner,
            updater: ReferencesUpdaterJob::new(policy),
            state: JobState::default(),
        }
    }

    pub fn report(&self) -> &RepairReport {
        self.updater.report()
    }
}

impl Job for UpdateReferencesJob {
    fn is_executable(&self, doc: &Document) -> bool {
        self.inner.is_executable(doc)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        doc.update(|doc| {
            self.inner.execute(doc);
            if self.updater.is_executable(doc) {
                self.updater.execute(doc);
            }
        });
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| {
            if self.updater.state != JobState::Pending {
                self.updater.undo(doc);
            }
            self.inner.undo(doc);
        });
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| {
            self.inner.redo(doc);
            if self.updater.state != JobState::Pending {
                self.updater.redo(doc);
            }
        });
    }

    fn description(&self) -> String {
        self.inner.description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::references::AliasState;
    use scenekit_model::{DocumentSpec, NodeSpec};

    fn repair(spec: NodeSpec) -> (Document, ReferencesUpdaterJob) {
        let mut doc = Document::from_spec(&DocumentSpec { root: Some(spec) }).unwrap();
        let mut job = ReferencesUpdaterJob::new(ReferencePolicy::default());
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);
        (doc, job)
    }

    #[test]
    fn test_backward_reference_stays() {
        let (doc, job) = repair(NodeSpec::instance("VBox").with_values(
            "children",
            vec![
                NodeSpec::instance("Label").with_fx_id("x"),
                NodeSpec::instance("Label").with_value("text", "$x"),
            ],
        ));
        assert!(!job.changed());
        assert!(job.report().is_clean());
        assert_eq!(job.report().entries[0].state, AliasState::ResolvedStrong);
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_dangling_strong_reference_is_reported() {
        let (doc, job) = repair(NodeSpec::instance("VBox").with_values(
            "children",
            vec![NodeSpec::reference("ghost")],
        ));
        assert!(!job.changed());
        assert_eq!(job.report().reported().count(), 1);
        assert_eq!(doc.collect_aliases(Some("ghost")).len(), 1);
    }

    #[test]
    fn test_weak_intrinsic_drops_emptied_property() {
        let (doc, job) = repair(NodeSpec::instance("VBox").with_values(
            "children",
            vec![
                NodeSpec::instance("Label").with_values("labelFor", vec![NodeSpec::reference("name")]),
                NodeSpec::instance("TextField").with_fx_id("name"),
            ],
        ));
        let root = doc.root().unwrap();
        let label = doc.children_of(root)[0];
        assert_eq!(doc.property_named(label, "labelFor"), None);
        assert_eq!(job.report().count(AliasOutcome::Deleted), 1);
    }

    #[test]
    fn test_clone_contents_are_walked() {
        // the inlined clone of `card` still names `footer`, declared last
        let (doc, job) = repair(NodeSpec::instance("VBox").with_values(
            "children",
            vec![
                NodeSpec::reference("card"),
                NodeSpec::instance("Pane")
                    .with_fx_id("card")
                    .with_values("children", vec![NodeSpec::reference("footer")]),
                NodeSpec::instance("Label").with_fx_id("footer"),
            ],
        ));
        assert_eq!(job.report().count(AliasOutcome::Inlined), 3);
        assert!(doc.duplicate_fx_ids().is_empty());
        let remaining = doc.collect_aliases(None);
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_mutual_forward_references_terminate() {
        // `a` holds a reference to `b` and `b` one back to `a`; both are
        // named before either is declared
        let (doc, job) = repair(NodeSpec::instance("VBox").with_values(
            "children",
            vec![
                NodeSpec::reference("a"),
                NodeSpec::instance("Pane")
                    .with_fx_id("a")
                    .with_values("children", vec![NodeSpec::reference("b")]),
                NodeSpec::instance("Pane")
                    .with_fx_id("b")
                    .with_values("children", vec![NodeSpec::reference("a")]),
            ],
        ));
        let report = job.report();
        assert_eq!(report.count(AliasOutcome::Inlined), 3);
        assert_eq!(report.count(AliasOutcome::Reported), 1);
        assert!(doc.duplicate_fx_ids().is_empty());
        // every copy of `b` keeps its alias; only the first one is forward
        assert_eq!(doc.collect_aliases(Some("a")).len(), 3);
        assert!(doc.collect_aliases(Some("b")).is_empty());
    }

    #[test]
    fn test_update_references_wraps_inner_job() {
        use crate::jobs::ReIndexObjectJob;

        let mut doc = Document::from_spec(&DocumentSpec {
            root: Some(NodeSpec::instance("VBox").with_values(
                "children",
                vec![
                    NodeSpec::instance("Label").with_fx_id("x"),
                    NodeSpec::reference("x"),
                ],
            )),
        })
        .unwrap();
        let root = doc.root().unwrap();
        let label = doc.children_of(root)[0];
        let before = doc.snapshot();

        // moving the declaration after its reference makes the reference forward
        let mut job = UpdateReferencesJob::new(ReIndexObjectJob::new(label, None), ReferencePolicy::default());
        job.execute(&mut doc);
        assert_eq!(job.report().count(AliasOutcome::Inlined), 1);
        assert_eq!(doc.revision(), 1);
        let children = doc.children_of(root);
        assert_eq!(children[1], label);
        assert_eq!(doc.object(children[0]).fx_id(), Some("x1"));

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }
}
