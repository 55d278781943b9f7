//! # Reference resolution
//!
//! Keeps by-id aliases (`fx:reference`, `fx:copy`, `$id` values) pointing at
//! something real while the graph changes.
//!
//! An alias is valid when the object declaring its fx:id comes first in
//! document order. Anything else is repaired by kind:
//!
//! ```text
//!                     forward                      dangling
//! strong   expand (inline a clone)          report, leave in place
//! weak     delete the alias                 delete the alias
//! group    move the declaration here        create a standalone group here
//! ```
//!
//! When several objects declare the same fx:id the first one wins.

mod combine;
mod delete;
mod expand;
mod group;
mod policy;
mod relocate;
mod rename;
mod updater;

use std::collections::HashSet;

use scenekit_model::{walk_object, Alias, AliasKind, Document, ObjectId, PropertyId, Visitor};
use serde::Serialize;

pub use combine::{CombineExpressionReferenceJob, CombineIntrinsicReferenceJob};
pub use delete::DeleteObjectJob;
pub use expand::{ExpandExpressionReferenceJob, ExpandIntrinsicReferenceJob};
pub use group::FixGroupReferenceJob;
pub use policy::{ReferencePolicy, Strength};
pub use relocate::RelocateRefereeJob;
pub use rename::RenameFxIdJob;
pub use updater::{ReferencesUpdaterJob, UpdateReferencesJob};

/// Where an alias stands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasState {
    /// Target declared later in document order
    UnresolvedForward,
    /// Target not declared anywhere
    Dangling,
    ResolvedStrong,
    ResolvedWeak,
    ResolvedGroup,
}

impl AliasState {
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            AliasState::ResolvedStrong | AliasState::ResolvedWeak | AliasState::ResolvedGroup
        )
    }
}

/// What repair did (or would do) with an unresolved alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasOutcome {
    /// Replaced by a clone of its target
    Inlined,
    Deleted,
    /// Group declaration moved or created at the alias site
    Retargeted,
    /// Could not be repaired, left in place
    Reported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairEntry {
    /// fx:id the alias names
    pub source: String,
    pub kind: AliasKind,
    /// Property the alias fills
    pub property: Option<String>,
    pub state: AliasState,
    pub outcome: Option<AliasOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub entries: Vec<RepairEntry>,
}

impl RepairReport {
    pub fn push(&mut self, entry: RepairEntry) {
        self.entries.push(entry);
    }

    pub fn count(&self, outcome: AliasOutcome) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == Some(outcome))
            .count()
    }

    /// Entries that needed (or need) a repair
    pub fn unresolved(&self) -> impl Iterator<Item = &RepairEntry> {
        self.entries.iter().filter(|entry| !entry.state.is_resolved())
    }

    /// Aliases that cannot be repaired
    pub fn reported(&self) -> impl Iterator<Item = &RepairEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == Some(AliasOutcome::Reported))
    }

    /// True when every alias resolves
    pub fn is_clean(&self) -> bool {
        self.unresolved().next().is_none()
    }
}

/// State of `alias` given the fx:ids declared before it, and the repair
/// that state calls for
pub fn classify(
    doc: &Document,
    policy: &ReferencePolicy,
    declared: &HashSet<String>,
    alias: Alias,
) -> (AliasState, Option<AliasOutcome>) {
    let source = alias.source(doc);
    let strength = policy.strength_of(doc, alias);

    if declared.contains(source) {
        let state = match strength {
            Strength::Strong => AliasState::ResolvedStrong,
            Strength::Weak => AliasState::ResolvedWeak,
            Strength::Group => AliasState::ResolvedGroup,
        };
        return (state, None);
    }

    let state = if doc.is_declared(source) {
        AliasState::UnresolvedForward
    } else {
        AliasState::Dangling
    };
    let outcome = match (strength, state) {
        (Strength::Strong, AliasState::UnresolvedForward) => AliasOutcome::Inlined,
        (Strength::Strong, _) => AliasOutcome::Reported,
        (Strength::Weak, _) => AliasOutcome::Deleted,
        (Strength::Group, _) => AliasOutcome::Retargeted,
    };
    (state, Some(outcome))
}

pub(crate) fn entry_for(
    doc: &Document,
    alias: Alias,
    state: AliasState,
    outcome: Option<AliasOutcome>,
) -> RepairEntry {
    RepairEntry {
        source: alias.source(doc).to_string(),
        kind: alias.kind(doc),
        property: alias.property_name(doc).map(str::to_string),
        state,
        outcome,
    }
}

/// Classify every alias of the document without changing anything
pub fn audit(doc: &Document, policy: &ReferencePolicy) -> RepairReport {
    let mut auditor = Auditor {
        policy,
        declared: HashSet::new(),
        report: RepairReport::default(),
    };
    if let Some(root) = doc.root() {
        auditor.visit_object(doc, root);
    }
    auditor.report
}

struct Auditor<'a> {
    policy: &'a ReferencePolicy,
    declared: HashSet<String>,
    report: RepairReport,
}

impl Auditor<'_> {
    fn check(&mut self, doc: &Document, alias: Alias) {
        let (state, outcome) = classify(doc, self.policy, &self.declared, alias);
        self.report.push(entry_for(doc, alias, state, outcome));
    }
}

impl Visitor for Auditor<'_> {
    fn visit_object(&mut self, doc: &Document, object: ObjectId) {
        if let Some(alias) = Alias::of_object(doc, object) {
            self.check(doc, alias);
        }
        if let Some(fx_id) = doc.object(object).fx_id() {
            self.declared.insert(fx_id.to_string());
        }
        walk_object(self, doc, object);
    }

    fn visit_value(&mut self, doc: &Document, property: PropertyId, _value: &str) {
        if let Some(alias) = Alias::of_property(doc, property) {
            self.check(doc, alias);
        }
    }
}
