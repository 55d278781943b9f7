use std::collections::{BTreeMap, BTreeSet};

use scenekit_model::{Alias, AliasKind, Document};
use serde::{Deserialize, Serialize};

/// How much an alias cares about its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strength {
    /// Target must exist and is inlined when declared too late
    Strong,
    /// Annotation only; dropped when it cannot resolve
    Weak,
    /// Shared membership (toggle groups); the first alias hosts the group
    Group,
}

/// Which properties hold weak or group aliases.
///
/// This is metadata about the component model surrounding the document,
/// so it is loaded from configuration rather than hard-wired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferencePolicy {
    pub weak_properties: BTreeSet<String>,

    /// Group property name → class of the standalone group object
    pub group_properties: BTreeMap<String, String>,
}

impl Default for ReferencePolicy {
    fn default() -> Self {
        Self {
            weak_properties: ["labelFor", "expandedPane"]
                .into_iter()
                .map(String::from)
                .collect(),
            group_properties: [("toggleGroup".to_string(), "ToggleGroup".to_string())]
                .into_iter()
                .collect(),
        }
    }
}

impl ReferencePolicy {
    pub fn strength_of(&self, doc: &Document, alias: Alias) -> Strength {
        if alias.kind(doc) == AliasKind::Copy {
            return Strength::Strong;
        }
        match alias.property_name(doc) {
            Some(name) if self.weak_properties.contains(name) => Strength::Weak,
            Some(name) if self.group_properties.contains_key(name) => Strength::Group,
            _ => Strength::Strong,
        }
    }

    /// Class used for a standalone group object filling `property`
    pub fn group_class(&self, property: &str) -> Option<&str> {
        self.group_properties.get(property).map(String::as_str)
    }
}
