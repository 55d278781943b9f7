//! Comparable picture of the reachable graph.
//!
//! Handles are part of the picture: undo must put back the very same nodes,
//! not look-alikes, so two snapshots are equal only when the same objects sit
//! in the same places.

use serde::Serialize;

use crate::graph::{Document, IntrinsicKind, ObjectId, ObjectKind, PropertyId, PropertyKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub root: Option<ObjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub kind: SnapshotKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_id: Option<String>,
    pub properties: Vec<PropertySnapshot>,
    pub items: Vec<ObjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SnapshotKind {
    Instance {
        class: String,
        controller: Option<String>,
        fx_root: bool,
    },
    Collection,
    Intrinsic {
        kind: IntrinsicKind,
        source: String,
    },
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySnapshot {
    pub id: PropertyId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub values: Vec<ObjectSnapshot>,
}

impl Document {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            root: self.root().map(|root| self.object_snapshot(root)),
        }
    }

    fn object_snapshot(&self, object: ObjectId) -> ObjectSnapshot {
        let data = self.object(object);
        let kind = match data.kind() {
            ObjectKind::Instance(instance) => SnapshotKind::Instance {
                class: instance.class_name.clone(),
                controller: instance.controller.clone(),
                fx_root: instance.fx_root,
            },
            ObjectKind::Collection(_) => SnapshotKind::Collection,
            ObjectKind::Intrinsic(intrinsic) => SnapshotKind::Intrinsic {
                kind: intrinsic.kind,
                source: intrinsic.source().to_string(),
            },
            ObjectKind::Virtual(_) => SnapshotKind::Virtual,
        };

        ObjectSnapshot {
            id: object,
            kind,
            fx_id: data.fx_id().map(str::to_string),
            properties: data
                .properties()
                .iter()
                .map(|p| self.property_snapshot(*p))
                .collect(),
            items: data.items().iter().map(|o| self.object_snapshot(*o)).collect(),
        }
    }

    fn property_snapshot(&self, property: PropertyId) -> PropertySnapshot {
        let data = self.property(property);
        let (value, values) = match data.kind() {
            PropertyKind::Value(value) => (Some(value.clone()), Vec::new()),
            PropertyKind::Collection(values) => (
                None,
                values.iter().map(|o| self.object_snapshot(*o)).collect(),
            ),
        };
        PropertySnapshot {
            id: property,
            name: data.name().to_string(),
            value,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_tracks_identity_not_just_shape() {
        let mut doc = Document::new();
        let root = doc.new_instance("HBox");
        let children = doc.new_collection_property("children");
        let a = doc.new_instance("Button");
        doc.add_property(root, children, None);
        doc.add_value(children, a, None);
        doc.init_root(root);
        let before = doc.snapshot();
        let shape = doc.to_spec();

        let b = doc.new_instance("Button");
        doc.update(|doc| {
            doc.remove_value(a);
            doc.add_value(children, b, None);
        });
        let after = doc.snapshot();
        // same shape, different node
        assert_ne!(before, after);
        assert_eq!(doc.to_spec(), shape);

        doc.update(|doc| {
            doc.remove_value(b);
            doc.add_value(children, a, None);
        });
        assert_eq!(doc.snapshot(), before);
    }
}
