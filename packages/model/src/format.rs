//! JSON tree form of a document.
//!
//! The markup serializer lives outside the editing core; this form is the
//! minimal text representation the core reads and writes (tests, CLI).

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::graph::{Document, IntrinsicKind, ObjectId, ObjectKind, PropertyId, PropertyKind};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeSpec {
    Instance {
        class: String,
        #[serde(rename = "fxId", default, skip_serializing_if = "Option::is_none")]
        fx_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        controller: Option<String>,
        #[serde(rename = "fxRoot", default, skip_serializing_if = "is_false")]
        fx_root: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        properties: Vec<PropertySpec>,
    },
    Collection {
        #[serde(rename = "fxId", default, skip_serializing_if = "Option::is_none")]
        fx_id: Option<String>,
        #[serde(default)]
        items: Vec<NodeSpec>,
    },
    Reference {
        source: String,
    },
    Copy {
        source: String,
    },
    Virtual {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        properties: Vec<PropertySpec>,
    },
}

/// A named property holding either a text `value` or child `values`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<NodeSpec>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl PropertySpec {
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            values: None,
        }
    }

    pub fn values(name: impl Into<String>, values: Vec<NodeSpec>) -> Self {
        Self {
            name: name.into(),
            value: None,
            values: Some(values),
        }
    }
}

impl NodeSpec {
    pub fn instance(class: impl Into<String>) -> Self {
        NodeSpec::Instance {
            class: class.into(),
            fx_id: None,
            controller: None,
            fx_root: false,
            properties: Vec::new(),
        }
    }

    pub fn reference(source: impl Into<String>) -> Self {
        NodeSpec::Reference {
            source: source.into(),
        }
    }

    pub fn copy(source: impl Into<String>) -> Self {
        NodeSpec::Copy {
            source: source.into(),
        }
    }

    /// Builder: set the fx:id of an instance or collection
    pub fn with_fx_id(mut self, id: impl Into<String>) -> Self {
        match &mut self {
            NodeSpec::Instance { fx_id, .. } | NodeSpec::Collection { fx_id, .. } => {
                *fx_id = Some(id.into())
            }
            _ => {}
        }
        self
    }

    /// Builder: append a property to an instance or virtual node
    pub fn with_property(mut self, property: PropertySpec) -> Self {
        match &mut self {
            NodeSpec::Instance { properties, .. } | NodeSpec::Virtual { properties } => {
                properties.push(property)
            }
            _ => {}
        }
        self
    }

    pub fn with_value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_property(PropertySpec::value(name, value))
    }

    pub fn with_values(self, name: impl Into<String>, values: Vec<NodeSpec>) -> Self {
        self.with_property(PropertySpec::values(name, values))
    }
}

impl Document {
    /// Build a document from its tree form. Duplicate fx:ids are rejected.
    pub fn from_spec(spec: &DocumentSpec) -> ModelResult<Self> {
        let mut doc = Document::new();
        if let Some(root) = &spec.root {
            let root = doc.build_node(root)?;
            doc.init_root(root);
        }

        if let Some(fx_id) = doc.duplicate_fx_ids().into_iter().next() {
            return Err(ModelError::duplicate_fx_id(fx_id));
        }
        doc.reset_revision();
        Ok(doc)
    }

    pub fn from_json(source: &str) -> ModelResult<Self> {
        let spec: DocumentSpec = serde_json::from_str(source)?;
        Self::from_spec(&spec)
    }

    fn build_node(&mut self, spec: &NodeSpec) -> ModelResult<ObjectId> {
        let object = match spec {
            NodeSpec::Instance {
                class,
                fx_id,
                controller,
                fx_root,
                properties,
            } => {
                let object = self.new_instance(class.clone());
                self.set_fx_id(object, fx_id.clone());
                self.set_controller(object, controller.clone());
                self.set_fx_root(object, *fx_root);
                self.build_properties(object, properties)?;
                object
            }
            NodeSpec::Collection { fx_id, items } => {
                let object = self.new_collection();
                self.set_fx_id(object, fx_id.clone());
                for item in items {
                    let item = self.build_node(item)?;
                    self.add_item(object, item, None);
                }
                object
            }
            NodeSpec::Reference { source } => self.new_intrinsic(IntrinsicKind::Reference, source.clone()),
            NodeSpec::Copy { source } => self.new_intrinsic(IntrinsicKind::Copy, source.clone()),
            NodeSpec::Virtual { properties } => {
                let object = self.new_virtual();
                self.build_properties(object, properties)?;
                object
            }
        };
        Ok(object)
    }

    fn build_properties(&mut self, owner: ObjectId, properties: &[PropertySpec]) -> ModelResult<()> {
        for spec in properties {
            if self.property_named(owner, &spec.name).is_some() {
                return Err(ModelError::DuplicateProperty(spec.name.clone()));
            }
            let property = match (&spec.value, &spec.values) {
                (Some(value), None) => self.new_value_property(spec.name.clone(), value.clone()),
                (None, Some(values)) => {
                    let property = self.new_collection_property(spec.name.clone());
                    for value in values {
                        let value = self.build_node(value)?;
                        self.add_value(property, value, None);
                    }
                    property
                }
                _ => return Err(ModelError::invalid_property(spec.name.as_str())),
            };
            self.add_property(owner, property, None);
        }
        Ok(())
    }

    /// Tree form of the reachable graph
    pub fn to_spec(&self) -> DocumentSpec {
        DocumentSpec {
            root: self.root().map(|root| self.node_spec(root)),
        }
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_spec())?)
    }

    /// Tree form of the subtree of `object`
    pub fn node_spec(&self, object: ObjectId) -> NodeSpec {
        let data = self.object(object);
        let fx_id = data.fx_id().map(str::to_string);
        match data.kind() {
            ObjectKind::Instance(instance) => NodeSpec::Instance {
                class: instance.class_name.clone(),
                fx_id,
                controller: instance.controller.clone(),
                fx_root: instance.fx_root,
                properties: self.property_specs(data.properties()),
            },
            ObjectKind::Collection(collection) => NodeSpec::Collection {
                fx_id,
                items: collection.items.iter().map(|o| self.node_spec(*o)).collect(),
            },
            ObjectKind::Intrinsic(intrinsic) => match intrinsic.kind {
                IntrinsicKind::Reference => NodeSpec::reference(intrinsic.source()),
                IntrinsicKind::Copy => NodeSpec::copy(intrinsic.source()),
            },
            ObjectKind::Virtual(_) => NodeSpec::Virtual {
                properties: self.property_specs(data.properties()),
            },
        }
    }

    fn property_specs(&self, properties: &[PropertyId]) -> Vec<PropertySpec> {
        properties
            .iter()
            .map(|p| {
                let data = self.property(*p);
                match data.kind() {
                    PropertyKind::Value(value) => PropertySpec::value(data.name(), value.clone()),
                    PropertyKind::Collection(values) => PropertySpec::values(
                        data.name(),
                        values.iter().map(|o| self.node_spec(*o)).collect(),
                    ),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"{
        "root": {
            "type": "instance",
            "class": "VBox",
            "fxId": "box",
            "controller": "app.Controller",
            "properties": [
                { "name": "spacing", "value": "4" },
                { "name": "children", "values": [
                    { "type": "instance", "class": "Label", "properties": [
                        { "name": "labelFor", "value": "$name" }
                    ]},
                    { "type": "instance", "class": "TextField", "fxId": "name" },
                    { "type": "reference", "source": "name" }
                ]}
            ]
        }
    }"#;

    #[test]
    fn test_load_tree_form() {
        let doc = Document::from_json(FORM).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.object(root).class_name(), Some("VBox"));
        assert_eq!(doc.object(root).controller(), Some("app.Controller"));
        assert_eq!(doc.value_of(root, "spacing"), Some("4"));
        assert_eq!(doc.children_of(root).len(), 3);
        assert!(doc.search_with_fx_id("name").is_some());
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_tree_form_roundtrip() {
        let doc = Document::from_json(FORM).unwrap();
        let reloaded = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(doc.to_spec(), reloaded.to_spec());
    }

    #[test]
    fn test_duplicate_fx_id_rejected() {
        let spec = DocumentSpec {
            root: Some(NodeSpec::instance("HBox").with_values(
                "children",
                vec![
                    NodeSpec::instance("Button").with_fx_id("b"),
                    NodeSpec::instance("Button").with_fx_id("b"),
                ],
            )),
        };
        assert!(matches!(
            Document::from_spec(&spec),
            Err(ModelError::DuplicateFxId(id)) if id == "b"
        ));
    }

    #[test]
    fn test_property_needs_exactly_one_payload() {
        let json = r#"{ "root": { "type": "instance", "class": "Pane",
            "properties": [ { "name": "broken" } ] } }"#;
        assert!(matches!(
            Document::from_json(json),
            Err(ModelError::InvalidProperty(name)) if name == "broken"
        ));
    }
}
