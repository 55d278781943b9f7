use std::collections::HashMap;

use crate::alias::{expression_for, expression_source};
use crate::fx_id::FxIdGenerator;
use crate::graph::{Document, ObjectId, ObjectKind, PropertyId, PropertyKind};

impl Document {
    /// Deep-copy the subtree of `object` into fresh detached nodes.
    ///
    /// Declared fx:ids in the copy are renamed through `ids` so the copy can
    /// live next to the original; aliases inside the copy that named one of
    /// the renamed ids follow the rename.
    pub fn clone_subtree(&mut self, object: ObjectId, ids: &mut FxIdGenerator) -> ObjectId {
        let mut renames = HashMap::new();
        let copy = self.copy_object(object, ids, &mut renames);
        if !renames.is_empty() {
            self.retarget_aliases(copy, &renames);
        }
        copy
    }

    fn copy_object(
        &mut self,
        object: ObjectId,
        ids: &mut FxIdGenerator,
        renames: &mut HashMap<String, String>,
    ) -> ObjectId {
        let data = self.object(object).clone();
        let copy = match &data.kind {
            ObjectKind::Instance(instance) => {
                let copy = self.new_instance(instance.class_name.clone());
                if let Some(controller) = &instance.controller {
                    self.set_controller(copy, Some(controller.clone()));
                }
                self.set_fx_root(copy, instance.fx_root);
                copy
            }
            ObjectKind::Collection(_) => self.new_collection(),
            ObjectKind::Intrinsic(intrinsic) => {
                self.new_intrinsic(intrinsic.kind, intrinsic.source.clone())
            }
            ObjectKind::Virtual(_) => self.new_virtual(),
        };

        if let Some(fx_id) = data.fx_id() {
            let renamed = ids.new_id(fx_id);
            renames.insert(fx_id.to_string(), renamed.clone());
            self.set_fx_id(copy, Some(renamed));
        }

        for property in data.properties() {
            let property_copy = self.copy_property(*property, ids, renames);
            self.add_property(copy, property_copy, None);
        }
        for item in data.items() {
            let item_copy = self.copy_object(*item, ids, renames);
            self.add_item(copy, item_copy, None);
        }
        copy
    }

    fn copy_property(
        &mut self,
        property: PropertyId,
        ids: &mut FxIdGenerator,
        renames: &mut HashMap<String, String>,
    ) -> PropertyId {
        let data = self.property(property).clone();
        match &data.kind {
            PropertyKind::Value(value) => self.new_value_property(data.name.clone(), value.clone()),
            PropertyKind::Collection(values) => {
                let copy = self.new_collection_property(data.name.clone());
                for value in values {
                    let value_copy = self.copy_object(*value, ids, renames);
                    self.add_value(copy, value_copy, None);
                }
                copy
            }
        }
    }

    fn retarget_aliases(&mut self, copy: ObjectId, renames: &HashMap<String, String>) {
        for object in self.subtree_order(copy) {
            let source = self.object(object).intrinsic().map(|i| i.source().to_string());
            if let Some(renamed) = source.and_then(|s| renames.get(&s)) {
                self.set_intrinsic_source(object, renamed.clone());
            }

            for property in self.object(object).properties().to_vec() {
                let renamed = self
                    .property(property)
                    .value()
                    .and_then(expression_source)
                    .and_then(|source| renames.get(source))
                    .map(|renamed| expression_for(renamed));
                if let Some(value) = renamed {
                    self.set_value(property, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::IntrinsicKind;

    #[test]
    fn test_clone_renames_ids_and_internal_aliases() {
        let mut doc = Document::new();
        let root = doc.new_instance("VBox");
        let children = doc.new_collection_property("children");
        let group = doc.new_instance("TitledPane");
        let content = doc.new_collection_property("content");
        let field = doc.new_instance("TextField");
        let label = doc.new_instance("Label");
        let label_for = doc.new_value_property("labelFor", "$field");
        let outside = doc.new_intrinsic(IntrinsicKind::Reference, "root");

        doc.set_fx_id(root, Some("root".into()));
        doc.set_fx_id(group, Some("group".into()));
        doc.set_fx_id(field, Some("field".into()));
        doc.add_property(root, children, None);
        doc.add_value(children, group, None);
        doc.add_property(group, content, None);
        doc.add_value(content, field, None);
        doc.add_value(content, label, None);
        doc.add_value(content, outside, None);
        doc.add_property(label, label_for, None);
        doc.init_root(root);

        let mut ids = FxIdGenerator::new(&doc);
        let copy = doc.clone_subtree(group, &mut ids);

        assert!(!doc.is_attached(copy));
        assert_eq!(doc.object(copy).fx_id(), Some("group1"));
        let copied = doc.children_of(copy);
        assert_eq!(copied.len(), 3);
        assert_eq!(doc.object(copied[0]).fx_id(), Some("field1"));
        assert_eq!(doc.value_of(copied[1], "labelFor"), Some("$field1"));
        assert_eq!(doc.object(copied[2]).intrinsic().map(|i| i.source()), Some("root"));

        // the original is untouched
        assert_eq!(doc.value_of(label, "labelFor"), Some("$field"));
        assert_eq!(doc.revision(), 0);
    }
}
