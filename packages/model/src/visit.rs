use crate::graph::{Document, ObjectId, PropertyId, PropertyKind};

/// Visitor pattern for walking the graph in document order
///
/// Default implementations walk the entire subtree: an object, then each of
/// its properties in slot order, then each property value or collection item
/// in index order. Override specific visit_* methods to act on nodes.
pub trait Visitor: Sized {
    fn visit_object(&mut self, doc: &Document, object: ObjectId) {
        walk_object(self, doc, object);
    }

    fn visit_property(&mut self, doc: &Document, property: PropertyId) {
        walk_property(self, doc, property);
    }

    fn visit_value(&mut self, _doc: &Document, _property: PropertyId, _value: &str) {
        // Leaf, nothing to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    if let Some(root) = doc.root() {
        visitor.visit_object(doc, root);
    }
}

pub fn walk_object<V: Visitor>(visitor: &mut V, doc: &Document, object: ObjectId) {
    let data = doc.object(object);
    for property in data.properties() {
        visitor.visit_property(doc, *property);
    }
    for item in data.items() {
        visitor.visit_object(doc, *item);
    }
}

pub fn walk_property<V: Visitor>(visitor: &mut V, doc: &Document, property: PropertyId) {
    match doc.property(property).kind() {
        PropertyKind::Value(value) => visitor.visit_value(doc, property, value),
        PropertyKind::Collection(values) => {
            for value in values {
                visitor.visit_object(doc, *value);
            }
        }
    }
}

/// Collects objects in document order
#[derive(Debug, Default)]
pub struct OrderCollector {
    pub objects: Vec<ObjectId>,
}

impl Visitor for OrderCollector {
    fn visit_object(&mut self, doc: &Document, object: ObjectId) {
        self.objects.push(object);
        walk_object(self, doc, object);
    }
}
