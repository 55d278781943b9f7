//! Read-only graph queries used by jobs and by inspection panels

use std::collections::BTreeMap;

use crate::graph::{Document, ObjectId, ParentSlot, PropertyId};
use crate::visit::{walk_document, walk_object, OrderCollector, Visitor};

impl Document {
    /// Property of `object` named `name`, if any
    pub fn property_named(&self, object: ObjectId, name: &str) -> Option<PropertyId> {
        self.object(object)
            .properties()
            .iter()
            .copied()
            .find(|p| self.property(*p).name() == name)
    }

    /// Value of the value property `name` on `object`
    pub fn value_of(&self, object: ObjectId, name: &str) -> Option<&str> {
        self.property_named(object, name)
            .and_then(|p| self.property(p).value())
    }

    /// Index of `property` among its owner's slots
    pub fn property_index(&self, property: PropertyId) -> Option<usize> {
        let owner = self.property(property).owner()?;
        self.object(owner)
            .properties()
            .iter()
            .position(|p| *p == property)
    }

    /// The list `object` is part of (values of its property or items of its collection)
    pub fn siblings(&self, object: ObjectId) -> &[ObjectId] {
        match self.object(object).parent() {
            Some(ParentSlot::Property(property)) => self.property(property).values(),
            Some(ParentSlot::Collection(collection)) => self.object(collection).items(),
            None => &[],
        }
    }

    pub fn parent_slot(&self, object: ObjectId) -> Option<ParentSlot> {
        self.object(object).parent()
    }

    pub fn index_in_parent(&self, object: ObjectId) -> Option<usize> {
        self.object(object).parent()?;
        self.siblings(object).iter().position(|o| *o == object)
    }

    pub fn next_sibling(&self, object: ObjectId) -> Option<ObjectId> {
        let index = self.index_in_parent(object)?;
        self.siblings(object).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, object: ObjectId) -> Option<ObjectId> {
        let index = self.index_in_parent(object)?;
        index
            .checked_sub(1)
            .and_then(|i| self.siblings(object).get(i).copied())
    }

    /// Direct children of `object`, in document order
    pub fn children_of(&self, object: ObjectId) -> Vec<ObjectId> {
        let data = self.object(object);
        let mut children: Vec<ObjectId> = data
            .properties()
            .iter()
            .flat_map(|p| self.property(*p).values().iter().copied())
            .collect();
        children.extend_from_slice(data.items());
        children
    }

    /// Owning objects of `object`, nearest first
    pub fn ancestors(&self, object: ObjectId) -> Vec<ObjectId> {
        let mut result = Vec::new();
        let mut current = object;
        while let Some(parent) = self.parent_object(current) {
            result.push(parent);
            current = parent;
        }
        result
    }

    /// True when `object` sits strictly below `ancestor`
    pub fn is_descendant_of(&self, object: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = object;
        while let Some(parent) = self.parent_object(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// `object` itself or one of its descendants
    pub fn is_within(&self, object: ObjectId, subtree: ObjectId) -> bool {
        object == subtree || self.is_descendant_of(object, subtree)
    }

    /// All reachable objects, in document order
    pub fn document_order(&self) -> Vec<ObjectId> {
        let mut collector = OrderCollector::default();
        walk_document(&mut collector, self);
        collector.objects
    }

    /// `object` and its descendants, in document order
    pub fn subtree_order(&self, object: ObjectId) -> Vec<ObjectId> {
        let mut collector = OrderCollector::default();
        collector.visit_object(self, object);
        collector.objects
    }

    /// First reachable object declaring `fx_id`, in document order
    pub fn search_with_fx_id(&self, fx_id: &str) -> Option<ObjectId> {
        let mut search = FxIdSearch {
            fx_id,
            first_only: true,
            found: Vec::new(),
        };
        walk_document(&mut search, self);
        search.found.into_iter().next()
    }

    /// Every reachable object declaring `fx_id`, in document order
    pub fn search_all_with_fx_id(&self, fx_id: &str) -> Vec<ObjectId> {
        let mut search = FxIdSearch {
            fx_id,
            first_only: false,
            found: Vec::new(),
        };
        walk_document(&mut search, self);
        search.found
    }

    /// Declared fx:ids of the reachable graph, with their declaring objects
    pub fn collect_fx_ids(&self) -> BTreeMap<String, Vec<ObjectId>> {
        let mut ids: BTreeMap<String, Vec<ObjectId>> = BTreeMap::new();
        for object in self.document_order() {
            if let Some(fx_id) = self.object(object).fx_id() {
                ids.entry(fx_id.to_string()).or_default().push(object);
            }
        }
        ids
    }

    /// fx:ids declared more than once in the reachable graph
    pub fn duplicate_fx_ids(&self) -> Vec<String> {
        self.collect_fx_ids()
            .into_iter()
            .filter(|(_, objects)| objects.len() > 1)
            .map(|(fx_id, _)| fx_id)
            .collect()
    }

    pub fn is_declared(&self, fx_id: &str) -> bool {
        self.search_with_fx_id(fx_id).is_some()
    }
}

struct FxIdSearch<'a> {
    fx_id: &'a str,
    first_only: bool,
    found: Vec<ObjectId>,
}

impl Visitor for FxIdSearch<'_> {
    fn visit_object(&mut self, doc: &Document, object: ObjectId) {
        if self.first_only && !self.found.is_empty() {
            return;
        }
        if doc.object(object).fx_id() == Some(self.fx_id) {
            self.found.push(object);
        }
        walk_object(self, doc, object);
    }
}
