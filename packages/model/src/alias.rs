//! By-id aliases: `fx:reference` / `fx:copy` intrinsics and `$id` expressions

use serde::Serialize;

use crate::graph::{Document, IntrinsicKind, ObjectId, ParentSlot, PropertyId};
use crate::visit::{walk_document, walk_object, Visitor};

/// Something in the graph that names another object by fx:id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "node", rename_all = "camelCase")]
pub enum Alias {
    /// An intrinsic object (reference or copy)
    Intrinsic(ObjectId),
    /// A value property holding `$id`
    Expression(PropertyId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasKind {
    Reference,
    Copy,
    Expression,
}

/// Identifier named by an expression value (`$id`), if it is one.
///
/// `${...}` bindings and `$$` escapes are not aliases.
pub fn expression_source(value: &str) -> Option<&str> {
    let source = value.strip_prefix('$')?;
    is_valid_fx_id(source).then_some(source)
}

/// Whether `fx_id` can be named by an expression: a letter or `_`, then
/// letters, digits or `_`
pub fn is_valid_fx_id(fx_id: &str) -> bool {
    let mut chars = fx_id.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Expression value naming `fx_id`
pub fn expression_for(fx_id: &str) -> String {
    format!("${}", fx_id)
}

impl Alias {
    /// Alias represented by `object`, if it is an intrinsic
    pub fn of_object(doc: &Document, object: ObjectId) -> Option<Alias> {
        doc.object(object).intrinsic().map(|_| Alias::Intrinsic(object))
    }

    /// Alias represented by `property`, if it holds an expression
    pub fn of_property(doc: &Document, property: PropertyId) -> Option<Alias> {
        doc.property(property)
            .value()
            .and_then(expression_source)
            .map(|_| Alias::Expression(property))
    }

    /// The fx:id this alias points to
    pub fn source<'a>(&self, doc: &'a Document) -> &'a str {
        match self {
            Alias::Intrinsic(object) => doc
                .object(*object)
                .intrinsic()
                .map(|i| i.source())
                .unwrap_or_default(),
            Alias::Expression(property) => doc
                .property(*property)
                .value()
                .and_then(expression_source)
                .unwrap_or_default(),
        }
    }

    pub fn kind(&self, doc: &Document) -> AliasKind {
        match self {
            Alias::Intrinsic(object) => match doc.object(*object).intrinsic().map(|i| i.kind) {
                Some(IntrinsicKind::Copy) => AliasKind::Copy,
                _ => AliasKind::Reference,
            },
            Alias::Expression(_) => AliasKind::Expression,
        }
    }

    /// Name of the property the alias fills.
    ///
    /// For intrinsics nested in collections this is the nearest enclosing
    /// property.
    pub fn property_name<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        match self {
            Alias::Expression(property) => Some(doc.property(*property).name()),
            Alias::Intrinsic(object) => {
                let mut current = *object;
                loop {
                    match doc.object(current).parent()? {
                        ParentSlot::Property(property) => {
                            return Some(doc.property(property).name())
                        }
                        ParentSlot::Collection(collection) => current = collection,
                    }
                }
            }
        }
    }

    /// Object whose position stands for the alias in document order
    pub fn anchor(&self, doc: &Document) -> Option<ObjectId> {
        match self {
            Alias::Intrinsic(object) => Some(*object),
            Alias::Expression(property) => doc.property(*property).owner(),
        }
    }

    pub fn is_attached(&self, doc: &Document) -> bool {
        self.anchor(doc)
            .map(|anchor| doc.is_attached(anchor))
            .unwrap_or(false)
    }

    /// True when the alias lives in `subtree` (the subtree root included)
    pub fn is_within(&self, doc: &Document, subtree: ObjectId) -> bool {
        self.anchor(doc)
            .map(|anchor| doc.is_within(anchor, subtree))
            .unwrap_or(false)
    }
}

struct AliasCollector<'a> {
    fx_id: Option<&'a str>,
    found: Vec<Alias>,
}

impl AliasCollector<'_> {
    fn offer(&mut self, doc: &Document, alias: Alias) {
        if self.fx_id.map(|id| alias.source(doc) == id).unwrap_or(true) {
            self.found.push(alias);
        }
    }
}

impl Visitor for AliasCollector<'_> {
    fn visit_object(&mut self, doc: &Document, object: ObjectId) {
        if let Some(alias) = Alias::of_object(doc, object) {
            self.offer(doc, alias);
        }
        walk_object(self, doc, object);
    }

    fn visit_value(&mut self, doc: &Document, property: PropertyId, value: &str) {
        if expression_source(value).is_some() {
            self.offer(doc, Alias::Expression(property));
        }
    }
}

impl Document {
    /// Reachable aliases in document order, optionally only those naming `fx_id`
    pub fn collect_aliases(&self, fx_id: Option<&str>) -> Vec<Alias> {
        let mut collector = AliasCollector {
            fx_id,
            found: Vec::new(),
        };
        walk_document(&mut collector, self);
        collector.found
    }

    /// Aliases inside the subtree of `object`, optionally only those naming `fx_id`
    pub fn collect_aliases_in(&self, object: ObjectId, fx_id: Option<&str>) -> Vec<Alias> {
        let mut collector = AliasCollector {
            fx_id,
            found: Vec::new(),
        };
        collector.visit_object(self, object);
        collector.found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_source() {
        assert_eq!(expression_source("$group1"), Some("group1"));
        assert_eq!(expression_source("$_x2"), Some("_x2"));
        assert_eq!(expression_source("${a.b}"), None);
        assert_eq!(expression_source("$$"), None);
        assert_eq!(expression_source("$"), None);
        assert_eq!(expression_source("plain"), None);
        assert_eq!(expression_for("x"), "$x");
    }

    #[test]
    fn test_valid_fx_ids() {
        assert!(is_valid_fx_id("okButton"));
        assert!(is_valid_fx_id("_1"));
        assert!(!is_valid_fx_id(""));
        assert!(!is_valid_fx_id("main-icon"));
        assert!(!is_valid_fx_id("1st"));
        // whatever passes is recognised when written back as an expression
        assert_eq!(expression_source(&expression_for("okButton")), Some("okButton"));
    }

    #[test]
    fn test_collect_aliases_in_document_order() {
        let mut doc = Document::new();
        let root = doc.new_instance("VBox");
        let children = doc.new_collection_property("children");
        let label = doc.new_instance("Label");
        let label_for = doc.new_value_property("labelFor", "$field");
        let wrapper = doc.new_collection_property("clip");
        let list = doc.new_collection();
        let reference = doc.new_intrinsic(IntrinsicKind::Reference, "field");
        let copy = doc.new_intrinsic(IntrinsicKind::Copy, "other");

        doc.add_property(root, children, None);
        doc.add_value(children, label, None);
        doc.add_property(label, label_for, None);
        doc.add_value(children, copy, None);
        doc.add_property(root, wrapper, Some(0));
        doc.add_value(wrapper, list, None);
        doc.add_item(list, reference, None);
        doc.init_root(root);

        let all = doc.collect_aliases(None);
        assert_eq!(
            all,
            vec![
                Alias::Intrinsic(reference),
                Alias::Expression(label_for),
                Alias::Intrinsic(copy)
            ]
        );

        let field = doc.collect_aliases(Some("field"));
        assert_eq!(field.len(), 2);
        assert_eq!(field[0].property_name(&doc), Some("clip"));
        assert_eq!(field[1].property_name(&doc), Some("labelFor"));
        assert_eq!(field[1].anchor(&doc), Some(label));
        assert_eq!(Alias::Intrinsic(copy).kind(&doc), AliasKind::Copy);
        assert_eq!(doc.collect_aliases_in(label, None), vec![Alias::Expression(label_for)]);
    }
}
