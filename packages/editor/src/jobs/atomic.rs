//! Single-purpose reversible edits.
//!
//! Every primitive wraps its one mutation in an update bracket and keeps
//! just enough state (old value, old index, old sibling) to put things back.

use scenekit_model::{is_valid_fx_id, Document, Location, ObjectId, ParentSlot, PropertyId};

use crate::job::{Job, JobState};

fn is_detached(doc: &Document, object: ObjectId) -> bool {
    doc.object(object).parent().is_none() && doc.root() != Some(object)
}

/// Short name of an object for job descriptions
pub(crate) fn object_label(doc: &Document, object: ObjectId) -> String {
    let data = doc.object(object);
    match (data.fx_id(), data.class_name()) {
        (Some(fx_id), _) => fx_id.to_string(),
        (None, Some(class)) => class.to_string(),
        _ => object.to_string(),
    }
}

// Properties

#[derive(Debug)]
pub struct AddPropertyJob {
    property: PropertyId,
    owner: ObjectId,
    index: Option<usize>,
    state: JobState,
}

impl AddPropertyJob {
    /// Attach `property` to `owner` at `index` (`None` appends)
    pub fn new(property: PropertyId, owner: ObjectId, index: Option<usize>) -> Self {
        Self {
            property,
            owner,
            index,
            state: JobState::default(),
        }
    }
}

impl Job for AddPropertyJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let property = doc.property(self.property);
        let owner = doc.object(self.owner);
        property.owner().is_none()
            && owner.owns_properties()
            && doc.property_named(self.owner, property.name()).is_none()
            && self.index.map(|i| i <= owner.properties().len()).unwrap_or(true)
            && property
                .values()
                .iter()
                .all(|value| !doc.is_within(self.owner, *value))
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        doc.update(|doc| doc.add_property(self.owner, self.property, self.index));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.remove_property(self.property));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.add_property(self.owner, self.property, self.index));
    }

    fn description(&self) -> String {
        "Add property".to_string()
    }
}

#[derive(Debug)]
pub struct RemovePropertyJob {
    property: PropertyId,
    owner: Option<ObjectId>,
    index: usize,
    state: JobState,
}

impl RemovePropertyJob {
    pub fn new(property: PropertyId) -> Self {
        Self {
            property,
            owner: None,
            index: 0,
            state: JobState::default(),
        }
    }
}

impl Job for RemovePropertyJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.property(self.property).owner().is_some()
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.owner = doc.property(self.property).owner();
        self.index = doc.update(|doc| doc.remove_property(self.property));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        if let Some(owner) = self.owner {
            doc.update(|doc| doc.add_property(owner, self.property, Some(self.index)));
        }
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.remove_property(self.property));
    }

    fn description(&self) -> String {
        "Remove property".to_string()
    }
}

#[derive(Debug)]
pub struct ReplacePropertyJob {
    original: PropertyId,
    replacement: PropertyId,
    owner: Option<ObjectId>,
    index: usize,
    state: JobState,
}

impl ReplacePropertyJob {
    /// Put `replacement` in the slot `original` occupies
    pub fn new(original: PropertyId, replacement: PropertyId) -> Self {
        Self {
            original,
            replacement,
            owner: None,
            index: 0,
            state: JobState::default(),
        }
    }
}

impl Job for ReplacePropertyJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let Some(owner) = doc.property(self.original).owner() else {
            return false;
        };
        let replacement = doc.property(self.replacement);
        self.original != self.replacement
            && replacement.owner().is_none()
            && doc
                .property_named(owner, replacement.name())
                .map(|p| p == self.original)
                .unwrap_or(true)
            && replacement
                .values()
                .iter()
                .all(|value| !doc.is_within(owner, *value))
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let owner = doc.property(self.original).owner();
        self.owner = owner;
        self.index = doc.update(|doc| {
            let index = doc.remove_property(self.original);
            if let Some(owner) = owner {
                doc.add_property(owner, self.replacement, Some(index));
            }
            index
        });
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        if let Some(owner) = self.owner {
            doc.update(|doc| {
                doc.remove_property(self.replacement);
                doc.add_property(owner, self.original, Some(self.index));
            });
        }
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        if let Some(owner) = self.owner {
            doc.update(|doc| {
                doc.remove_property(self.original);
                doc.add_property(owner, self.replacement, Some(self.index));
            });
        }
    }

    fn description(&self) -> String {
        "Replace property".to_string()
    }
}

// Values and items

#[derive(Debug)]
pub struct AddPropertyValueJob {
    value: ObjectId,
    property: PropertyId,
    index: Option<usize>,
    state: JobState,
}

impl AddPropertyValueJob {
    pub fn new(value: ObjectId, property: PropertyId, index: Option<usize>) -> Self {
        Self {
            value,
            property,
            index,
            state: JobState::default(),
        }
    }
}

impl Job for AddPropertyValueJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let property = doc.property(self.property);
        is_detached(doc, self.value)
            && property.is_collection()
            && self.index.map(|i| i <= property.values().len()).unwrap_or(true)
            && property
                .owner()
                .map(|owner| !doc.is_within(owner, self.value))
                .unwrap_or(true)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        doc.update(|doc| doc.add_value(self.property, self.value, self.index));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.remove_value(self.value));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.add_value(self.property, self.value, self.index));
    }

    fn description(&self) -> String {
        "Add value".to_string()
    }
}

#[derive(Debug)]
pub struct RemovePropertyValueJob {
    value: ObjectId,
    property: Option<PropertyId>,
    index: usize,
    state: JobState,
}

impl RemovePropertyValueJob {
    pub fn new(value: ObjectId) -> Self {
        Self {
            value,
            property: None,
            index: 0,
            state: JobState::default(),
        }
    }
}

impl Job for RemovePropertyValueJob {
    fn is_executable(&self, doc: &Document) -> bool {
        matches!(doc.object(self.value).parent(), Some(ParentSlot::Property(_)))
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let (property, index) = doc.update(|doc| doc.remove_value(self.value));
        self.property = Some(property);
        self.index = index;
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        if let Some(property) = self.property {
            doc.update(|doc| doc.add_value(property, self.value, Some(self.index)));
        }
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.remove_value(self.value));
    }

    fn description(&self) -> String {
        "Remove value".to_string()
    }
}

#[derive(Debug)]
pub struct AddCollectionItemJob {
    item: ObjectId,
    collection: ObjectId,
    index: Option<usize>,
    state: JobState,
}

impl AddCollectionItemJob {
    pub fn new(item: ObjectId, collection: ObjectId, index: Option<usize>) -> Self {
        Self {
            item,
            collection,
            index,
            state: JobState::default(),
        }
    }
}

impl Job for AddCollectionItemJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let collection = doc.object(self.collection);
        is_detached(doc, self.item)
            && collection.is_collection()
            && self.index.map(|i| i <= collection.items().len()).unwrap_or(true)
            && !doc.is_within(self.collection, self.item)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        doc.update(|doc| doc.add_item(self.collection, self.item, self.index));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.remove_item(self.item));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.add_item(self.collection, self.item, self.index));
    }

    fn description(&self) -> String {
        "Add item".to_string()
    }
}

#[derive(Debug)]
pub struct RemoveCollectionItemJob {
    item: ObjectId,
    collection: Option<ObjectId>,
    index: usize,
    state: JobState,
}

impl RemoveCollectionItemJob {
    pub fn new(item: ObjectId) -> Self {
        Self {
            item,
            collection: None,
            index: 0,
            state: JobState::default(),
        }
    }
}

impl Job for RemoveCollectionItemJob {
    fn is_executable(&self, doc: &Document) -> bool {
        matches!(doc.object(self.item).parent(), Some(ParentSlot::Collection(_)))
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let (collection, index) = doc.update(|doc| doc.remove_item(self.item));
        self.collection = Some(collection);
        self.index = index;
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        if let Some(collection) = self.collection {
            doc.update(|doc| doc.add_item(collection, self.item, Some(self.index)));
        }
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.remove_item(self.item));
    }

    fn description(&self) -> String {
        "Remove item".to_string()
    }
}

/// Detach an object from whichever kind of parent holds it
#[derive(Debug)]
pub struct RemoveObjectJob {
    object: ObjectId,
    inner: Option<Box<dyn Job>>,
}

impl RemoveObjectJob {
    pub fn new(object: ObjectId) -> Self {
        Self {
            object,
            inner: None,
        }
    }
}

impl Job for RemoveObjectJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.object(self.object).parent().is_some()
    }

    fn execute(&mut self, doc: &mut Document) {
        assert!(self.inner.is_none(), "job executed twice");
        let mut inner: Box<dyn Job> = match doc.object(self.object).parent() {
            Some(ParentSlot::Property(_)) => Box::new(RemovePropertyValueJob::new(self.object)),
            Some(ParentSlot::Collection(_)) => Box::new(RemoveCollectionItemJob::new(self.object)),
            None => panic!("{} has no parent", self.object),
        };
        inner.execute(doc);
        self.inner = Some(inner);
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(inner) = &mut self.inner {
            inner.undo(doc);
        }
    }

    fn redo(&mut self, doc: &mut Document) {
        if let Some(inner) = &mut self.inner {
            inner.redo(doc);
        }
    }

    fn description(&self) -> String {
        "Remove object".to_string()
    }
}

/// Swap an attached object for a detached one, in the same slot
#[derive(Debug)]
pub struct ReplaceObjectJob {
    original: ObjectId,
    replacement: ObjectId,
    location: Option<Location>,
    state: JobState,
}

impl ReplaceObjectJob {
    pub fn new(original: ObjectId, replacement: ObjectId) -> Self {
        Self {
            original,
            replacement,
            location: None,
            state: JobState::default(),
        }
    }

    fn swap(doc: &mut Document, out: ObjectId, into: ObjectId, location: Location) {
        doc.update(|doc| {
            doc.detach(out);
            doc.attach(into, location);
        });
    }
}

impl Job for ReplaceObjectJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let Some(location) = doc.location_of(self.original) else {
            return false;
        };
        let container = match location {
            Location::Root => None,
            _ => doc.parent_object(self.original),
        };
        self.original != self.replacement
            && is_detached(doc, self.replacement)
            && container
                .map(|container| !doc.is_within(container, self.replacement))
                .unwrap_or(true)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let location = doc
            .location_of(self.original)
            .unwrap_or_else(|| panic!("{} is not attached", self.original));
        self.location = Some(location);
        Self::swap(doc, self.original, self.replacement, location);
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        if let Some(location) = self.location {
            Self::swap(doc, self.replacement, self.original, location);
        }
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        if let Some(location) = self.location {
            Self::swap(doc, self.original, self.replacement, location);
        }
    }

    fn description(&self) -> String {
        "Replace object".to_string()
    }
}

/// Move an object right before `sibling` (or to the end) in its parent list
#[derive(Debug)]
pub struct ReIndexObjectJob {
    object: ObjectId,
    before: Option<ObjectId>,
    old_next: Option<ObjectId>,
    state: JobState,
}

impl ReIndexObjectJob {
    pub fn new(object: ObjectId, before: Option<ObjectId>) -> Self {
        Self {
            object,
            before,
            old_next: None,
            state: JobState::default(),
        }
    }
}

impl Job for ReIndexObjectJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let Some(slot) = doc.object(self.object).parent() else {
            return false;
        };
        let sibling_ok = match self.before {
            Some(before) => before != self.object && doc.object(before).parent() == Some(slot),
            None => true,
        };
        sibling_ok && doc.next_sibling(self.object) != self.before
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.old_next = doc.next_sibling(self.object);
        doc.update(|doc| doc.move_before_sibling(self.object, self.before));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.move_before_sibling(self.object, self.old_next));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.move_before_sibling(self.object, self.before));
    }

    fn description(&self) -> String {
        "Move object".to_string()
    }
}

// Scalar modifications

#[derive(Debug)]
pub struct ModifyValueJob {
    property: PropertyId,
    value: String,
    old_value: String,
    state: JobState,
}

impl ModifyValueJob {
    pub fn new(property: PropertyId, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
            old_value: String::new(),
            state: JobState::default(),
        }
    }
}

impl Job for ModifyValueJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.property(self.property)
            .value()
            .map(|current| current != self.value)
            .unwrap_or(false)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.old_value = doc
            .property(self.property)
            .value()
            .unwrap_or_default()
            .to_string();
        doc.update(|doc| doc.set_value(self.property, self.value.clone()));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.set_value(self.property, self.old_value.clone()));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.set_value(self.property, self.value.clone()));
    }

    fn description(&self) -> String {
        format!("Set value to '{}'", self.value)
    }
}

/// Set or clear an fx:id. Refused when the new id is already declared or
/// could not be named by a `$id` expression.
#[derive(Debug)]
pub struct ModifyFxIdJob {
    object: ObjectId,
    fx_id: Option<String>,
    old_fx_id: Option<String>,
    state: JobState,
}

impl ModifyFxIdJob {
    pub fn new(object: ObjectId, fx_id: Option<String>) -> Self {
        Self {
            object,
            fx_id,
            old_fx_id: None,
            state: JobState::default(),
        }
    }
}

impl Job for ModifyFxIdJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let data = doc.object(self.object);
        if data.fx_id() == self.fx_id.as_deref() {
            return false;
        }
        match &self.fx_id {
            Some(fx_id) => {
                is_valid_fx_id(fx_id)
                    && (data.is_instance() || data.is_collection())
                    && !doc.is_declared(fx_id)
            }
            None => true,
        }
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.old_fx_id = doc.object(self.object).fx_id().map(str::to_string);
        doc.update(|doc| doc.set_fx_id(self.object, self.fx_id.clone()));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.set_fx_id(self.object, self.old_fx_id.clone()));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.set_fx_id(self.object, self.fx_id.clone()));
    }

    fn description(&self) -> String {
        match &self.fx_id {
            Some(fx_id) => format!("Set fx:id to '{}'", fx_id),
            None => "Clear fx:id".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ModifyControllerJob {
    object: ObjectId,
    controller: Option<String>,
    old_controller: Option<String>,
    state: JobState,
}

impl ModifyControllerJob {
    pub fn new(object: ObjectId, controller: Option<String>) -> Self {
        Self {
            object,
            controller,
            old_controller: None,
            state: JobState::default(),
        }
    }
}

impl Job for ModifyControllerJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let data = doc.object(self.object);
        data.is_instance() && data.controller() != self.controller.as_deref()
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.old_controller = doc.object(self.object).controller().map(str::to_string);
        doc.update(|doc| doc.set_controller(self.object, self.controller.clone()));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.set_controller(self.object, self.old_controller.clone()));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.set_controller(self.object, self.controller.clone()));
    }

    fn description(&self) -> String {
        "Set controller".to_string()
    }
}

/// Point an `fx:reference` / `fx:copy` at another fx:id
#[derive(Debug)]
pub struct ModifyIntrinsicSourceJob {
    object: ObjectId,
    source: String,
    old_source: String,
    state: JobState,
}

impl ModifyIntrinsicSourceJob {
    pub fn new(object: ObjectId, source: impl Into<String>) -> Self {
        Self {
            object,
            source: source.into(),
            old_source: String::new(),
            state: JobState::default(),
        }
    }
}

impl Job for ModifyIntrinsicSourceJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.object(self.object)
            .intrinsic()
            .map(|intrinsic| intrinsic.source() != self.source)
            .unwrap_or(false)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.old_source = doc
            .object(self.object)
            .intrinsic()
            .map(|intrinsic| intrinsic.source().to_string())
            .unwrap_or_default();
        doc.update(|doc| doc.set_intrinsic_source(self.object, self.source.clone()));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.set_intrinsic_source(self.object, self.old_source.clone()));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.set_intrinsic_source(self.object, self.source.clone()));
    }

    fn description(&self) -> String {
        format!("Retarget reference to '{}'", self.source)
    }
}

// Document level

/// Flip `fx:root` on the document root (self-inverse)
#[derive(Debug, Default)]
pub struct ToggleFxRootJob {
    root: Option<ObjectId>,
    state: JobState,
}

impl ToggleFxRootJob {
    pub fn new() -> Self {
        Self::default()
    }

    fn toggle(doc: &mut Document, root: ObjectId) {
        let current = doc.object(root).is_fx_root();
        doc.update(|doc| doc.set_fx_root(root, !current));
    }
}

impl Job for ToggleFxRootJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.root()
            .map(|root| doc.object(root).is_instance())
            .unwrap_or(false)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let root = doc.root().unwrap_or_else(|| panic!("document has no root"));
        self.root = Some(root);
        Self::toggle(doc, root);
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        if let Some(root) = self.root {
            Self::toggle(doc, root);
        }
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        if let Some(root) = self.root {
            Self::toggle(doc, root);
        }
    }

    fn description(&self) -> String {
        "Toggle fx:root".to_string()
    }
}

#[derive(Debug)]
pub struct SetDocumentRootJob {
    root: Option<ObjectId>,
    old_root: Option<ObjectId>,
    state: JobState,
}

impl SetDocumentRootJob {
    pub fn new(root: Option<ObjectId>) -> Self {
        Self {
            root,
            old_root: None,
            state: JobState::default(),
        }
    }
}

impl Job for SetDocumentRootJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.root() != self.root
            && self
                .root
                .map(|root| doc.object(root).parent().is_none())
                .unwrap_or(true)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.old_root = doc.root();
        doc.update(|doc| doc.set_root(self.root));
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.update(|doc| doc.set_root(self.old_root));
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.update(|doc| doc.set_root(self.root));
    }

    fn description(&self) -> String {
        match self.root {
            Some(_) => "Set document root".to_string(),
            None => "Clear document".to_string(),
        }
    }
}

/// Editor selection is not structure, but selection changes are undoable
#[derive(Debug)]
pub struct UpdateSelectionJob {
    selection: Vec<ObjectId>,
    old_selection: Vec<ObjectId>,
    state: JobState,
}

impl UpdateSelectionJob {
    pub fn new(selection: Vec<ObjectId>) -> Self {
        Self {
            selection,
            old_selection: Vec::new(),
            state: JobState::default(),
        }
    }
}

impl Job for UpdateSelectionJob {
    fn is_executable(&self, doc: &Document) -> bool {
        doc.selection() != self.selection.as_slice()
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        self.old_selection = doc.selection().to_vec();
        doc.set_selection(self.selection.clone());
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        doc.set_selection(self.old_selection.clone());
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        doc.set_selection(self.selection.clone());
    }

    fn description(&self) -> String {
        "Select".to_string()
    }
}
