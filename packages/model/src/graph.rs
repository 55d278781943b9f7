use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Handle to an object stored in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

/// Handle to a property stored in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(u32);

impl ObjectId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl PropertyId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Kind of an intrinsic placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntrinsicKind {
    /// Live reference to the object declaring `source` (`fx:reference`)
    Reference,
    /// Copy of the object declaring `source` (`fx:copy`)
    Copy,
}

/// Where an object hangs in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentSlot {
    Property(PropertyId),
    Collection(ObjectId),
}

/// Exact position of an attached object, enough to put it back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Location {
    Root,
    Property { property: PropertyId, index: usize },
    Collection { collection: ObjectId, index: usize },
}

#[derive(Debug, Clone)]
pub struct Instance {
    pub class_name: String,
    pub(crate) properties: Vec<PropertyId>,
    pub(crate) controller: Option<String>,
    pub(crate) fx_root: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub(crate) items: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct Intrinsic {
    pub kind: IntrinsicKind,
    pub(crate) source: String,
}

impl Intrinsic {
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Structural-only node: owns properties, has no class
#[derive(Debug, Clone, Default)]
pub struct Virtual {
    pub(crate) properties: Vec<PropertyId>,
}

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Instance(Instance),
    Collection(Collection),
    Intrinsic(Intrinsic),
    Virtual(Virtual),
}

#[derive(Debug, Clone)]
pub struct ObjectData {
    pub(crate) kind: ObjectKind,
    pub(crate) fx_id: Option<String>,
    pub(crate) parent: Option<ParentSlot>,
}

impl ObjectData {
    fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            fx_id: None,
            parent: None,
        }
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn fx_id(&self) -> Option<&str> {
        self.fx_id.as_deref()
    }

    pub fn parent(&self) -> Option<ParentSlot> {
        self.parent
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.kind, ObjectKind::Instance(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, ObjectKind::Collection(_))
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, ObjectKind::Virtual(_))
    }

    /// Instances and virtual nodes can own named properties
    pub fn owns_properties(&self) -> bool {
        matches!(self.kind, ObjectKind::Instance(_) | ObjectKind::Virtual(_))
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Instance(instance) => Some(&instance.class_name),
            _ => None,
        }
    }

    pub fn controller(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Instance(instance) => instance.controller.as_deref(),
            _ => None,
        }
    }

    pub fn is_fx_root(&self) -> bool {
        match &self.kind {
            ObjectKind::Instance(instance) => instance.fx_root,
            _ => false,
        }
    }

    pub fn intrinsic(&self) -> Option<&Intrinsic> {
        match &self.kind {
            ObjectKind::Intrinsic(intrinsic) => Some(intrinsic),
            _ => None,
        }
    }

    /// Named properties, in slot order (empty for collections and intrinsics)
    pub fn properties(&self) -> &[PropertyId] {
        match &self.kind {
            ObjectKind::Instance(instance) => &instance.properties,
            ObjectKind::Virtual(node) => &node.properties,
            _ => &[],
        }
    }

    /// Collection items (empty for anything but collections)
    pub fn items(&self) -> &[ObjectId] {
        match &self.kind {
            ObjectKind::Collection(collection) => &collection.items,
            _ => &[],
        }
    }

    fn properties_mut(&mut self) -> Option<&mut Vec<PropertyId>> {
        match &mut self.kind {
            ObjectKind::Instance(instance) => Some(&mut instance.properties),
            ObjectKind::Virtual(node) => Some(&mut node.properties),
            _ => None,
        }
    }

    fn items_mut(&mut self) -> Option<&mut Vec<ObjectId>> {
        match &mut self.kind {
            ObjectKind::Collection(collection) => Some(&mut collection.items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PropertyKind {
    Value(String),
    Collection(Vec<ObjectId>),
}

#[derive(Debug, Clone)]
pub struct PropertyData {
    pub(crate) name: String,
    pub(crate) owner: Option<ObjectId>,
    pub(crate) kind: PropertyKind,
}

impl PropertyData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Value(value) => Some(value),
            PropertyKind::Collection(_) => None,
        }
    }

    /// Values of a collection property (empty for value properties)
    pub fn values(&self) -> &[ObjectId] {
        match &self.kind {
            PropertyKind::Collection(values) => values,
            PropertyKind::Value(_) => &[],
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, PropertyKind::Collection(_))
    }
}

type Observer = Box<dyn FnMut(u64)>;

/// Editable markup document: an arena of objects and properties.
///
/// Objects and properties are never freed. Detached nodes stay in the arena
/// so jobs can put them back on undo; only nodes reachable from the root
/// are part of the document proper.
///
/// All structural changes to the reachable graph must happen between
/// [`Document::begin_update`] and [`Document::end_update`]. The revision is
/// bumped once when the outermost bracket closes.
pub struct Document {
    objects: Vec<ObjectData>,
    properties: Vec<PropertyData>,
    root: Option<ObjectId>,
    update_depth: usize,
    revision: u64,
    changed: bool,
    selection: Vec<ObjectId>,
    observers: Vec<Observer>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("objects", &self.objects.len())
            .field("properties", &self.properties.len())
            .field("root", &self.root)
            .field("update_depth", &self.update_depth)
            .field("revision", &self.revision)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            properties: Vec::new(),
            root: None,
            update_depth: 0,
            revision: 0,
            changed: false,
            selection: Vec::new(),
            observers: Vec::new(),
        }
    }

    // Transactions

    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// Closes an update bracket. Observers are notified when the outermost
    /// bracket closes after a structural change.
    pub fn end_update(&mut self) {
        assert!(
            self.update_depth > 0,
            "end_update() without matching begin_update()"
        );
        self.update_depth -= 1;

        if self.update_depth == 0 && self.changed {
            self.changed = false;
            self.revision += 1;
            trace!(revision = self.revision, "document revision bumped");

            let revision = self.revision;
            for observer in &mut self.observers {
                observer(revision);
            }
        }
    }

    /// Run `f` inside an update bracket
    pub fn update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_update();
        let result = f(self);
        self.end_update();
        result
    }

    pub fn is_updating(&self) -> bool {
        self.update_depth > 0
    }

    pub fn update_depth(&self) -> usize {
        self.update_depth
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a callback receiving the new revision after each completed
    /// outermost update bracket that changed the graph
    pub fn subscribe(&mut self, observer: impl FnMut(u64) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub(crate) fn reset_revision(&mut self) {
        self.revision = 0;
        self.changed = false;
    }

    // Arena access

    pub fn object(&self, id: ObjectId) -> &ObjectData {
        &self.objects[id.index()]
    }

    pub fn property(&self, id: PropertyId) -> &PropertyData {
        &self.properties[id.index()]
    }

    fn object_mut(&mut self, id: ObjectId) -> &mut ObjectData {
        &mut self.objects[id.index()]
    }

    fn property_mut(&mut self, id: PropertyId) -> &mut PropertyData {
        &mut self.properties[id.index()]
    }

    pub fn root(&self) -> Option<ObjectId> {
        self.root
    }

    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    /// Selection is editor state, not structure: no bracket, no revision
    pub fn set_selection(&mut self, selection: Vec<ObjectId>) {
        self.selection = selection;
    }

    // Creation of detached nodes

    fn push_object(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(ObjectData::new(kind));
        id
    }

    fn push_property(&mut self, name: String, kind: PropertyKind) -> PropertyId {
        let id = PropertyId(self.properties.len() as u32);
        self.properties.push(PropertyData {
            name,
            owner: None,
            kind,
        });
        id
    }

    pub fn new_instance(&mut self, class_name: impl Into<String>) -> ObjectId {
        self.push_object(ObjectKind::Instance(Instance {
            class_name: class_name.into(),
            properties: Vec::new(),
            controller: None,
            fx_root: false,
        }))
    }

    pub fn new_collection(&mut self) -> ObjectId {
        self.push_object(ObjectKind::Collection(Collection::default()))
    }

    pub fn new_intrinsic(&mut self, kind: IntrinsicKind, source: impl Into<String>) -> ObjectId {
        self.push_object(ObjectKind::Intrinsic(Intrinsic {
            kind,
            source: source.into(),
        }))
    }

    pub fn new_virtual(&mut self) -> ObjectId {
        self.push_object(ObjectKind::Virtual(Virtual::default()))
    }

    pub fn new_value_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> PropertyId {
        self.push_property(name.into(), PropertyKind::Value(value.into()))
    }

    pub fn new_collection_property(&mut self, name: impl Into<String>) -> PropertyId {
        self.push_property(name.into(), PropertyKind::Collection(Vec::new()))
    }

    // Attachment

    /// True when `object` is reachable from the document root
    pub fn is_attached(&self, object: ObjectId) -> bool {
        let mut current = object;
        loop {
            if Some(current) == self.root {
                return true;
            }
            match self.parent_object(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Owning object of `object`, through either a property or a collection
    pub fn parent_object(&self, object: ObjectId) -> Option<ObjectId> {
        match self.object(object).parent? {
            ParentSlot::Property(property) => self.property(property).owner,
            ParentSlot::Collection(collection) => Some(collection),
        }
    }

    fn property_attached(&self, property: PropertyId) -> bool {
        self.property(property)
            .owner
            .map(|owner| self.is_attached(owner))
            .unwrap_or(false)
    }

    /// Mark a change to the reachable graph. Changes to detached nodes are
    /// free; anything reachable must happen inside an update bracket.
    fn touch(&mut self, reachable: bool) {
        if reachable {
            assert!(
                self.update_depth > 0,
                "structural change outside begin_update()/end_update()"
            );
            self.changed = true;
        }
    }

    /// `object` may not become a child of itself or of one of its descendants
    fn assert_no_cycle(&self, object: ObjectId, new_parent: Option<ObjectId>) {
        if let Some(parent) = new_parent {
            assert!(
                parent != object && !self.is_descendant_of(parent, object),
                "{} cannot be attached below itself",
                object
            );
        }
    }

    // Mutators

    /// Attach `property` to `owner` at `index` (`None` appends)
    pub fn add_property(&mut self, owner: ObjectId, property: PropertyId, index: Option<usize>) {
        assert!(
            self.property(property).owner.is_none(),
            "{} already has an owner",
            property
        );
        assert!(
            self.object(owner).owns_properties(),
            "{} cannot own properties",
            owner
        );
        let name = &self.property(property).name;
        assert!(
            self.property_named(owner, name).is_none(),
            "{} already has a property named {}",
            owner,
            name
        );
        if let PropertyKind::Collection(values) = &self.property(property).kind {
            for value in values {
                self.assert_no_cycle(*value, Some(owner));
            }
        }

        let reachable = self.is_attached(owner);
        self.touch(reachable);

        let slots = self
            .object_mut(owner)
            .properties_mut()
            .expect("owner checked above");
        let index = index.unwrap_or(slots.len());
        assert!(index <= slots.len(), "property index {} out of bounds", index);
        slots.insert(index, property);
        self.property_mut(property).owner = Some(owner);
    }

    /// Detach `property` from its owner, returning the index it occupied
    pub fn remove_property(&mut self, property: PropertyId) -> usize {
        let owner = self
            .property(property)
            .owner
            .unwrap_or_else(|| panic!("{} has no owner", property));
        let reachable = self.is_attached(owner);
        self.touch(reachable);

        let slots = self
            .object_mut(owner)
            .properties_mut()
            .expect("owner owns properties");
        let index = slots
            .iter()
            .position(|p| *p == property)
            .expect("owner lists its property");
        slots.remove(index);
        self.property_mut(property).owner = None;
        index
    }

    /// Insert `object` into the collection property `property` at `index`
    pub fn add_value(&mut self, property: PropertyId, object: ObjectId, index: Option<usize>) {
        assert!(
            self.object(object).parent.is_none() && self.root != Some(object),
            "{} is already attached",
            object
        );
        assert!(
            self.property(property).is_collection(),
            "{} is not a collection property",
            property
        );
        self.assert_no_cycle(object, self.property(property).owner);

        let reachable = self.property_attached(property);
        self.touch(reachable);

        if let PropertyKind::Collection(values) = &mut self.property_mut(property).kind {
            let index = index.unwrap_or(values.len());
            assert!(index <= values.len(), "value index {} out of bounds", index);
            values.insert(index, object);
        }
        self.object_mut(object).parent = Some(ParentSlot::Property(property));
    }

    /// Detach `object` from its parent property, returning property and index
    pub fn remove_value(&mut self, object: ObjectId) -> (PropertyId, usize) {
        let property = match self.object(object).parent {
            Some(ParentSlot::Property(property)) => property,
            _ => panic!("{} is not held by a property", object),
        };
        let reachable = self.property_attached(property);
        self.touch(reachable);

        let mut removed_at = 0;
        if let PropertyKind::Collection(values) = &mut self.property_mut(property).kind {
            removed_at = values
                .iter()
                .position(|v| *v == object)
                .expect("property lists its value");
            values.remove(removed_at);
        }
        self.object_mut(object).parent = None;
        (property, removed_at)
    }

    /// Insert `object` into `collection` at `index`
    pub fn add_item(&mut self, collection: ObjectId, object: ObjectId, index: Option<usize>) {
        assert!(
            self.object(object).parent.is_none() && self.root != Some(object),
            "{} is already attached",
            object
        );
        assert!(
            self.object(collection).is_collection(),
            "{} is not a collection",
            collection
        );
        self.assert_no_cycle(object, Some(collection));

        let reachable = self.is_attached(collection);
        self.touch(reachable);

        let items = self
            .object_mut(collection)
            .items_mut()
            .expect("collection checked above");
        let index = index.unwrap_or(items.len());
        assert!(index <= items.len(), "item index {} out of bounds", index);
        items.insert(index, object);
        self.object_mut(object).parent = Some(ParentSlot::Collection(collection));
    }

    /// Detach `object` from its parent collection, returning collection and index
    pub fn remove_item(&mut self, object: ObjectId) -> (ObjectId, usize) {
        let collection = match self.object(object).parent {
            Some(ParentSlot::Collection(collection)) => collection,
            _ => panic!("{} is not held by a collection", object),
        };
        let reachable = self.is_attached(collection);
        self.touch(reachable);

        let items = self
            .object_mut(collection)
            .items_mut()
            .expect("parent is a collection");
        let index = items
            .iter()
            .position(|o| *o == object)
            .expect("collection lists its item");
        items.remove(index);
        self.object_mut(object).parent = None;
        (collection, index)
    }

    /// Move `object` right before `sibling` in its parent list, or to the end
    /// when `sibling` is `None`
    pub fn move_before_sibling(&mut self, object: ObjectId, sibling: Option<ObjectId>) {
        let slot = self
            .object(object)
            .parent
            .unwrap_or_else(|| panic!("{} has no parent", object));
        if let Some(sibling) = sibling {
            assert!(sibling != object, "{} cannot move before itself", object);
            assert_eq!(
                self.object(sibling).parent,
                Some(slot),
                "{} is not a sibling of {}",
                sibling,
                object
            );
        }

        let reachable = self.is_attached(object);
        self.touch(reachable);

        let list = match slot {
            ParentSlot::Property(property) => match &mut self.property_mut(property).kind {
                PropertyKind::Collection(values) => values,
                PropertyKind::Value(_) => unreachable!("objects only live in collection properties"),
            },
            ParentSlot::Collection(collection) => self
                .object_mut(collection)
                .items_mut()
                .expect("parent is a collection"),
        };
        let from = list
            .iter()
            .position(|o| *o == object)
            .expect("parent lists its child");
        list.remove(from);
        let to = match sibling {
            Some(sibling) => list
                .iter()
                .position(|o| *o == sibling)
                .expect("sibling checked above"),
            None => list.len(),
        };
        list.insert(to, object);
    }

    pub fn set_fx_id(&mut self, object: ObjectId, fx_id: Option<String>) {
        let reachable = self.is_attached(object);
        self.touch(reachable);
        self.object_mut(object).fx_id = fx_id;
    }

    pub fn set_controller(&mut self, object: ObjectId, controller: Option<String>) {
        let reachable = self.is_attached(object);
        self.touch(reachable);
        match &mut self.object_mut(object).kind {
            ObjectKind::Instance(instance) => instance.controller = controller,
            _ => panic!("{} is not an instance", object),
        }
    }

    pub fn set_fx_root(&mut self, object: ObjectId, fx_root: bool) {
        let reachable = self.is_attached(object);
        self.touch(reachable);
        match &mut self.object_mut(object).kind {
            ObjectKind::Instance(instance) => instance.fx_root = fx_root,
            _ => panic!("{} is not an instance", object),
        }
    }

    pub fn set_value(&mut self, property: PropertyId, value: impl Into<String>) {
        let reachable = self.property_attached(property);
        self.touch(reachable);
        match &mut self.property_mut(property).kind {
            PropertyKind::Value(current) => *current = value.into(),
            PropertyKind::Collection(_) => panic!("{} is not a value property", property),
        }
    }

    pub fn set_intrinsic_source(&mut self, object: ObjectId, source: impl Into<String>) {
        let reachable = self.is_attached(object);
        self.touch(reachable);
        match &mut self.object_mut(object).kind {
            ObjectKind::Intrinsic(intrinsic) => intrinsic.source = source.into(),
            _ => panic!("{} is not an intrinsic", object),
        }
    }

    /// Install the root of a freshly built document.
    ///
    /// Building a document is not an edit: nothing is tracked. Live documents
    /// change their root through [`Document::set_root`] inside a bracket.
    pub fn init_root(&mut self, root: ObjectId) {
        assert!(
            self.root.is_none() && self.revision == 0,
            "init_root() on a live document"
        );
        assert!(
            self.object(root).parent.is_none(),
            "{} is attached elsewhere",
            root
        );
        self.root = Some(root);
    }

    /// Replace the document root. The new root must be detached.
    pub fn set_root(&mut self, root: Option<ObjectId>) {
        if let Some(root) = root {
            assert!(
                self.object(root).parent.is_none(),
                "{} is attached elsewhere",
                root
            );
        }
        self.touch(true);
        self.root = root;
    }

    // Location based helpers

    pub fn location_of(&self, object: ObjectId) -> Option<Location> {
        if self.root == Some(object) {
            return Some(Location::Root);
        }
        let index = self.index_in_parent(object)?;
        match self.object(object).parent? {
            ParentSlot::Property(property) => Some(Location::Property { property, index }),
            ParentSlot::Collection(collection) => Some(Location::Collection { collection, index }),
        }
    }

    /// Object currently sitting at `location`, if any
    pub fn object_at(&self, location: Location) -> Option<ObjectId> {
        match location {
            Location::Root => self.root,
            Location::Property { property, index } => self.property(property).values().get(index).copied(),
            Location::Collection { collection, index } => {
                self.object(collection).items().get(index).copied()
            }
        }
    }

    /// Detach `object` from wherever it is, returning where it was
    pub fn detach(&mut self, object: ObjectId) -> Location {
        let location = self
            .location_of(object)
            .unwrap_or_else(|| panic!("{} is not attached to anything", object));
        match location {
            Location::Root => self.set_root(None),
            Location::Property { .. } => {
                self.remove_value(object);
            }
            Location::Collection { .. } => {
                self.remove_item(object);
            }
        }
        location
    }

    /// Attach a detached `object` at `location`
    pub fn attach(&mut self, object: ObjectId, location: Location) {
        match location {
            Location::Root => {
                assert!(self.root.is_none(), "document already has a root");
                self.set_root(Some(object));
            }
            Location::Property { property, index } => self.add_value(property, object, Some(index)),
            Location::Collection { collection, index } => {
                self.add_item(collection, object, Some(index))
            }
        }
    }
}
