//! # scenekit model
//!
//! In-memory object graph of a markup document.
//!
//! ```text
//! Document
//!  ├─ objects:    Instance | Collection | Intrinsic | Virtual   (ObjectId)
//!  └─ properties: Value(text) | Collection(objects)             (PropertyId)
//! ```
//!
//! Nodes live in an arena and are addressed by handles. Parent links are
//! handles too, so a node can be detached, kept by an undo record and put
//! back later without any copying.
//!
//! The graph only checks structure. Keeping fx:ids unique and aliases valid
//! across edits is the job of the editor crate, which mutates documents
//! exclusively through reversible jobs.

pub mod alias;
pub mod clone;
pub mod error;
pub mod format;
pub mod fx_id;
pub mod graph;
pub mod query;
pub mod snapshot;
pub mod visit;

pub use alias::{expression_for, expression_source, is_valid_fx_id, Alias, AliasKind};
pub use error::{ModelError, ModelResult};
pub use format::{DocumentSpec, NodeSpec, PropertySpec};
pub use fx_id::{fx_id_stem, FxIdGenerator};
pub use graph::{
    Document, IntrinsicKind, Location, ObjectData, ObjectId, ObjectKind, ParentSlot, PropertyData,
    PropertyId, PropertyKind,
};
pub use snapshot::{ObjectSnapshot, PropertySnapshot, Snapshot, SnapshotKind};
pub use visit::{walk_document, walk_object, walk_property, OrderCollector, Visitor};
