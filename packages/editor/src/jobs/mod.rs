//! Job implementations: atomic primitives and the composites built on them

pub(crate) mod atomic;
mod batch;
mod inline;
mod object;

pub use atomic::{
    AddCollectionItemJob, AddPropertyJob, AddPropertyValueJob, ModifyControllerJob,
    ModifyFxIdJob, ModifyIntrinsicSourceJob, ModifyValueJob, ReIndexObjectJob,
    RemoveCollectionItemJob, RemoveObjectJob, RemovePropertyJob, RemovePropertyValueJob,
    ReplaceObjectJob, ReplacePropertyJob, SetDocumentRootJob, ToggleFxRootJob,
    UpdateSelectionJob,
};
pub use batch::BatchJob;
pub use inline::JobRecorder;
pub use object::ModifyObjectJob;
