//! # Scenekit Editor
//!
//! Undoable editing of scenekit documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: object graph + update bracket        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: jobs + history                      │
//! │  - Atomic jobs (one graph primitive each)   │
//! │  - Composite jobs (record, then replay)     │
//! │  - Reference repair after structural edits  │
//! │  - Grid row/column editing                  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: document + undo stack + config     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Jobs are the only writers**: every change to an attached node is a job
//! 2. **Replay, don't replan**: redo reapplies what execute recorded
//! 3. **One bracket per step**: observers see one revision per undo step
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scenekit_editor::{EditSession, EditorConfig};
//!
//! let mut session = EditSession::from_json(source, EditorConfig::default())?;
//! let report = session.repair()?;
//! session.undo();
//! ```

mod config;
mod errors;
pub mod grid;
mod job;
pub mod jobs;
pub mod references;
mod session;
mod undo_stack;

pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::EditorError;
pub use job::{Job, JobState};
pub use references::{audit, AliasOutcome, AliasState, ReferencePolicy, RepairEntry, RepairReport, Strength};
pub use session::EditSession;
pub use undo_stack::{JobBatch, UndoStack};

// Re-export the model for convenience
pub use scenekit_model as model;
