//! # Edit Session
//!
//! One document together with its history and configuration.
//!
//! Every edit goes through the session's undo stack, so an edit made here
//! is always undoable. The structural helpers (`delete`, `drop_on_grid`)
//! also repair references afterwards, inside the same undo step.

use std::path::Path;

use scenekit_model::{Document, ObjectId};

use crate::config::EditorConfig;
use crate::grid::{GridDropJob, GridDropTarget};
use crate::references::{
    audit, DeleteObjectJob, ReferencesUpdaterJob, RenameFxIdJob, RepairReport, UpdateReferencesJob,
};
use crate::{EditorError, Job, UndoStack};

#[derive(Debug)]
pub struct EditSession {
    /// Document being edited
    pub document: Document,

    pub history: UndoStack,

    pub config: EditorConfig,
}

impl EditSession {
    pub fn new(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            history: UndoStack::with_max_levels(config.undo_levels),
            config,
        }
    }

    pub fn from_json(source: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let document = Document::from_json(source)?;
        Ok(Self::new(document, config))
    }

    /// Open a document file; config comes from the file's directory
    pub fn open(path: &Path) -> Result<Self, EditorError> {
        let config = match path.parent() {
            Some(dir) => EditorConfig::load(dir)?,
            None => EditorConfig::default(),
        };
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source, config)
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(self.document.to_json()?)
    }

    /// Execute a job and make it undoable
    pub fn push(&mut self, job: impl Job + 'static) -> Result<(), EditorError> {
        self.history.push(job, &mut self.document)
    }

    pub fn push_boxed(&mut self, job: Box<dyn Job>) -> Result<(), EditorError> {
        self.history.push_boxed(job, &mut self.document)
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.document)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Object declaring `fx_id`
    pub fn object_with_fx_id(&self, fx_id: &str) -> Result<ObjectId, EditorError> {
        self.document
            .search_with_fx_id(fx_id)
            .ok_or_else(|| EditorError::UnknownFxId(fx_id.to_string()))
    }

    /// State of every alias, without changing anything
    pub fn audit(&self) -> RepairReport {
        audit(&self.document, &self.config.references)
    }

    /// Repair every alias of the document.
    ///
    /// Nothing is added to the history when the document was already clean.
    pub fn repair(&mut self) -> Result<RepairReport, EditorError> {
        let mut job = ReferencesUpdaterJob::new(self.config.references.clone());
        if !job.is_executable(&self.document) {
            return Err(EditorError::NotExecutable(job.description()));
        }
        job.execute(&mut self.document);
        let report = job.report().clone();
        if job.changed() {
            self.history.push_executed(Box::new(job));
        }
        Ok(report)
    }

    /// Delete an object, promoting it into its first strong alias if it has
    /// one
    pub fn delete(&mut self, object: ObjectId) -> Result<(), EditorError> {
        let policy = self.config.references.clone();
        let job = DeleteObjectJob::new(object, policy.clone());
        self.push(UpdateReferencesJob::new(job, policy))
    }

    pub fn rename(&mut self, fx_id: &str, new_fx_id: &str) -> Result<(), EditorError> {
        let object = self.object_with_fx_id(fx_id)?;
        self.push(RenameFxIdJob::new(object, new_fx_id))
    }

    pub fn drop_on_grid(&mut self, sources: Vec<ObjectId>, target: GridDropTarget) -> Result<(), EditorError> {
        let job = GridDropJob::new(sources, target);
        self.push(UpdateReferencesJob::new(job, self.config.references.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::ModifyFxIdJob;

    const FORM: &str = r#"{
        "root": {
            "type": "instance",
            "class": "VBox",
            "properties": [
                { "name": "children", "values": [
                    { "type": "reference", "source": "title" },
                    { "type": "instance", "class": "Label", "fxId": "title" }
                ] }
            ]
        }
    }"#;

    #[test]
    fn test_repair_is_one_undo_step() {
        let mut session = EditSession::from_json(FORM, EditorConfig::default()).unwrap();
        let before = session.document.snapshot();

        let report = session.repair().unwrap();
        assert_eq!(report.unresolved().count(), 1);
        assert!(session.can_undo());
        assert!(session.audit().is_clean());

        assert!(session.undo());
        assert_eq!(session.document.snapshot(), before);
        assert!(session.redo());
        assert!(session.audit().is_clean());
    }

    #[test]
    fn test_clean_repair_leaves_history_alone() {
        let mut session = EditSession::from_json(FORM, EditorConfig::default()).unwrap();
        session.repair().unwrap();
        let levels = session.history.undo_levels();

        let report = session.repair().unwrap();
        assert!(report.is_clean());
        assert_eq!(session.history.undo_levels(), levels);
    }

    #[test]
    fn test_rename_unknown_fx_id() {
        let mut session = EditSession::from_json(FORM, EditorConfig::default()).unwrap();
        assert!(matches!(
            session.rename("nothing", "else"),
            Err(EditorError::UnknownFxId(id)) if id == "nothing"
        ));
        session.rename("title", "heading").unwrap();
        assert_eq!(session.document.collect_aliases(Some("heading")).len(), 1);
    }

    #[test]
    fn test_refused_job_is_an_error() {
        let mut session = EditSession::from_json(FORM, EditorConfig::default()).unwrap();
        let title = session.object_with_fx_id("title").unwrap();
        let result = session.push(ModifyFxIdJob::new(title, Some("title".to_string())));
        assert!(matches!(result, Err(EditorError::NotExecutable(_))));
        assert!(!session.can_undo());
    }

    #[test]
    fn test_undo_levels_follow_config() {
        let config = EditorConfig {
            undo_levels: 3,
            ..EditorConfig::default()
        };
        let session = EditSession::from_json(FORM, config).unwrap();
        assert_eq!(session.history.max_levels(), 3);
    }
}
