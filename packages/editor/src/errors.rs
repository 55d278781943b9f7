//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Job is not executable: {0}")]
    NotExecutable(String),

    #[error("Model error: {0}")]
    Model(#[from] scenekit_model::ModelError),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No object declares fx:id '{0}'")]
    UnknownFxId(String),
}
