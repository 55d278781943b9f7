use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("fx:id '{0}' is declared more than once")]
    DuplicateFxId(String),

    #[error("property '{0}' is declared more than once on the same object")]
    DuplicateProperty(String),

    #[error("property '{0}' must hold exactly one of `value` or `values`")]
    InvalidProperty(String),

    #[error("Invalid tree form: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn duplicate_fx_id(fx_id: impl Into<String>) -> Self {
        Self::DuplicateFxId(fx_id.into())
    }

    pub fn invalid_property(name: impl Into<String>) -> Self {
        Self::InvalidProperty(name.into())
    }
}
