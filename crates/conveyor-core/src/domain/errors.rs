use thiserror::Error;

use super::action::ActionCode;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("unknown action code '{0}'")]
    UnknownActionCode(ActionCode),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("no handler registered for implementation id '{0}'")]
    HandlerNotFound(String),

    #[error("duplicate handler for implementation id '{0}'")]
    DuplicateHandler(String),

    #[error("handler fault: {0}")]
    HandlerFault(String),

    #[error("invalid action map: {0}")]
    InvalidActionMap(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("job cancelled")]
    Cancelled,
}

impl JobError {
    /// Shorthand for handler implementations reporting a business failure.
    pub fn fault(message: impl Into<String>) -> Self {
        JobError::HandlerFault(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        JobError::Persistence(message.into())
    }
}
