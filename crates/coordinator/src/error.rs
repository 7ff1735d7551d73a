use shard_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("resource '{name}' already exists")]
    DuplicateResource { name: String },

    #[error(transparent)]
    Intent(#[from] CoreError),

    #[error("Waiting timeout exceeded.")]
    Timeout,

    /// Terminal `failed` status; the message is the hook's `result` verbatim.
    #[error("{0}")]
    Fulfillment(String),

    #[error("Waiting cancelled.")]
    Cancelled,

    #[error("Hook arguments are not serializable: {0}")]
    HookPayload(#[from] serde_json::Error),

    #[error("Status store error: {0}")]
    Store(#[from] db::DbError),

    #[error("Wait task failed: {0}")]
    TaskJoin(String),

    #[error("Invalid poll state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl CoordinatorError {
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateResource { name: name.into() }
    }

    /// Short machine-readable kind, used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateResource { .. } => "duplicate_resource",
            Self::Intent(CoreError::Parse(_)) => "parse_error",
            Self::Intent(CoreError::Validation(_)) => "validation_error",
            Self::Timeout => "timeout",
            Self::Fulfillment(_) => "fulfillment_failed",
            Self::Cancelled => "cancelled",
            Self::HookPayload(_) => "hook_payload",
            Self::Store(_) => "store_error",
            Self::TaskJoin(_) => "task_failed",
            Self::InvalidTransition { .. } => "internal_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
