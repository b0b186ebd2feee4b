//! Error types for the aggregation pipeline.

use thiserror::Error;

/// Failures reported by a device store. Adapters absorb these and degrade the
/// snapshot instead of propagating them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Errors surfaced to the caller of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("chat error: {0}")]
    Chat(#[from] athena_client::ChatError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("summary was cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Message suitable for showing verbatim to the end user.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Chat(athena_client::ChatError::AuthMissing) => {
                "API key not set".to_string()
            }
            PipelineError::Chat(athena_client::ChatError::Http { status, .. }) => {
                format!("API request failed with status {status}")
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
