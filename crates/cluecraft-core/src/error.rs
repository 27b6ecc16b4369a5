//! Engine and store error types.
//!
//! `StoreError` is defined here rather than in `cluecraft-store` so the
//! orchestrator can classify persistence failures without string matching.

use thiserror::Error;

/// Errors surfaced by the orchestrator to its caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session configuration was rejected before any state was touched.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The clue is not known to the catalog (or is malformed there).
    #[error("unknown clue: {0}")]
    UnknownClue(String),

    /// The answer verdict service failed; nothing was recorded.
    #[error("verdict service failed: {0}")]
    Verdict(String),

    /// The progress store failed. In-memory engine state was still updated.
    #[error("persistence failure during {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    pub(crate) fn persistence(operation: &'static str, source: StoreError) -> Self {
        EngineError::Persistence { operation, source }
    }

    /// Returns `true` if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Persistence { source, .. } => source.is_transient(),
            EngineError::Verdict(_) => true,
            EngineError::Configuration(_) | EngineError::UnknownClue(_) => false,
        }
    }
}

/// Errors that can occur while reading or writing user progress.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem or connection error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store is temporarily unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data exists but cannot be interpreted.
    #[error("corrupt record for user {user_id}: {message}")]
    Corrupt { user_id: String, message: String },
}

impl StoreError {
    /// Returns `true` if the failure is expected to clear up on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Unavailable(_))
    }
}
