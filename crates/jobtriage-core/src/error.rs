//! Error types for job triage

/// Result type alias using the triage Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for triage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lexical classifier construction or execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Semantic (Tier 2) backend errors: transport, status, or decode failures
    #[error("semantic classifier error: {0}")]
    Semantic(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Aggregation was asked to summarise a call with no jobs
    #[error("cannot recommend a route for a call with no jobs")]
    EmptyBatch,

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// The surrounding call ended before the operation completed
    #[error("operation cancelled")]
    Cancelled,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new semantic classifier error
    pub fn semantic(msg: impl Into<String>) -> Self {
        Self::Semantic(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
