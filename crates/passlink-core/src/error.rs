//! Error types for the PassLink core.

/// Core error type for PassLink infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum PassLinkError {
    /// The signing secret is missing or cannot be decoded.
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for PassLink operations.
pub type PassLinkResult<T> = Result<T, PassLinkError>;
