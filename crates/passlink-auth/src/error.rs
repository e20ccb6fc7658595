//! Error types for link generation and principal resolution.
//!
//! Rejected links are not errors: an expired or tampered link is an expected
//! [`VerificationOutcome`](crate::guard::VerificationOutcome). [`AuthError`]
//! covers the conditions outside that classification.

/// Errors raised while generating a link or resolving its principal.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The link verified, but the principal it names no longer exists.
    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    /// An extra parameter collides with a key the link format reserves.
    #[error("Reserved query parameter: {0}")]
    ReservedParameter(String),

    /// The principal's unique key is empty and cannot form a path segment.
    #[error("Principal key must not be empty")]
    EmptyPrincipalKey,
}
