//! Errors for tokenward

use thiserror::Error;

/// Verification outcome taxonomy.
///
/// The first four variants describe tokens that are permanently invalid as
/// presented; `InvalidSignature` additionally covers absence of a matching
/// key, which may be network-derived and transient. The umbrella is
/// intentional: callers must not be able to distinguish "wrong key" from
/// "wrong signature" (the finer cause is only emitted to the `tracing`
/// subscriber at debug level).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Decoding Errors
    // ============================================================================
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid token: {0}")]
    Invalid(&'static str),

    // ============================================================================
    // Claim Errors
    // ============================================================================
    #[error("token expired at {expired_at} (now: {now})")]
    Expired { expired_at: i64, now: i64 },

    #[error("token not valid until {not_before} (now: {now})")]
    NotYetValid { not_before: i64, now: i64 },

    #[error("token issuer '{0}' is not trusted")]
    InvalidIssuer(String),

    // ============================================================================
    // Signature Errors
    // ============================================================================
    /// Umbrella for key-not-found, key/header algorithm disagreement, and
    /// failed cryptographic checks.
    #[error("signature verification failed")]
    InvalidSignature,
}

/// Result type alias for tokenward operations
pub type Result<T> = std::result::Result<T, Error>;
