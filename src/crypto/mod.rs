//! Signature verification capability
//!
//! The verification pipeline treats cryptography as an injected capability:
//! [`SignatureVerifier`] is the seam, and [`NativeVerifier`] is the default
//! implementation shipped with this crate. Key generation, signing, and other
//! primitives are out of scope.

mod native;

pub use native::NativeVerifier;

use thiserror::Error;

use crate::jwks::Jwk;

/// Signature check failure reasons.
///
/// These never reach verification callers directly; the verifier collapses
/// them into [`crate::Error::InvalidSignature`] and logs the reason.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyKeyError {
    #[error("algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    #[error("key material rejected: {0}")]
    KeyRejected(String),

    #[error("signature mismatch")]
    BadSignature,
}

/// Capability for checking a token signature against a JWK.
///
/// Key import and verification are collapsed into a single call; an
/// implementation is expected to reject unusable key material with
/// [`VerifyKeyError::KeyRejected`] rather than panic. Implementations must be
/// cheap to call repeatedly — the verifier invokes this once per token.
pub trait SignatureVerifier: Send + Sync {
    /// Check `signature` over `message` using `jwk` under the token's declared
    /// algorithm `alg`.
    fn verify(
        &self,
        alg: &str,
        jwk: &Jwk,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyKeyError>;
}

/// Algorithm identifier from a JWT header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    ES256,
    ES384,
    ES512,
}

/// NIST curves used by the ECDSA algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    /// Fixed coordinate length in bytes for keys on this curve
    pub(crate) const fn coordinate_len(self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

impl Algorithm {
    pub fn parse(s: &str) -> Result<Self, VerifyKeyError> {
        match s {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            "PS256" => Ok(Algorithm::PS256),
            "PS384" => Ok(Algorithm::PS384),
            "PS512" => Ok(Algorithm::PS512),
            "ES256" => Ok(Algorithm::ES256),
            "ES384" => Ok(Algorithm::ES384),
            "ES512" => Ok(Algorithm::ES512),
            // Covers "none" (RFC 8725) and anything unrecognized.
            _ => Err(VerifyKeyError::UnsupportedAlgorithm(s.into())),
        }
    }

    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
            Algorithm::PS256 => "PS256",
            Algorithm::PS384 => "PS384",
            Algorithm::PS512 => "PS512",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            Algorithm::ES512 => "ES512",
        }
    }

    /// Expected JWK key type (`kty`) for this algorithm
    pub(crate) const fn kty(&self) -> &'static str {
        match self {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => "oct",
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => "RSA",
            Algorithm::ES256 | Algorithm::ES384 | Algorithm::ES512 => "EC",
        }
    }

    pub(crate) const fn curve(&self) -> Option<EcCurve> {
        match self {
            Algorithm::ES256 => Some(EcCurve::P256),
            Algorithm::ES384 => Some(EcCurve::P384),
            Algorithm::ES512 => Some(EcCurve::P521),
            _ => None,
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parse() {
        assert!(matches!(
            Algorithm::parse("none"),
            Err(VerifyKeyError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            Algorithm::parse("UNKNOWN"),
            Err(VerifyKeyError::UnsupportedAlgorithm(_))
        ));

        assert_eq!(Algorithm::parse("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(Algorithm::parse("RS256").unwrap(), Algorithm::RS256);
        assert_eq!(Algorithm::parse("PS384").unwrap(), Algorithm::PS384);
        assert_eq!(Algorithm::parse("ES512").unwrap(), Algorithm::ES512);
    }

    #[test]
    fn test_algorithm_round_trip() {
        for alg in [
            Algorithm::HS256,
            Algorithm::HS384,
            Algorithm::HS512,
            Algorithm::RS256,
            Algorithm::RS384,
            Algorithm::RS512,
            Algorithm::PS256,
            Algorithm::PS384,
            Algorithm::PS512,
            Algorithm::ES256,
            Algorithm::ES384,
            Algorithm::ES512,
        ] {
            assert_eq!(Algorithm::parse(alg.as_str()).unwrap(), alg);
        }
    }

    #[test]
    fn test_algorithm_kty() {
        assert_eq!(Algorithm::HS512.kty(), "oct");
        assert_eq!(Algorithm::RS256.kty(), "RSA");
        assert_eq!(Algorithm::PS512.kty(), "RSA");
        assert_eq!(Algorithm::ES384.kty(), "EC");
    }

    #[test]
    fn test_algorithm_curve() {
        assert_eq!(Algorithm::ES256.curve(), Some(EcCurve::P256));
        assert_eq!(Algorithm::ES384.curve(), Some(EcCurve::P384));
        assert_eq!(Algorithm::ES512.curve(), Some(EcCurve::P521));
        assert_eq!(Algorithm::RS256.curve(), None);
    }
}
