//! End-to-end token verification
//!
//! [`TokenVerifier::verify`] is a state machine with terminal states checked
//! in priority order: issuer, expiration, not-before, then the signature
//! path. The first three are pure claim checks, so forged-issuer and expired
//! tokens never pay for key resolution. The signature path collapses
//! key-not-found, algorithm disagreement, and cryptographic failure into the
//! single [`Error::InvalidSignature`] outcome so callers cannot be used as an
//! oracle to distinguish "wrong key" from "wrong signature"; the granular
//! cause is only logged.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::crypto::{NativeVerifier, SignatureVerifier};
use crate::error::{Error, Result};
use crate::limits::MAX_DECODED_SIGNATURE_SIZE;
use crate::resolver::{KeyRequest, KeyResolver, ResolverOptions};
use crate::token::Jwt;
use crate::utils::base64url;

/// Verifier for decoded tokens, tied to one key resolver and one signature
/// capability
#[derive(Clone)]
pub struct TokenVerifier {
    resolver: KeyResolver,
    crypto: Arc<dyn SignatureVerifier>,
}

impl TokenVerifier {
    /// Verifier with its own resolver and the native signature provider
    pub fn new(options: ResolverOptions) -> Self {
        Self::with_crypto(KeyResolver::new(options), Arc::new(NativeVerifier))
    }

    /// Verifier sharing an existing resolver
    pub fn with_resolver(resolver: KeyResolver) -> Self {
        Self::with_crypto(resolver, Arc::new(NativeVerifier))
    }

    /// Verifier with an injected signature capability
    pub fn with_crypto(resolver: KeyResolver, crypto: Arc<dyn SignatureVerifier>) -> Self {
        Self { resolver, crypto }
    }

    /// The resolver backing this verifier
    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Verify a decoded token
    pub async fn verify(&self, jwt: &Jwt) -> Result<()> {
        let now = now_seconds();

        // Cheap rejects first; none of these touch the network.
        if !self.resolver.is_trusted(&jwt.payload.iss) {
            return Err(Error::InvalidIssuer(jwt.payload.iss.clone()));
        }
        if jwt.payload.exp <= now {
            return Err(Error::Expired {
                expired_at: jwt.payload.exp,
                now,
            });
        }
        if let Some(nbf) = jwt.payload.nbf {
            if nbf > now {
                return Err(Error::NotYetValid {
                    not_before: nbf,
                    now,
                });
            }
        }

        let Some(jwk) = self.resolver.resolve(&KeyRequest::for_signing(jwt)).await else {
            debug!(kid = %jwt.header.kid, "no verification key resolved");
            return Err(Error::InvalidSignature);
        };

        // A key that declares its own algorithm must agree with the header.
        if let Some(alg) = &jwk.alg {
            if *alg != jwt.header.alg {
                debug!(key_alg = %alg, token_alg = %jwt.header.alg, "key algorithm disagrees with header");
                return Err(Error::InvalidSignature);
            }
        }

        let signature = match base64url::decode_bytes(&jwt.signature, MAX_DECODED_SIGNATURE_SIZE) {
            Ok(signature) => signature,
            Err(_) => {
                debug!("signature segment is not decodable");
                return Err(Error::InvalidSignature);
            }
        };

        match self
            .crypto
            .verify(&jwt.header.alg, &jwk, jwt.signing_input().as_bytes(), &signature)
        {
            Ok(()) => Ok(()),
            Err(reason) => {
                debug!(%reason, "signature check failed");
                Err(Error::InvalidSignature)
            }
        }
    }

    /// Decode a compact token and verify it in one step.
    ///
    /// Decoder failures (`Malformed`, `Invalid`) surface before any
    /// verification state is evaluated.
    pub async fn decode_and_verify(&self, token: &str) -> Result<Jwt> {
        let jwt = Jwt::decode(token)?;
        self.verify(&jwt).await?;
        Ok(jwt)
    }
}

/// Current Unix timestamp in seconds
fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
