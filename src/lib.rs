//! # tokenward - JWT Verification with Cached Key Resolution
//!
//! > Bearer-token validation for services that trust one or more OIDC issuers.
//!
//! **tokenward** verifies compact JWTs end to end: it locates the correct
//! public signing key via [OIDC Discovery](https://openid.net/specs/openid-connect-discovery-1_0.html),
//! checks the token's structure and temporal/issuer claims, and delegates the
//! cryptographic signature check to an injectable capability. Key material is
//! held in a bounded TTL cache with single-flight de-duplication, so a burst
//! of tokens from one issuer costs one discovery round, and a slow or
//! unreachable issuer degrades to a cached "absent" answer instead of a
//! stalled caller.
//!
//! ## Verification Flow
//!
//! ```text
//! compact token
//!     │ Jwt::decode            (structure: Base64URL, JSON, claim shapes)
//!     ▼
//! Jwt
//!     │ TokenVerifier::verify
//!     ├── issuer allow-list    → InvalidIssuer
//!     ├── exp                  → Expired
//!     ├── nbf                  → NotYetValid
//!     ├── KeyResolver::resolve (discovery → keyset → kid/claims selection)
//!     │     no key / alg disagreement / bad signature
//!     │                        → InvalidSignature
//!     ▼
//! Ok(())
//! ```
//!
//! The three claim checks run before any network access, so cheap rejects
//! stay cheap. Everything under the signature umbrella reports the same
//! `InvalidSignature` outcome by design: distinguishing "unknown key" from
//! "wrong signature" would hand attackers an oracle.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tokenward::{ResolverOptions, TokenVerifier};
//!
//! let verifier = TokenVerifier::new(ResolverOptions::new(["https://auth.example.com"]));
//!
//! match verifier.decode_and_verify(token).await {
//!     Ok(jwt) => println!("subject: {:?}", jwt.payload.claims.get("sub")),
//!     Err(error) => eprintln!("rejected: {error}"),
//! }
//! ```
//!
//! ## Key Resolution
//!
//! [`KeyResolver`] caches three document kinds independently — discovery
//! configurations, keysets, and fully resolved keys — each under its own TTL,
//! with absent results held for a shorter `retry_delay`. When a kid misses in
//! a cached document the resolver invalidates that document and retries
//! exactly once with fresh data, which is how key rotation is picked up
//! without ever retrying verification itself. Keys sharing a `kid` are
//! disambiguated FAPI-style by scoring the `use`/`alg`/`kty`/`crv` claims.
//!
//! ## Cryptography
//!
//! The [`SignatureVerifier`] trait is the only cryptographic seam. The
//! bundled [`NativeVerifier`] supports HS256/384/512 (RustCrypto HMAC,
//! constant-time comparison) and RS/PS/ES256/384/512 (aws-lc-rs). Key
//! generation and signing are out of scope.

mod cache;
mod discovery;
mod error;
mod jwks;
mod resolver;
mod token;
mod verifier;

pub(crate) mod limits;
pub(crate) mod url;
pub(crate) mod utils;

pub mod crypto;

// Public Interface
pub use crypto::{Algorithm, NativeVerifier, SignatureVerifier, VerifyKeyError};
pub use error::{Error, Result};
pub use jwks::Jwk;
pub use resolver::{KeyRequest, KeyResolver, ResolverOptions};
pub use token::{Jwt, JwtHeader, JwtPayload};
pub use verifier::TokenVerifier;
