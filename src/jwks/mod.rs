//! JSON Web Key Set (JWKS) types and key selection

pub(crate) mod matcher;

use serde::Deserialize;

/// JSON Web Key (JWK) as served in a keyset document
///
/// Keyset entries without a string `kid` are filtered out during fetching, so
/// a `Jwk` held by the resolver always carries one. The record is immutable
/// once fetched; the cache only ever replaces whole entries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Jwk {
    /// Key ID
    pub kid: String,
    /// Algorithm (advisory field per RFC 7517)
    pub alg: Option<String>,
    /// Key use (RFC 7517 Section 4.2): "sig" for signature keys, "enc" for
    /// encryption keys
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// Key type (e.g. "RSA", "EC", "oct")
    pub kty: Option<String>,
    /// Elliptic curve name (e.g. "P-256")
    pub crv: Option<String>,
    // RSA material
    /// RSA modulus (Base64URL-encoded)
    pub n: Option<String>,
    /// RSA exponent (Base64URL-encoded)
    pub e: Option<String>,
    // EC material
    /// Curve x-coordinate (Base64URL-encoded)
    pub x: Option<String>,
    /// Curve y-coordinate (Base64URL-encoded)
    pub y: Option<String>,
    // Symmetric material
    /// Symmetric key bytes (Base64URL-encoded)
    pub k: Option<String>,
}

#[cfg(test)]
impl Jwk {
    /// Bare key with only a kid, for tests that don't touch key material
    pub(crate) fn for_kid(kid: &str) -> Self {
        Jwk {
            kid: kid.to_string(),
            alg: None,
            key_use: None,
            kty: None,
            crv: None,
            n: None,
            e: None,
            x: None,
            y: None,
            k: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwk_deserialize() {
        let jwk: Jwk = serde_json::from_str(
            r#"{"kid":"k1","kty":"RSA","alg":"RS256","use":"sig","n":"abc","e":"AQAB"}"#,
        )
        .unwrap();

        assert_eq!(jwk.kid, "k1");
        assert_eq!(jwk.kty.as_deref(), Some("RSA"));
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        assert_eq!(jwk.n.as_deref(), Some("abc"));
    }

    #[test]
    fn test_jwk_requires_kid() {
        let result = serde_json::from_str::<Jwk>(r#"{"kty":"RSA","n":"abc","e":"AQAB"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_jwk_optional_fields_absent() {
        let jwk: Jwk = serde_json::from_str(r#"{"kid":"k2"}"#).unwrap();
        assert_eq!(jwk.kid, "k2");
        assert_eq!(jwk.alg, None);
        assert_eq!(jwk.kty, None);
    }
}
