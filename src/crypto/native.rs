//! Default signature provider
//!
//! Asymmetric checks go through aws-lc-rs (`UnparsedPublicKey` over a DER
//! SubjectPublicKeyInfo built from the JWK material); HMAC goes through the
//! RustCrypto `hmac`/`sha2` stack with a constant-time tag comparison.

use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::crypto::{Algorithm, SignatureVerifier, VerifyKeyError};
use crate::jwks::Jwk;
use crate::limits::MAX_JWK_MATERIAL_SIZE;
use crate::utils::{base64url, der};

/// Signature provider backed by in-process cryptography.
///
/// Stateless; a single instance can be shared across verifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeVerifier;

impl SignatureVerifier for NativeVerifier {
    fn verify(
        &self,
        alg: &str,
        jwk: &Jwk,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyKeyError> {
        let algorithm = Algorithm::parse(alg)?;

        // RFC 7517 Section 4.2: an explicit non-signature use disqualifies the key.
        if let Some(key_use) = &jwk.key_use {
            if key_use != "sig" {
                return Err(VerifyKeyError::KeyRejected(format!(
                    "key use mismatch: expected 'sig', found '{key_use}'"
                )));
            }
        }

        if let Some(kty) = &jwk.kty {
            if kty != algorithm.kty() {
                return Err(VerifyKeyError::KeyRejected(format!(
                    "key type mismatch: expected {}, found {kty}",
                    algorithm.kty()
                )));
            }
        }

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                verify_hmac(algorithm, jwk, message, signature)
            }
            _ => verify_asymmetric(algorithm, jwk, message, signature),
        }
    }
}

/// Decode one Base64URL key material field
fn material(field: Option<&str>, name: &str) -> Result<Vec<u8>, VerifyKeyError> {
    let value =
        field.ok_or_else(|| VerifyKeyError::KeyRejected(format!("key missing '{name}'")))?;

    base64url::decode_bytes(value, MAX_JWK_MATERIAL_SIZE)
        .map_err(|_| VerifyKeyError::KeyRejected(format!("key field '{name}' is not Base64URL")))
}

fn verify_hmac(
    algorithm: Algorithm,
    jwk: &Jwk,
    message: &[u8],
    signature: &[u8],
) -> Result<(), VerifyKeyError> {
    let key = material(jwk.k.as_deref(), "k")?;
    let rejected = |_| VerifyKeyError::KeyRejected("hmac key rejected".into());

    let tag: Vec<u8> = match algorithm {
        Algorithm::HS256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(&key).map_err(rejected)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::HS384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(&key).map_err(rejected)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::HS512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(&key).map_err(rejected)?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        _ => unreachable!("caller dispatches HMAC algorithms only"),
    };

    if constant_time_eq(&tag, signature) {
        Ok(())
    } else {
        Err(VerifyKeyError::BadSignature)
    }
}

fn verify_asymmetric(
    algorithm: Algorithm,
    jwk: &Jwk,
    message: &[u8],
    signature: &[u8],
) -> Result<(), VerifyKeyError> {
    let key_der = match algorithm.curve() {
        None => {
            let n = material(jwk.n.as_deref(), "n")?;
            let e = material(jwk.e.as_deref(), "e")?;
            der::rsa_spki_from_n_e(&n, &e)?
        }
        Some(curve) => {
            // A declared curve must agree with the one the algorithm implies.
            let expected_crv = match curve {
                crate::crypto::EcCurve::P256 => "P-256",
                crate::crypto::EcCurve::P384 => "P-384",
                crate::crypto::EcCurve::P521 => "P-521",
            };
            if let Some(crv) = &jwk.crv {
                if crv != expected_crv {
                    return Err(VerifyKeyError::KeyRejected(format!(
                        "curve mismatch: {algorithm} requires {expected_crv}, found {crv}"
                    )));
                }
            }

            let x = material(jwk.x.as_deref(), "x")?;
            let y = material(jwk.y.as_deref(), "y")?;
            der::ecdsa_spki_from_x_y(&x, &y, curve)?
        }
    };

    let public_key = UnparsedPublicKey::new(verification_algorithm(algorithm), &key_der);

    public_key
        .verify(message, signature)
        .map_err(|_| VerifyKeyError::BadSignature)
}

/// JWT ECDSA signatures use IEEE P1363 format (fixed-length R||S), not ASN.1
/// DER, per RFC 7518 Section 3.4.
fn verification_algorithm(algorithm: Algorithm) -> &'static dyn VerificationAlgorithm {
    match algorithm {
        Algorithm::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        Algorithm::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
        Algorithm::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        Algorithm::PS256 => &signature::RSA_PSS_2048_8192_SHA256,
        Algorithm::PS384 => &signature::RSA_PSS_2048_8192_SHA384,
        Algorithm::PS512 => &signature::RSA_PSS_2048_8192_SHA512,
        Algorithm::ES256 => &signature::ECDSA_P256_SHA256_FIXED,
        Algorithm::ES384 => &signature::ECDSA_P384_SHA384_FIXED,
        Algorithm::ES512 => &signature::ECDSA_P521_SHA512_FIXED,
        // HMAC algorithms never reach this path.
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            unreachable!("HMAC handled separately")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    fn oct_jwk(secret: &[u8]) -> Jwk {
        Jwk {
            kty: Some("oct".to_string()),
            k: Some(URL_SAFE_NO_PAD.encode(secret)),
            ..Jwk::for_kid("hmac-key")
        }
    }

    fn hmac_sha256(secret: &[u8], message: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    #[test]
    fn test_hmac_round_trip() {
        let secret = b"a-shared-secret-of-decent-length";
        let message = b"header.payload";
        let tag = hmac_sha256(secret, message);

        let verifier = NativeVerifier;
        assert_eq!(
            verifier.verify("HS256", &oct_jwk(secret), message, &tag),
            Ok(())
        );
    }

    #[test]
    fn test_hmac_bad_signature() {
        let secret = b"a-shared-secret-of-decent-length";
        let message = b"header.payload";
        let mut tag = hmac_sha256(secret, message);
        tag[0] ^= 0x01;

        let verifier = NativeVerifier;
        assert_eq!(
            verifier.verify("HS256", &oct_jwk(secret), message, &tag),
            Err(VerifyKeyError::BadSignature)
        );
    }

    #[test]
    fn test_hmac_wrong_message() {
        let secret = b"a-shared-secret-of-decent-length";
        let tag = hmac_sha256(secret, b"header.payload");

        let verifier = NativeVerifier;
        assert_eq!(
            verifier.verify("HS256", &oct_jwk(secret), b"header.tampered", &tag),
            Err(VerifyKeyError::BadSignature)
        );
    }

    #[test]
    fn test_unsupported_algorithm() {
        let verifier = NativeVerifier;
        let result = verifier.verify("none", &oct_jwk(b"secret"), b"m", b"s");
        assert!(matches!(result, Err(VerifyKeyError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_encryption_key_rejected() {
        let jwk = Jwk {
            key_use: Some("enc".to_string()),
            ..oct_jwk(b"secret")
        };

        let verifier = NativeVerifier;
        let result = verifier.verify("HS256", &jwk, b"m", b"s");
        assert!(
            matches!(result, Err(VerifyKeyError::KeyRejected(msg)) if msg.contains("key use mismatch"))
        );
    }

    #[test]
    fn test_kty_mismatch_rejected() {
        let jwk = Jwk {
            kty: Some("EC".to_string()),
            ..oct_jwk(b"secret")
        };

        let verifier = NativeVerifier;
        let result = verifier.verify("HS256", &jwk, b"m", b"s");
        assert!(
            matches!(result, Err(VerifyKeyError::KeyRejected(msg)) if msg.contains("key type mismatch"))
        );
    }

    #[test]
    fn test_missing_material_rejected() {
        let jwk = Jwk {
            kty: Some("RSA".to_string()),
            ..Jwk::for_kid("rsa-key")
        };

        let verifier = NativeVerifier;
        let result = verifier.verify("RS256", &jwk, b"m", b"s");
        assert!(
            matches!(result, Err(VerifyKeyError::KeyRejected(msg)) if msg.contains("missing 'n'"))
        );
    }

    #[test]
    fn test_curve_mismatch_rejected() {
        let jwk = Jwk {
            kty: Some("EC".to_string()),
            crv: Some("P-384".to_string()),
            x: Some(URL_SAFE_NO_PAD.encode([0x01; 32])),
            y: Some(URL_SAFE_NO_PAD.encode([0x02; 32])),
            ..Jwk::for_kid("ec-key")
        };

        let verifier = NativeVerifier;
        let result = verifier.verify("ES256", &jwk, b"m", b"s");
        assert!(
            matches!(result, Err(VerifyKeyError::KeyRejected(msg)) if msg.contains("curve mismatch"))
        );
    }

    #[test]
    fn test_rs256_round_trip() {
        use aws_lc_rs::rand::SystemRandom;
        use aws_lc_rs::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
        use rsa::pkcs8::EncodePrivateKey;
        use rsa::traits::PublicKeyParts;

        let mut rng = rand::thread_rng();
        let private_key = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("generate key");
        let pkcs8 = private_key.to_pkcs8_der().expect("pkcs8");
        let keypair = RsaKeyPair::from_pkcs8(pkcs8.as_bytes()).unwrap();

        let jwk = Jwk {
            kty: Some("RSA".to_string()),
            alg: Some("RS256".to_string()),
            n: Some(URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be())),
            e: Some(URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be())),
            ..Jwk::for_kid("rsa-key")
        };

        let message = b"header.payload";
        let rng = SystemRandom::new();
        let mut signature = vec![0u8; keypair.public_modulus_len()];
        keypair
            .sign(&RSA_PKCS1_SHA256, &rng, message, &mut signature)
            .unwrap();

        let verifier = NativeVerifier;
        assert_eq!(verifier.verify("RS256", &jwk, message, &signature), Ok(()));

        let mut tampered = signature.clone();
        tampered[0] ^= 0x01;
        assert_eq!(
            verifier.verify("RS256", &jwk, message, &tampered),
            Err(VerifyKeyError::BadSignature)
        );
    }
}
