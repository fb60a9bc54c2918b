//! DER encoding utilities for converting JWK key material to SubjectPublicKeyInfo
//!
//! Uses the RustCrypto `spki` and `der` crates for standards-compliant DER
//! encoding in the format the aws-lc-rs backend expects.

use der::{Any, Encode, Sequence, asn1::BitString, asn1::UintRef};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

use crate::crypto::{EcCurve, VerifyKeyError};

fn encode_error(operation: &str, details: impl std::fmt::Display) -> VerifyKeyError {
    VerifyKeyError::KeyRejected(format!("{operation}: {details}"))
}

/// RSAPublicKey as defined in RFC 3447:
/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// Build a DER-encoded RSA public key from modulus (n) and exponent (e) bytes
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>, VerifyKeyError> {
    if n.is_empty() || e.is_empty() {
        return Err(VerifyKeyError::KeyRejected("rsa key missing n or e".into()));
    }

    // Practical RSA keys are 2048-4096 bits (256-512 byte moduli); 8192 bytes
    // (65536 bits) is way beyond practical use
    const MAX_RSA_MODULUS_SIZE: usize = 8192;
    if n.len() > MAX_RSA_MODULUS_SIZE {
        return Err(encode_error(
            "RSA modulus too large",
            format!("{} bytes (maximum: {MAX_RSA_MODULUS_SIZE} bytes)", n.len()),
        ));
    }

    // UintRef handles INTEGER encoding including the leading zero for positive values
    let n_uint = UintRef::new(n).map_err(|e| encode_error("failed to encode RSA modulus", e))?;
    let e_uint = UintRef::new(e).map_err(|e| encode_error("failed to encode RSA exponent", e))?;

    let rsa_pubkey = RsaPublicKey {
        modulus: n_uint,
        public_exponent: e_uint,
    };

    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|e| encode_error("failed to encode RSA public key", e))?;

    const RSA_ENCRYPTION_OID: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

    let algorithm = AlgorithmIdentifierOwned {
        oid: RSA_ENCRYPTION_OID,
        parameters: Some(der::asn1::AnyRef::NULL.into()),
    };

    let subject_public_key = BitString::new(0, rsa_pubkey_der)
        .map_err(|e| encode_error("failed to create bit string", e))?;

    let spki = SubjectPublicKeyInfoOwned {
        algorithm,
        subject_public_key,
    };

    spki.to_der()
        .map_err(|e| encode_error("failed to encode SPKI", e))
}

/// Normalize a curve coordinate to its fixed length: strip leading zeros,
/// left-pad short values
fn normalize_coordinate(value: &[u8], expected_len: usize) -> Result<Vec<u8>, VerifyKeyError> {
    let stripped: &[u8] = {
        let mut v = value;
        while v.len() > expected_len && v[0] == 0 {
            v = &v[1..];
        }
        v
    };

    if stripped.len() > expected_len {
        return Err(VerifyKeyError::KeyRejected(format!(
            "ecdsa coordinate too long: {} bytes (expected: {expected_len})",
            stripped.len()
        )));
    }

    let mut out = vec![0u8; expected_len - stripped.len()];
    out.extend_from_slice(stripped);
    Ok(out)
}

/// Build a DER-encoded EC public key from affine coordinates (x, y)
pub(crate) fn ecdsa_spki_from_x_y(
    x: &[u8],
    y: &[u8],
    curve: EcCurve,
) -> Result<Vec<u8>, VerifyKeyError> {
    if x.is_empty() || y.is_empty() {
        return Err(VerifyKeyError::KeyRejected(
            "ecdsa key missing x or y".into(),
        ));
    }

    let expected_len = curve.coordinate_len();
    let x_norm = normalize_coordinate(x, expected_len)?;
    let y_norm = normalize_coordinate(y, expected_len)?;

    // Uncompressed point: 04 || x || y
    let mut point = Vec::with_capacity(1 + 2 * expected_len);
    point.push(0x04);
    point.extend_from_slice(&x_norm);
    point.extend_from_slice(&y_norm);

    const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

    let curve_oid = match curve {
        EcCurve::P256 => ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7"),
        EcCurve::P384 => ObjectIdentifier::new_unwrap("1.3.132.0.34"),
        EcCurve::P521 => ObjectIdentifier::new_unwrap("1.3.132.0.35"),
    };

    let parameters =
        Any::encode_from(&curve_oid).map_err(|e| encode_error("failed to encode curve OID", e))?;

    let algorithm = AlgorithmIdentifierOwned {
        oid: EC_PUBLIC_KEY_OID,
        parameters: Some(parameters),
    };

    let subject_public_key =
        BitString::new(0, point).map_err(|e| encode_error("failed to create bit string", e))?;

    let spki = SubjectPublicKeyInfoOwned {
        algorithm,
        subject_public_key,
    };

    spki.to_der()
        .map_err(|e| encode_error("failed to encode SPKI", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsa_spki_from_n_e() {
        let n = vec![0x00, 0x01];
        let e = vec![0x01, 0x00, 0x01]; // 65537

        let der = rsa_spki_from_n_e(&n, &e).expect("should encode");
        assert!(!der.is_empty());
        assert_eq!(der[0], 0x30); // SEQUENCE
    }

    #[test]
    fn test_rsa_spki_empty_n() {
        let result = rsa_spki_from_n_e(&[], &[0x01, 0x00, 0x01]);
        assert!(matches!(result, Err(VerifyKeyError::KeyRejected(_))));
    }

    #[test]
    fn test_rsa_spki_empty_e() {
        let result = rsa_spki_from_n_e(&[0x00, 0x01], &[]);
        assert!(matches!(result, Err(VerifyKeyError::KeyRejected(_))));
    }

    #[test]
    fn test_rsa_spki_proper_length_encoding() {
        // 256-byte modulus simulates a 2048-bit RSA key (requires 2-byte DER length)
        let mut n = vec![0x00; 256];
        n[0] = 0x01;
        let e = vec![0x01, 0x00, 0x01];

        let der = rsa_spki_from_n_e(&n, &e).expect("should encode");
        assert_eq!(der[0], 0x30);
        assert!(der.len() > 256, "encoded key should be larger than input");
    }

    #[test]
    fn test_rsa_spki_large_modulus_rejected() {
        let n = vec![0x01; 9000];
        let e = vec![0x01, 0x00, 0x01];

        let result = rsa_spki_from_n_e(&n, &e);
        assert!(
            matches!(result, Err(VerifyKeyError::KeyRejected(msg)) if msg.contains("RSA modulus too large"))
        );
    }

    #[test]
    fn test_ecdsa_spki_p256() {
        let x = vec![0x01; 32];
        let y = vec![0x02; 32];

        let der = ecdsa_spki_from_x_y(&x, &y, EcCurve::P256).expect("should encode");
        assert_eq!(der[0], 0x30);
        // Point bytes appear in the BIT STRING verbatim
        assert!(der.windows(33).any(|w| w[0] == 0x04 && w[1..] == x[..]));
    }

    #[test]
    fn test_ecdsa_spki_p521_coordinate_len() {
        let x = vec![0x05; 66];
        let y = vec![0x06; 66];

        let der = ecdsa_spki_from_x_y(&x, &y, EcCurve::P521).expect("should encode");
        assert!(!der.is_empty());
    }

    #[test]
    fn test_ecdsa_spki_pads_short_coordinates() {
        // 31-byte coordinate must be left-padded to 32 for P-256
        let x = vec![0x01; 31];
        let y = vec![0x02; 32];

        let der = ecdsa_spki_from_x_y(&x, &y, EcCurve::P256).expect("should encode");
        assert!(der.windows(2).any(|w| w == [0x04, 0x00]));
    }

    #[test]
    fn test_ecdsa_spki_missing_coordinate() {
        let result = ecdsa_spki_from_x_y(&[], &[0x02; 32], EcCurve::P256);
        assert!(matches!(result, Err(VerifyKeyError::KeyRejected(_))));
    }

    #[test]
    fn test_ecdsa_spki_oversized_coordinate() {
        let x = vec![0x01; 40];
        let y = vec![0x02; 32];
        let result = ecdsa_spki_from_x_y(&x, &y, EcCurve::P256);
        assert!(
            matches!(result, Err(VerifyKeyError::KeyRejected(msg)) if msg.contains("too long"))
        );
    }
}
