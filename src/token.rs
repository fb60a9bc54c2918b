//! Token types and decoding
//!
//! Decoding is purely structural: it splits the compact serialization,
//! Base64URL-decodes and JSON-parses the first two segments, and checks the
//! claim shapes the verifier depends on. No cryptography happens here, and
//! the undecoded segments are preserved byte-for-byte because signature
//! verification must run over exactly the bytes the issuer signed.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::limits::{MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_TOKEN_LENGTH};
use crate::url::is_issuer_url;
use crate::utils::base64url;

/// JWT header with required claims typed and the full claim set preserved
#[derive(Debug, Clone, PartialEq)]
pub struct JwtHeader {
    /// Key ID (kid) of the key used to sign the token
    pub kid: String,
    /// Algorithm used to sign the token
    pub alg: String,
    /// All header claims as parsed, including extensions
    pub claims: Map<String, Value>,
}

/// JWT payload with required claims typed and the full claim set preserved
#[derive(Debug, Clone, PartialEq)]
pub struct JwtPayload {
    /// Issuer URL of the token
    pub iss: String,
    /// Expiration time in seconds since the Unix epoch
    pub exp: i64,
    /// Not-before time in seconds since the Unix epoch
    pub nbf: Option<i64>,
    /// All payload claims as parsed, including extensions
    pub claims: Map<String, Value>,
}

/// A decoded (not yet verified) JWT
#[derive(Debug, Clone, PartialEq)]
pub struct Jwt {
    pub header: JwtHeader,
    pub payload: JwtPayload,
    /// Undecoded header segment
    pub header_segment: String,
    /// Undecoded payload segment
    pub payload_segment: String,
    /// Base64URL-encoded signature segment
    pub signature: String,
}

impl Jwt {
    /// Decode a compact-serialized token.
    ///
    /// Splits on `.` into header, payload, and signature. Segments beyond the
    /// third are ignored — intentional leniency towards the format's
    /// right-to-left ambiguity, kept as documented behavior. Fewer than three
    /// segments is `Malformed`.
    ///
    /// Fails with [`Error::Malformed`] when a segment is not Base64URL/JSON,
    /// and with [`Error::Invalid`] when the parsed claims lack the required
    /// shape (string `kid`/`alg`, `typ` of `"JWT"`, issuer-URL `iss`, numeric
    /// `exp`, numeric `nbf` when present).
    pub fn decode(value: &str) -> Result<Self> {
        if value.len() > MAX_TOKEN_LENGTH {
            return Err(Error::Malformed(format!(
                "token too large: {} bytes (max: {MAX_TOKEN_LENGTH})",
                value.len()
            )));
        }

        let mut segments = value.splitn(4, '.');
        let missing = || Error::Malformed("expected three '.'-separated segments".into());
        let header_segment = segments.next().ok_or_else(missing)?;
        let payload_segment = segments.next().ok_or_else(missing)?;
        let signature = segments.next().ok_or_else(missing)?;

        let header_json = base64url::decode_string(header_segment, MAX_DECODED_HEADER_SIZE)?;
        let payload_json = base64url::decode_string(payload_segment, MAX_DECODED_PAYLOAD_SIZE)?;

        let header_value: Value = serde_json::from_str(&header_json)
            .map_err(|e| Error::Malformed(format!("header is not JSON: {e}")))?;
        let payload_value: Value = serde_json::from_str(&payload_json)
            .map_err(|e| Error::Malformed(format!("payload is not JSON: {e}")))?;

        Ok(Jwt {
            header: parse_header(header_value)?,
            payload: parse_payload(payload_value)?,
            header_segment: header_segment.to_string(),
            payload_segment: payload_segment.to_string(),
            signature: signature.to_string(),
        })
    }

    /// The exact bytes the signature covers: `header.payload`, undecoded
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header_segment, self.payload_segment)
    }
}

fn parse_header(value: Value) -> Result<JwtHeader> {
    let Value::Object(claims) = value else {
        return Err(Error::Invalid("header is not an object"));
    };

    let Some(kid) = claims.get("kid").and_then(Value::as_str) else {
        return Err(Error::Invalid("header kid must be a string"));
    };
    let Some(alg) = claims.get("alg").and_then(Value::as_str) else {
        return Err(Error::Invalid("header alg must be a string"));
    };
    if claims.get("typ").and_then(Value::as_str) != Some("JWT") {
        return Err(Error::Invalid("header typ must be \"JWT\""));
    }

    Ok(JwtHeader {
        kid: kid.to_string(),
        alg: alg.to_string(),
        claims,
    })
}

fn parse_payload(value: Value) -> Result<JwtPayload> {
    let Value::Object(claims) = value else {
        return Err(Error::Invalid("payload is not an object"));
    };

    let iss = match claims.get("iss").and_then(Value::as_str) {
        Some(iss) if is_issuer_url(iss) => iss.to_string(),
        _ => return Err(Error::Invalid("payload iss must be an issuer URL")),
    };

    let Some(exp) = claims.get("exp").and_then(as_seconds) else {
        return Err(Error::Invalid("payload exp must be a number"));
    };

    let nbf = match claims.get("nbf") {
        None => None,
        Some(value) => match as_seconds(value) {
            Some(nbf) => Some(nbf),
            None => return Err(Error::Invalid("payload nbf must be a number")),
        },
    };

    Ok(JwtPayload {
        iss,
        exp,
        nbf,
        claims,
    })
}

/// Epoch-second claims are numbers; fractional values truncate
fn as_seconds(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}
