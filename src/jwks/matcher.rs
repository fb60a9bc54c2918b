//! FAPI-style JWK selection
//!
//! Issuers may publish several keys sharing one `kid`
//! ([FAPI duplicate key identifiers](https://openid.net/specs/openid-financial-api-part-2-1_0.html#duplicate-key-identifiers)).
//! Candidates are disambiguated by scoring a fixed, ordered set of dedup
//! claims (`use`, `alg`, `kty`, `crv`) against the claims the token implies.

use crate::jwks::Jwk;

/// Claims a token implies about its signing key.
///
/// `kty` and `crv` are not carried by tokens directly; they are inferred from
/// the header's `alg` at construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MatchClaims {
    pub key_use: Option<String>,
    pub alg: Option<String>,
    pub kty: Option<String>,
    pub crv: Option<String>,
}

impl MatchClaims {
    pub(crate) fn derive(key_use: Option<&str>, alg: Option<&str>) -> Self {
        Self {
            key_use: key_use.map(str::to_string),
            alg: alg.map(str::to_string),
            kty: alg.and_then(kty_for_alg).map(str::to_string),
            crv: alg.and_then(crv_for_alg).map(str::to_string),
        }
    }
}

/// Infer the JWK key type from an algorithm name prefix.
///
/// Works on the raw header string so unknown algorithms simply yield no
/// inference instead of failing the lookup.
fn kty_for_alg(alg: &str) -> Option<&'static str> {
    if alg.starts_with("RS") || alg.starts_with("PS") {
        Some("RSA")
    } else if alg.starts_with("ES") {
        Some("EC")
    } else if alg.starts_with("HS") {
        Some("oct")
    } else {
        None
    }
}

/// Infer the curve from an ECDSA algorithm name. `ES512` uses P-521 per
/// RFC 7518 Section 3.4.
fn crv_for_alg(alg: &str) -> Option<&'static str> {
    match alg {
        "ES256" => Some("P-256"),
        "ES384" => Some("P-384"),
        "ES512" => Some("P-521"),
        _ => None,
    }
}

/// Select the best key among candidates already filtered to the wanted `kid`.
///
/// A claim present on both sides that disagrees disqualifies the candidate; a
/// claim present on both sides that agrees scores one point; a claim missing
/// on either side is skipped. Highest score wins, ties resolve to the first
/// candidate encountered. A single candidate is returned without scoring.
pub(crate) fn select_key<'a>(candidates: &[&'a Jwk], claims: &MatchClaims) -> Option<&'a Jwk> {
    if candidates.len() <= 1 {
        return candidates.first().copied();
    }

    let mut best: Option<(&'a Jwk, usize)> = None;

    'candidates: for key in candidates {
        let mut score = 0;

        for (wanted, declared) in [
            (claims.key_use.as_deref(), key.key_use.as_deref()),
            (claims.alg.as_deref(), key.alg.as_deref()),
            (claims.kty.as_deref(), key.kty.as_deref()),
            (claims.crv.as_deref(), key.crv.as_deref()),
        ] {
            // Skip claims undefined on either side.
            let (Some(wanted), Some(declared)) = (wanted, declared) else {
                continue;
            };
            // Omit the candidate entirely on a mismatch.
            if wanted != declared {
                continue 'candidates;
            }
            score += 1;
        }

        if best.is_none_or(|(_, s)| score > s) {
            best = Some((key, score));
        }
    }

    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key_use: Option<&str>, alg: Option<&str>, kty: Option<&str>, crv: Option<&str>) -> Jwk {
        Jwk {
            key_use: key_use.map(str::to_string),
            alg: alg.map(str::to_string),
            kty: kty.map(str::to_string),
            crv: crv.map(str::to_string),
            ..Jwk::for_kid("123")
        }
    }

    #[test]
    fn test_single_candidate_returned_directly() {
        let only = key(Some("enc"), Some("RS256"), None, None);
        let claims = MatchClaims::derive(Some("sig"), Some("RS256"));

        // No scoring, no disqualification: one kid match wins outright.
        assert_eq!(select_key(&[&only], &claims), Some(&only));
    }

    #[test]
    fn test_no_candidates() {
        let claims = MatchClaims::derive(Some("sig"), Some("RS256"));
        assert_eq!(select_key(&[], &claims), None);
    }

    #[test]
    fn test_highest_overlap_wins() {
        let enc = key(Some("enc"), Some("RS256"), Some("RSA"), None);
        let partial = key(Some("sig"), Some("RS256"), None, None);
        let full = key(Some("sig"), Some("RS256"), Some("RSA"), None);
        let claims = MatchClaims::derive(Some("sig"), Some("RS256"));

        let selected = select_key(&[&enc, &partial, &full], &claims);
        assert_eq!(selected, Some(&full));
    }

    #[test]
    fn test_disagreement_disqualifies() {
        // Would score 3 on alg/kty/crv, but disagrees on use.
        let wrong_use = key(Some("enc"), Some("ES256"), Some("EC"), Some("P-256"));
        let sparse = key(Some("sig"), None, None, None);
        let claims = MatchClaims::derive(Some("sig"), Some("ES256"));

        let selected = select_key(&[&wrong_use, &sparse], &claims);
        assert_eq!(selected, Some(&sparse));
    }

    #[test]
    fn test_tie_resolves_to_first() {
        let first = key(Some("sig"), None, None, None);
        let second = key(None, Some("RS256"), None, None);
        let claims = MatchClaims::derive(Some("sig"), Some("RS256"));

        // Both score 1; the first candidate encountered wins.
        assert_eq!(select_key(&[&first, &second], &claims), Some(&first));
    }

    #[test]
    fn test_missing_claims_are_neutral() {
        let bare = key(None, None, None, None);
        let scored = key(Some("sig"), None, None, None);
        let claims = MatchClaims::derive(Some("sig"), None);

        assert_eq!(select_key(&[&bare, &scored], &claims), Some(&scored));
    }

    #[test]
    fn test_derive_infers_kty_and_crv() {
        assert_eq!(
            MatchClaims::derive(Some("sig"), Some("HS256")).kty.as_deref(),
            Some("oct")
        );
        assert_eq!(
            MatchClaims::derive(Some("sig"), Some("PS256")).kty.as_deref(),
            Some("RSA")
        );

        let es512 = MatchClaims::derive(Some("sig"), Some("ES512"));
        assert_eq!(es512.kty.as_deref(), Some("EC"));
        assert_eq!(es512.crv.as_deref(), Some("P-521"));

        let unknown = MatchClaims::derive(Some("sig"), Some("OTHER"));
        assert_eq!(unknown.kty, None);
        assert_eq!(unknown.crv, None);
    }
}
