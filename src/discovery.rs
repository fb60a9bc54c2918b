//! Discovery fetching
//!
//! Stateless HTTP lookups for the two-stage
//! [OIDC Discovery](https://openid.net/specs/openid-connect-discovery-1_0.html)
//! protocol: configuration document first, keyset document second. Absence —
//! a non-2xx status, a network failure, unparseable JSON, or a schema
//! mismatch — is an expected steady-state outcome and comes back as `None`,
//! never as an error. Falling back to the conventional
//! `.well-known/jwks.json` path is the resolver's decision, not this
//! module's.

use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

use crate::jwks::Jwk;
use crate::limits::{MAX_DISCOVERY_RESPONSE_SIZE, MAX_JWKS_RESPONSE_SIZE};

/// Issue a single GET for a JSON document, bounded by `max_size`
async fn fetch_json(client: &reqwest::Client, url: &str, max_size: usize) -> Option<Value> {
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .inspect_err(|e| debug!(url, error = %e, "discovery request failed"))
        .ok()?;

    let status = response.status();
    if !status.is_success() {
        debug!(url, %status, "discovery request rejected");
        return None;
    }

    let bytes = response.bytes().await.ok()?;
    if bytes.len() > max_size {
        debug!(url, size = bytes.len(), max_size, "discovery response too large");
        return None;
    }

    serde_json::from_slice(&bytes)
        .inspect_err(|e| debug!(url, error = %e, "discovery response is not JSON"))
        .ok()
}

/// Fetch a configuration document and extract its `jwks_uri`
pub(crate) async fn fetch_config(client: &reqwest::Client, url: &str) -> Option<String> {
    let document = fetch_json(client, url, MAX_DISCOVERY_RESPONSE_SIZE).await?;
    let jwks_uri = document.get("jwks_uri")?.as_str()?;

    if jwks_uri.trim().is_empty() {
        return None;
    }

    Some(jwks_uri.to_string())
}

/// Fetch a keyset document and return its keys.
///
/// Individual entries that lack a string `kid` or otherwise fail to parse are
/// skipped; a missing or malformed `keys` array makes the whole document
/// absent.
pub(crate) async fn fetch_keyset(client: &reqwest::Client, url: &str) -> Option<Vec<Jwk>> {
    let document = fetch_json(client, url, MAX_JWKS_RESPONSE_SIZE).await?;
    let keys = document.get("keys")?.as_array()?;

    Some(
        keys.iter()
            .filter_map(|key| serde_json::from_value::<Jwk>(key.clone()).ok())
            .collect(),
    )
}
