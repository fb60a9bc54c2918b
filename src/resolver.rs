//! Caching key resolution
//!
//! A [`KeyResolver`] answers one question: does this issuer possess a key
//! matching this kid/algorithm/usage tuple, fresh enough to trust? It drives
//! the discovery fetchers through the TTL cache and applies FAPI-style
//! selection when several keys share a `kid`.
//!
//! Absence of a key is an ordinary outcome, not an error: unreachable
//! issuers, malformed documents, and unknown kids all come back as `None`,
//! and negative results are cached under the shorter `retry_delay` so
//! persistently absent keys do not hammer their issuer.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, trace, warn};

use crate::cache::TtlCache;
use crate::discovery::{fetch_config, fetch_keyset};
use crate::jwks::Jwk;
use crate::jwks::matcher::{self, MatchClaims};
use crate::token::Jwt;
use crate::url::{normalize_issuer, validate_issuer};

const DEFAULT_MAX: usize = 1000;
const DEFAULT_TTL: Duration = Duration::from_secs(86_400);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for a [`KeyResolver`]
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    issuers: Vec<String>,
    max: usize,
    ttl: Duration,
    ttl_discovery: Duration,
    ttl_jwks: Duration,
    retry_delay: Duration,
}

impl ResolverOptions {
    /// Options with the given issuer allow-list and default cache parameters
    /// (1000 entries, 24 h TTLs, 60 s retry delay for absent results)
    pub fn new<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            issuers: issuers.into_iter().map(Into::into).collect(),
            max: DEFAULT_MAX,
            ttl: DEFAULT_TTL,
            ttl_discovery: DEFAULT_TTL,
            ttl_jwks: DEFAULT_TTL,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Cache entry cap enforced by the sweep
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    /// TTL for resolved keys
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// TTL for cached discovery documents
    pub fn ttl_discovery(mut self, ttl: Duration) -> Self {
        self.ttl_discovery = ttl;
        self
    }

    /// TTL for cached keyset documents
    pub fn ttl_jwks(mut self, ttl: Duration) -> Self {
        self.ttl_jwks = ttl;
        self
    }

    /// TTL applied to absent results
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Claims identifying the wanted key
#[derive(Debug, Clone, Copy)]
pub struct KeyRequest<'a> {
    /// Token issuer
    pub iss: &'a str,
    /// Key ID from the token header; resolution fails without one
    pub kid: Option<&'a str>,
    /// Algorithm from the token header
    pub alg: Option<&'a str>,
    /// Intended key use, normally `"sig"`
    pub key_use: Option<&'a str>,
}

impl<'a> KeyRequest<'a> {
    /// Request for the key that signed `jwt`
    pub fn for_signing(jwt: &'a Jwt) -> Self {
        Self {
            iss: &jwt.payload.iss,
            kid: Some(&jwt.header.kid),
            alg: Some(&jwt.header.alg),
            key_use: Some("sig"),
        }
    }
}

/// The cache stores three document kinds under disjoint key namespaces:
/// discovery URLs, keyset URIs, and serialized claim tuples.
#[derive(Clone)]
enum CacheValue {
    JwksUri(String),
    Keys(Arc<Vec<Jwk>>),
    Key(Arc<Jwk>),
}

/// Caching JWK resolver compatible with
/// [OIDC Discovery](https://openid.net/specs/openid-connect-discovery-1_0.html)
/// and
/// [FAPI JWKS selection](https://openid.net/specs/openid-financial-api-part-2-1_0.html#duplicate-key-identifiers).
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct KeyResolver {
    inner: Arc<Inner>,
}

struct Inner {
    issuers: HashSet<String>,
    cache: TtlCache<CacheValue>,
    client: reqwest::Client,
    ttl: Duration,
    ttl_discovery: Duration,
    ttl_jwks: Duration,
}

impl KeyResolver {
    /// Resolver with a default HTTP client
    pub fn new(options: ResolverOptions) -> Self {
        Self::with_client(options, reqwest::Client::new())
    }

    /// Resolver with a caller-provided HTTP client.
    ///
    /// The client is the deadline seam: configure connect/request timeouts on
    /// it so a slow issuer cannot stall verification indefinitely.
    pub fn with_client(options: ResolverOptions, client: reqwest::Client) -> Self {
        let issuers = options
            .issuers
            .iter()
            .filter(|issuer| {
                let ok = validate_issuer(issuer);
                if !ok {
                    warn!(issuer, "ignoring invalid configured issuer");
                }
                ok
            })
            .map(|issuer| normalize_issuer(issuer).to_string())
            .collect();

        Self {
            inner: Arc::new(Inner {
                issuers,
                cache: TtlCache::new(options.max, options.retry_delay),
                client,
                ttl: options.ttl,
                ttl_discovery: options.ttl_discovery,
                ttl_jwks: options.ttl_jwks,
            }),
        }
    }

    /// Whether an issuer is in the configured allow-list
    pub fn is_trusted(&self, iss: &str) -> bool {
        self.inner.issuers.contains(normalize_issuer(iss))
    }

    /// Resolve the key a request describes.
    ///
    /// Requests without a `kid`, or for issuers outside the allow-list, fail
    /// immediately without any network traffic. Results — present or absent —
    /// are cached under the serialized claim tuple.
    pub async fn resolve(&self, request: &KeyRequest<'_>) -> Option<Jwk> {
        let Some(kid) = request.kid else {
            trace!("key request without kid");
            return None;
        };

        let iss = normalize_issuer(request.iss);
        if !self.inner.issuers.contains(iss) {
            trace!(iss, "issuer not in allow-list");
            return None;
        }

        let claims = MatchClaims::derive(request.key_use, request.alg);
        let cache_key = json!({
            "iss": iss,
            "kid": kid,
            "use": claims.key_use,
            "alg": claims.alg,
            "kty": claims.kty,
            "crv": claims.crv,
        })
        .to_string();

        let lookup = self.inner.cache.get(&cache_key, self.inner.ttl, {
            let inner = Arc::clone(&self.inner);
            let iss = iss.to_string();
            let kid = kid.to_string();
            let claims = claims.clone();
            async move {
                inner
                    .resolve_key(&iss, &kid, &claims)
                    .await
                    .map(|jwk| CacheValue::Key(Arc::new(jwk)))
            }
        });

        match lookup.value.await {
            Some(CacheValue::Key(jwk)) => Some(Jwk::clone(&jwk)),
            _ => None,
        }
    }
}

impl Inner {
    /// Run the discovery rounds for one claim tuple.
    ///
    /// At most one stale-cache retry: a second round runs only when the first
    /// consumed a cached discovery document and the keyset stage missed, and
    /// is skipped when the fresh fetch reproduces the URI already searched.
    async fn resolve_key(&self, iss: &str, kid: &str, claims: &MatchClaims) -> Option<Jwk> {
        let well_known = format!("{iss}/.well-known/");
        let discovery_url = format!("{well_known}openid-configuration");
        let fallback_url = format!("{well_known}jwks.json");

        let mut cached_jwks_uri: Option<String> = None;

        let mut attempts_remaining = 2;
        while attempts_remaining > 0 {
            attempts_remaining -= 1;

            let lookup = self.cache.get(&discovery_url, self.ttl_discovery, {
                let client = self.client.clone();
                let url = discovery_url.clone();
                async move { fetch_config(&client, &url).await.map(CacheValue::JwksUri) }
            });
            let jwks_uri = match lookup.value.await {
                Some(CacheValue::JwksUri(uri)) => uri,
                // Failed or non-standard discovery: conventional keyset path.
                _ => fallback_url.clone(),
            };

            // A fresh fetch that reproduces the URI already searched cannot
            // change the outcome.
            if cached_jwks_uri.as_deref() == Some(jwks_uri.as_str()) {
                break;
            }
            if lookup.cached {
                cached_jwks_uri = Some(jwks_uri.clone());
            }

            if let Some(jwk) = self.match_in_keyset(&jwks_uri, kid, claims).await {
                return Some(jwk);
            }

            if !lookup.cached {
                break;
            }
            debug!(iss, kid, "key absent via cached discovery document, retrying fresh");
            self.cache.invalidate(&discovery_url);
        }

        debug!(iss, kid, "no matching key");
        None
    }

    /// Look the wanted key up in one keyset, retrying exactly once with the
    /// cache entry dropped when a cached keyset missed.
    async fn match_in_keyset(&self, jwks_uri: &str, kid: &str, claims: &MatchClaims) -> Option<Jwk> {
        let mut attempts_remaining = 2;
        while attempts_remaining > 0 {
            attempts_remaining -= 1;

            let lookup = self.cache.get(jwks_uri, self.ttl_jwks, {
                let client = self.client.clone();
                let url = jwks_uri.to_string();
                async move {
                    fetch_keyset(&client, &url)
                        .await
                        .map(|keys| CacheValue::Keys(Arc::new(keys)))
                }
            });
            let keys = match lookup.value.await {
                Some(CacheValue::Keys(keys)) => keys,
                _ => Arc::new(Vec::new()),
            };

            let candidates: Vec<&Jwk> = keys.iter().filter(|key| key.kid == kid).collect();
            if let Some(jwk) = matcher::select_key(&candidates, claims) {
                return Some(jwk.clone());
            }

            // A fresh keyset that still misses is authoritative.
            if !lookup.cached {
                return None;
            }
            debug!(jwks_uri, kid, "key absent in cached keyset, retrying fresh");
            self.cache.invalidate(jwks_uri);
        }

        None
    }
}
