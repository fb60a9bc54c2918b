//! Issuer URL validation

use crate::limits::MAX_ISSUER_URL_LENGTH;

/// Check the issuer URL shape required of a token's `iss` claim.
///
/// Issuers are `https://` URLs; plain-`http` is only accepted for loopback
/// hosts (`localhost`, `127.*`, `[::1]`) to keep local development workable
/// without opening the door to arbitrary cleartext issuers.
pub(crate) fn is_issuer_url(value: &str) -> bool {
    if value.is_empty() || value.len() > MAX_ISSUER_URL_LENGTH {
        return false;
    }

    value.starts_with("https://")
        || value == "http://localhost"
        || value.starts_with("http://localhost:")
        || value.starts_with("http://localhost/")
        || value.starts_with("http://127.")
        || value.starts_with("http://[::1]")
}

/// Full validation for configured issuers: shape plus URL well-formedness
pub(crate) fn validate_issuer(value: &str) -> bool {
    if !is_issuer_url(value) {
        return false;
    }

    match value.parse::<url::Url>() {
        Ok(parsed) => parsed.host_str().is_some(),
        Err(_) => false,
    }
}

/// Strip trailing slashes from an issuer before comparison or URL building
pub(crate) fn normalize_issuer(value: &str) -> &str {
    value.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_issuer_url_valid() {
        assert!(is_issuer_url("https://auth.example.com"));
        assert!(is_issuer_url("https://auth.example.com/tenant/"));
        assert!(is_issuer_url("http://localhost"));
        assert!(is_issuer_url("http://localhost:3000"));
        assert!(is_issuer_url("http://localhost/auth"));
        assert!(is_issuer_url("http://127.0.0.1:8080"));
        assert!(is_issuer_url("http://[::1]:8080"));
    }

    #[test]
    fn test_is_issuer_url_invalid() {
        assert!(!is_issuer_url(""));
        assert!(!is_issuer_url("http://example.com"));
        assert!(!is_issuer_url("http://localhost.evil.com"));
        assert!(!is_issuer_url("ftp://example.com"));
        assert!(!is_issuer_url("example.com"));
    }

    #[test]
    fn test_is_issuer_url_too_long() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_ISSUER_URL_LENGTH));
        assert!(!is_issuer_url(&long));
    }

    #[test]
    fn test_validate_issuer() {
        assert!(validate_issuer("https://auth.example.com"));
        assert!(validate_issuer("http://localhost:3000"));
        assert!(!validate_issuer("https://"));
        assert!(!validate_issuer("https://exa mple.com"));
    }

    #[test]
    fn test_normalize_issuer() {
        assert_eq!(normalize_issuer("https://example.com/"), "https://example.com");
        assert_eq!(normalize_issuer("https://example.com//"), "https://example.com");
        assert_eq!(normalize_issuer("https://example.com/a"), "https://example.com/a");
    }
}
