//! Shared-secret verification for inbound webhook calls.
//!
//! The provider echoes the `secret_token` given to `setWebhook` in the
//! `X-Telegram-Bot-Api-Secret-Token` header of every delivery.

use axum::http::HeaderMap;
use tracing::warn;

/// Header the provider carries the shared secret in.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Check the request headers against the configured secret.
///
/// With no secret configured every request passes, whatever it carries.
pub fn verify_secret_header(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());

    match provided {
        Some(provided) if constant_time_compare(expected, provided) => true,
        Some(provided) => {
            warn!(
                expected_length = expected.len(),
                actual_length = provided.len(),
                "webhook_secret_mismatch"
            );
            false
        }
        None => {
            warn!("webhook_secret_missing");
            false
        }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SECRET_HEADER, HeaderValue::from_str(secret).unwrap());
        headers
    }

    #[test]
    fn test_no_secret_configured_allows_anything() {
        assert!(verify_secret_header(None, &HeaderMap::new()));
        assert!(verify_secret_header(None, &headers_with("whatever")));
    }

    #[test]
    fn test_matching_secret() {
        assert!(verify_secret_header(Some("S1"), &headers_with("S1")));
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-telegram-bot-api-secret-token",
            HeaderValue::from_static("S1"),
        );
        assert!(verify_secret_header(Some("S1"), &headers));
    }

    #[test]
    fn test_wrong_or_missing_secret() {
        assert!(!verify_secret_header(Some("S1"), &headers_with("wrong")));
        assert!(!verify_secret_header(Some("S1"), &headers_with("S12")));
        assert!(!verify_secret_header(Some("S1"), &HeaderMap::new()));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
