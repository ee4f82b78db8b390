//! Read-only access to access-token claims.
//!
//! Signatures are not checked: the server does that. The client only needs
//! `exp` to decide when to refresh and a subject to identify the user.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::identity;

/// Claim names that may carry the user id, in lookup order.
const SUBJECT_CLAIMS: [&str; 5] = ["sub", "userId", "uid", "id", "user_id"];

/// Decodes the payload segment of a JWT.
pub fn claims(token: &str) -> Option<Map<String, Value>> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Expiry as seconds since the epoch.
pub fn expires_at(token: &str) -> Option<i64> {
    let exp = claims(token)?.remove("exp")?;
    exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs as i64))
}

/// A token without a readable `exp` counts as expired.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_none_or(|exp| exp <= now.timestamp())
}

/// First usable user id found in the claims.
pub fn subject(token: &str) -> Option<String> {
    let claims = claims(token)?;
    SUBJECT_CLAIMS
        .iter()
        .filter_map(|name| claims.get(*name))
        .find_map(identity::usable_id)
}

#[cfg(test)]
pub(crate) fn encode_for_tests(payload: &Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.signature",
        engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        engine.encode(payload.to_string())
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn exp_decides_expiry() {
        let fresh = encode_for_tests(&json!({ "exp": 1_700_000_060 }));
        let stale = encode_for_tests(&json!({ "exp": 1_700_000_000 }));
        assert!(!is_expired(&fresh, now()));
        assert!(is_expired(&stale, now()));
    }

    #[test]
    fn unreadable_tokens_are_expired() {
        assert!(is_expired("not-a-jwt", now()));
        assert!(is_expired("a.%%%.c", now()));
        let no_exp = encode_for_tests(&json!({ "sub": "u-1" }));
        assert!(is_expired(&no_exp, now()));
    }

    #[test]
    fn subject_skips_unusable_claims() {
        let token = encode_for_tests(&json!({ "sub": "undefined", "userId": 12 }));
        assert_eq!(subject(&token).as_deref(), Some("12"));

        let token = encode_for_tests(&json!({ "sub": "", "uid": "abc" }));
        assert_eq!(subject(&token).as_deref(), Some("abc"));

        let token = encode_for_tests(&json!({ "exp": 1 }));
        assert_eq!(subject(&token), None);
    }
}
