//! Access credential inspection
//!
//! Access credentials are opaque to the client, but when they happen to be
//! JWTs the `exp` claim lets us skip attaching a credential the server is
//! certain to reject. Anything we cannot decode is assumed valid.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiry instant encoded in a JWT access credential
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    // Some issuers pad their segments even though JWTs should not be
    let payload = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&payload).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Whether the access credential is known to be expired at `now`
pub fn access_expired(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jwt(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn opaque_tokens_never_expire() {
        assert!(!access_expired("A1", Utc::now()));
        assert!(!access_expired("a.b.c", Utc::now()));
        assert!(!access_expired("", Utc::now()));
    }

    #[test]
    fn jwt_expiry_is_respected() {
        let now = Utc::now();
        let past = jwt(&format!(r#"{{"exp":{}}}"#, (now - Duration::minutes(1)).timestamp()));
        let future = jwt(&format!(r#"{{"exp":{}}}"#, (now + Duration::minutes(5)).timestamp()));

        assert!(access_expired(&past, now));
        assert!(!access_expired(&future, now));
    }

    #[test]
    fn jwt_without_exp_is_valid() {
        let token = jwt(r#"{"user_id":7}"#);
        assert!(expires_at(&token).is_none());
        assert!(!access_expired(&token, Utc::now()));
    }
}
