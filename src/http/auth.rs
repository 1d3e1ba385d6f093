//! HTTP authentication utilities

use crate::error::{EstateError, Result};
use base64::Engine;
use serde_json::Value;

/// Authentication helper
pub struct Auth;

impl Auth {
    /// Create bearer token header value
    pub fn bearer_token(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Parse email:password format
    pub fn parse_credentials(input: &str) -> Result<(String, String)> {
        match input.split_once(':') {
            Some((email, password)) if !email.trim().is_empty() => {
                Ok((email.trim().to_string(), password.to_string()))
            }
            _ => Err(EstateError::Auth(
                "Invalid credentials format, expected EMAIL:PASSWORD".to_string(),
            )),
        }
    }

    /// Read the `exp` claim of a JWT without verifying it
    pub fn token_expiry(token: &str) -> Option<u64> {
        let payload = token.split('.').nth(1)?;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: Value = serde_json::from_slice(&bytes).ok()?;
        claims.get("exp")?.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::Auth;
    use base64::Engine;

    #[test]
    fn parse_credentials_splits_on_first_colon() {
        let (email, password) = Auth::parse_credentials("a@b.c:pa:ss").expect("parsed");
        assert_eq!(email, "a@b.c");
        assert_eq!(password, "pa:ss");
        assert!(Auth::parse_credentials("no-colon").is_err());
        assert!(Auth::parse_credentials(":secret").is_err());
    }

    #[test]
    fn token_expiry_reads_exp_claim() {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let token = format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"HS256"}"#),
            engine.encode(br#"{"sub":"u1","exp":1700000000}"#)
        );
        assert_eq!(Auth::token_expiry(&token), Some(1_700_000_000));
        assert_eq!(Auth::token_expiry("opaque-token"), None);
    }

    #[test]
    fn bearer_token_formats_header() {
        assert_eq!(Auth::bearer_token("T1"), "Bearer T1");
    }
}
