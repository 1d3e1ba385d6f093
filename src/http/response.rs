//! HTTP response handling and formatting

use crate::error::Result;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wrapper shape used by most backend responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Decode a payload that may or may not be wrapped in an envelope.
///
/// An object with a non-null `data` field is tried as an envelope first; if
/// `data` does not match `T` the whole document is tried as a bare payload.
pub fn decode_payload<T: DeserializeOwned>(value: Value) -> Result<T> {
    if let Value::Object(map) = &value {
        if let Some(data) = map.get("data").filter(|d| !d.is_null()) {
            if let Ok(decoded) = serde_json::from_value(data.clone()) {
                return Ok(decoded);
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Pull a human-readable message out of an error response body
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                if !message.is_empty() {
                    return message.clone();
                }
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

/// Response formatter for CLI output
pub struct ResponseFormatter {
    format_json: bool,
}

impl ResponseFormatter {
    pub fn new(format_json: bool) -> Self {
        Self { format_json }
    }

    /// Render a decoded value, pretty-printed when enabled
    pub fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.format_json {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_payload, error_message, ResponseFormatter};
    use reqwest::StatusCode;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Token {
        #[serde(rename = "accessToken")]
        access_token: String,
    }

    #[test]
    fn decode_payload_unwraps_envelope() {
        let value = json!({ "status": "success", "message": "ok", "data": { "accessToken": "T2" } });
        let token: Token = decode_payload(value).expect("decoded");
        assert_eq!(token.access_token, "T2");
    }

    #[test]
    fn decode_payload_accepts_bare_payload() {
        let token: Token = decode_payload(json!({ "accessToken": "T2" })).expect("decoded");
        assert_eq!(token.access_token, "T2");
    }

    #[test]
    fn decode_payload_falls_back_when_data_is_unrelated() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            data: Vec<u32>,
            extra: bool,
        }
        let wrapper: Wrapper = decode_payload(json!({ "data": [1, 2], "extra": true })).expect("decoded");
        assert_eq!(wrapper.data, vec![1, 2]);
        assert!(wrapper.extra);
    }

    #[test]
    fn error_message_prefers_json_message() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"status":"error","message":"Invalid credentials"}"#);
        assert_eq!(msg, "Invalid credentials");
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
    }

    #[test]
    fn formatter_pretty_prints() {
        let out = ResponseFormatter::new(true)
            .format(&json!({ "a": 1 }))
            .expect("formatted");
        assert_eq!(out, "{\n  \"a\": 1\n}");
    }
}
