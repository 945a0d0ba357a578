//! Structured error extraction for non-2xx responses.
//!
//! The API answers failures in one of three shapes:
//!
//! ```json
//! { "error": { "code": 40401, "message": "トークが見つかりません" } }
//! { "status": 400, "error": "invalid parameter" }
//! ```
//!
//! or, for some routes, a full HTML page with a
//! `<p class="errorMessage">…</p>` element.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::Error;

/// A structured error returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("API error {code} (HTTP {status}): {message}")]
pub struct ApiError {
    /// API-level status code. Falls back to the HTTP status when the body
    /// carries none.
    pub code: i64,

    /// HTTP status code of the response.
    pub status: u16,

    /// Human-readable message, translated when a translation is known.
    pub message: String,
}

/// Message used when an HTML error page has no `errorMessage` element.
pub const UNKNOWN_MESSAGE: &str = "N/A";

/// Known Japanese error messages and their English equivalents.
const TRANSLATIONS: &[(&str, &str)] = &[
    ("トークが見つかりません", "Talk not found"),
    ("ユーザーが見つかりません", "User not found"),
    ("投稿が見つかりません", "Post not found"),
    ("ページが見つかりません", "Page not found"),
    ("リクエストが不正です", "Invalid request"),
    ("アクセスが集中しています", "Too many requests"),
];

static ERROR_MESSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<p class="errorMessage">(.*?)</p>"#).expect("invalid errorMessage regex")
});

/// Rewrite a known localized message to `"<English> (<original>)"`.
///
/// Unknown messages are returned unchanged.
pub fn translate(message: &str) -> String {
    TRANSLATIONS
        .iter()
        .find(|(original, _)| *original == message)
        .map(|(original, english)| format!("{english} ({original})"))
        .unwrap_or_else(|| message.to_string())
}

/// Turn a non-2xx response into an [`Error`].
///
/// Produces [`Error::Api`] when the body is a recognised JSON error or an
/// HTML page, and [`Error::Transport`] otherwise so the raw body is never
/// lost.
pub fn extract(status: u16, body: &str) -> Error {
    let parsed = match serde_json::from_str::<Value>(body) {
        Ok(json) => from_json(status, &json),
        Err(_) => from_html(status, body),
    };
    match parsed {
        Some(api) => Error::Api(api),
        None => Error::Transport {
            status,
            body: body.to_string(),
        },
    }
}

fn from_json(status: u16, json: &Value) -> Option<ApiError> {
    let (code, message) = match json.get("error")? {
        Value::Object(error) => (
            error.get("code").and_then(as_code),
            error
                .get("message")
                .map(as_message)
                .unwrap_or_else(|| UNKNOWN_MESSAGE.to_string()),
        ),
        Value::Null => return None,
        flat => (json.get("status").and_then(as_code), as_message(flat)),
    };

    Some(ApiError {
        code: code.unwrap_or(i64::from(status)),
        status,
        message: translate(&message),
    })
}

fn from_html(status: u16, body: &str) -> Option<ApiError> {
    let message = match ERROR_MESSAGE_RE.captures(body) {
        Some(caps) => caps[1].trim().to_string(),
        None if looks_like_html(body) => UNKNOWN_MESSAGE.to_string(),
        None => return None,
    };

    Some(ApiError {
        code: i64::from(status),
        status,
        message: translate(&message),
    })
}

fn looks_like_html(body: &str) -> bool {
    let trimmed = body.trim_start();
    trimmed.starts_with('<') && trimmed.contains('>')
}

/// Codes arrive as numbers or numeric strings.
fn as_code(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_message(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(err: Error) -> ApiError {
        match err {
            Error::Api(api) => api,
            other => panic!("expected Error::Api, got {other:?}"),
        }
    }

    #[test]
    fn known_message_is_translated_with_original() {
        assert_eq!(
            translate("トークが見つかりません"),
            "Talk not found (トークが見つかりません)"
        );
    }

    #[test]
    fn unknown_message_passes_through() {
        assert_eq!(translate("something else"), "something else");
        // Partial matches are not rewritten.
        assert_eq!(
            translate("トークが見つかりませんでした"),
            "トークが見つかりませんでした"
        );
    }

    #[test]
    fn nested_error_object() {
        let body = r#"{"error":{"code":40401,"message":"トークが見つかりません"}}"#;
        let e = api(extract(404, body));
        assert_eq!(e.code, 40401);
        assert_eq!(e.status, 404);
        assert_eq!(e.message, "Talk not found (トークが見つかりません)");
    }

    #[test]
    fn flat_error_shape() {
        let body = r#"{"status":"400","error":"invalid parameter"}"#;
        let e = api(extract(400, body));
        assert_eq!(e.code, 400);
        assert_eq!(e.message, "invalid parameter");
    }

    #[test]
    fn missing_code_falls_back_to_http_status() {
        let body = r#"{"error":{"message":"boom"}}"#;
        let e = api(extract(503, body));
        assert_eq!(e.code, 503);
        assert_eq!(e.message, "boom");
    }

    #[test]
    fn html_error_page_message_is_recovered() {
        let body = "<html><body>\n<p class=\"errorMessage\">\n  ページが見つかりません\n</p></body></html>";
        let e = api(extract(404, body));
        assert_eq!(e.code, 404);
        assert_eq!(e.message, "Page not found (ページが見つかりません)");
    }

    #[test]
    fn html_without_message_defaults_to_na() {
        let e = api(extract(500, "<html><body>oops</body></html>"));
        assert_eq!(e.message, UNKNOWN_MESSAGE);
    }

    #[test]
    fn json_without_error_field_is_transport_error() {
        match extract(502, r#"{"data":null}"#) {
            Error::Transport { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, r#"{"data":null}"#);
            }
            other => panic!("expected Error::Transport, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_body_is_transport_error() {
        assert!(matches!(
            extract(503, "Service Unavailable"),
            Error::Transport { status: 503, .. }
        ));
    }
}
