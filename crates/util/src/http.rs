//! # HTTP Utilities
//!
//! Response parsing helpers shared by the transport and the engine: strict and
//! lenient JSON decoding, friendly hints for common status codes, and
//! percent-encoding for values embedded in API paths.

use std::borrow::Borrow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::redact_sensitive;

/// Characters left as-is when encoding query values; everything else is escaped.
const QUERY_VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Return a user-friendly error message for common HTTP status codes.
///
/// # Example
/// ```rust
/// use vro_util::http::status_error_message;
///
/// let error_401 = status_error_message(401).unwrap();
/// assert!(error_401.contains("Unauthorized"));
///
/// let error_404 = status_error_message(404).unwrap();
/// assert!(error_404.contains("Not Found"));
///
/// assert!(status_error_message(500).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: check the vRO username and password".into()),
        403 => Some("Forbidden (403). Hint: the user may lack permission to run this workflow".into()),
        404 => Some("Not Found (404). Hint: check the workflow id and the vRO host/port".into()),
        _ => None,
    }
}

/// Describe a status for error messages, appending the hint when one exists.
pub fn describe_status(status: impl Borrow<StatusCode>) -> String {
    let status = *status.borrow();
    match status_error_message(status.as_u16()) {
        Some(hint) => format!("{status}: {hint}"),
        None => status.to_string(),
    }
}

/// Percent-encode a value embedded in a query string.
///
/// # Example
/// ```rust
/// use vro_util::http::encode_query_value;
///
/// assert_eq!(encode_query_value("test-workflow"), "test-workflow");
/// assert_eq!(encode_query_value("my workflow&x"), "my%20workflow%26x");
/// ```
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE_ENCODE_SET).to_string()
}

/// Parse response text as JSON, returning `None` when it is empty or malformed.
pub fn parse_response_json(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<Value>(text).ok()
}

/// Parse HTTP response text into JSON, providing detailed errors on failure.
///
/// Any parsing error is decorated with the originating HTTP status code plus a
/// truncated, redacted preview of the response body.
pub fn parse_response_json_strict(text: &str, status: Option<StatusCode>) -> Result<Value, JsonParseError> {
    serde_json::from_str::<Value>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        let preview = redact_sensitive(&truncate_response_preview(text, 200));

        JsonParseError::new(status_note, error, preview)
    })
}

fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    /// Access the truncated response preview captured during parsing.
    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}
