use std::error::Error as _;

use thiserror::Error;
use vro_util::http::JsonParseError;

/// Failure to complete an HTTP exchange with the server.
///
/// Status codes are not errors at this layer; callers decide which statuses
/// they accept.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Error validating the server's certificate for {url}: {message}")]
    Tls { url: String, message: String },

    #[error("Error connecting to {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Request to {url} timed out: {message}")]
    Timeout { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Could not build the HTTP client: {message}")]
    Client { message: String },

    #[error(transparent)]
    Decode(#[from] JsonParseError),
}

impl TransportError {
    /// Classify a `reqwest` failure, folding its source chain into the message.
    pub(crate) fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        let message = error_chain(error);
        let url = url.to_string();
        if error.is_builder() {
            Self::InvalidUrl { url, message }
        } else if error.is_timeout() {
            Self::Timeout { url, message }
        } else if is_certificate_failure(&message) {
            Self::Tls { url, message }
        } else if error.is_connect() {
            Self::Connection { url, message }
        } else {
            Self::Request { url, message }
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// reqwest has no TLS error kind, so certificate failures are recognised by
/// the text of the source chain. Other handshake failures (protocol or cipher
/// mismatch) are not matched and surface as connection errors.
fn is_certificate_failure(message: &str) -> bool {
    message.to_ascii_lowercase().contains("certificate")
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
