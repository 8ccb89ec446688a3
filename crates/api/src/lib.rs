//! vRealize Orchestrator REST transport.
//!
//! This crate provides the single seam through which the workflow engine talks
//! to the orchestration server. It focuses on:
//!
//! - Constructing an HTTP client with basic authentication and JSON headers
//! - Honouring the endpoint's TLS-validation flag
//! - Validating base URL overrides for safety
//! - Decoding JSON responses while surfacing status, final URL and headers
//!
//! The engine depends on the [`Transport`] trait; [`HttpTransport`] is the
//! `reqwest`-backed implementation. Requests block the calling thread.
//!
//! # Example
//!
//! ```ignore
//! use vro_api::{HttpTransport, Transport};
//! use vro_types::{Credentials, ServerEndpoint};
//!
//! let endpoint = ServerEndpoint::new("vro.domain.local", Credentials::new("vcoadmin", "vcoadmin"));
//! let transport = HttpTransport::new(&endpoint)?;
//! let response = transport.get("workflows?conditions=name=test-workflow")?;
//! println!("status: {}", response.status);
//! # Ok::<(), vro_api::TransportError>(())
//! ```

mod error;

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;
use vro_types::{Credentials, ServerEndpoint};
use vro_util::block_on_future;
use vro_util::http::{parse_response_json, parse_response_json_strict};

pub use error::TransportError;
pub use reqwest::{Method, StatusCode};

/// Per-request timeout applied by the HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Hostnames allowed to use plain `http` base URLs.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// What the server answered, with the body already decoded.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    /// Final URL after redirects.
    pub url: Url,
    pub headers: HeaderMap,
    /// Decoded JSON body; `None` when the body was empty.
    pub body: Option<Value>,
}

impl TransportResponse {
    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Issues requests against API paths relative to the server's REST root.
pub trait Transport {
    /// Send a request. A `POST` without a body sends `{}`.
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<TransportResponse, TransportError>;

    fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        self.send(Method::GET, path, None)
    }

    fn post(&self, path: &str, body: Option<&Value>) -> Result<TransportResponse, TransportError> {
        self.send(Method::POST, path, body)
    }
}

/// Options the `reqwest` client is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClientSettings {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl ClientSettings {
    fn for_endpoint(endpoint: &ServerEndpoint) -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
            accept_invalid_certs: !endpoint.validate_certs,
        }
    }

    fn build(self) -> Result<Client, TransportError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Client::builder()
            .default_headers(default_headers)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|error| TransportError::Client {
                message: error.to_string(),
            })
    }
}

/// `reqwest`-backed [`Transport`] bound to one [`ServerEndpoint`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    http: Client,
    credentials: Credentials,
    user_agent: String,
}

impl HttpTransport {
    /// Build a transport for `https://{host}:{port}/vco/api/`.
    pub fn new(endpoint: &ServerEndpoint) -> Result<Self, TransportError> {
        Self::with_base_url(&endpoint.api_base_url(), endpoint)
    }

    /// Build a transport against an explicit API root, keeping the endpoint's
    /// credentials and TLS settings.
    ///
    /// Non-localhost roots must use HTTPS.
    pub fn with_base_url(base_url: &str, endpoint: &ServerEndpoint) -> Result<Self, TransportError> {
        let base_url = validate_base_url(base_url)?;
        let http = ClientSettings::for_endpoint(endpoint).build()?;

        if !endpoint.validate_certs {
            warn!(host = %endpoint.host, "TLS certificate validation is disabled");
        }

        Ok(Self {
            base_url,
            http,
            credentials: endpoint.credentials.clone(),
            user_agent: format!("vro-runner/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API-relative path (which may carry a query string) against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| TransportError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                message: error.to_string(),
            })
    }
}

impl Transport for HttpTransport {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(path)?;
        let start = Instant::now();

        let payload = match (body, &method) {
            (Some(body), _) => Some(body.clone()),
            (None, &Method::POST) => Some(json!({})),
            (None, _) => None,
        };
        debug!(
            method = %method,
            url = %url,
            has_body = payload.is_some(),
            "http request started"
        );

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(header::USER_AGENT, &self.user_agent)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password));
        if let Some(payload) = &payload {
            request = request.json(payload);
        }

        let outcome = block_on_future(async move {
            let result = async {
                let response = request.send().await?;
                let status = response.status();
                let final_url = response.url().clone();
                let headers = response.headers().clone();
                let text = response.text().await?;
                Ok::<_, reqwest::Error>((status, final_url, headers, text))
            }
            .await;
            Ok(result)
        })
        .map_err(|error| TransportError::Client {
            message: error.to_string(),
        })?;

        let (status, final_url, headers, text) = outcome.map_err(|error| {
            let error = TransportError::from_reqwest(url.as_str(), &error);
            warn!(
                method = %method,
                url = %url,
                error = %error,
                duration_ms = start.elapsed().as_millis(),
                "http request failed"
            );
            error
        })?;

        let body = decode_body(&text, status).inspect_err(|error| {
            warn!(
                method = %method,
                url = %url,
                status = %status,
                body_len = text.len(),
                error = %error,
                "http response JSON parse failed"
            );
        })?;
        debug!(
            method = %method,
            url = %url,
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "http request completed"
        );

        Ok(TransportResponse {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}

/// Decode a response body.
///
/// Success responses must carry valid JSON (or nothing). Error responses are
/// decoded leniently so HTML error pages do not mask the status code.
fn decode_body(text: &str, status: StatusCode) -> Result<Option<Value>, TransportError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    if status.is_success() {
        return Ok(Some(parse_response_json_strict(text, Some(status))?));
    }
    Ok(parse_response_json(text))
}

/// Validate that an API root is acceptable and normalise it to end with `/`.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: `http` or `https`
/// - otherwise: `https` only
fn validate_base_url(base: &str) -> Result<Url, TransportError> {
    let invalid = |message: String| TransportError::InvalidUrl {
        url: base.to_string(),
        message,
    };

    let mut parsed = Url::parse(base).map_err(|error| invalid(error.to_string()))?;
    let host_name = parsed.host_str().ok_or_else(|| invalid("base URL must include a host".into()))?;

    let is_local = LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed));
    match parsed.scheme() {
        "https" => {}
        "http" if is_local => {}
        other => return Err(invalid(format!("base URL must use https for non-localhost hosts; got '{other}://'"))),
    }

    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> ServerEndpoint {
        ServerEndpoint::new("vro.domain.local", Credentials::new("vcoadmin", "vcoadmin"))
    }

    #[test]
    fn certificate_validation_follows_the_endpoint() {
        let strict = ClientSettings::for_endpoint(&endpoint());
        assert!(!strict.accept_invalid_certs);
        assert_eq!(strict.timeout, REQUEST_TIMEOUT);

        let insecure = ClientSettings::for_endpoint(&endpoint().with_validate_certs(false));
        assert!(insecure.accept_invalid_certs);
        assert!(insecure.build().is_ok());
        assert!(HttpTransport::new(&endpoint().with_validate_certs(false)).is_ok());
    }

    #[test]
    fn new_uses_vco_api_root() {
        let transport = HttpTransport::new(&endpoint()).expect("transport");
        assert_eq!(transport.base_url().as_str(), "https://vro.domain.local:8281/vco/api/");
    }

    #[test]
    fn url_for_keeps_query_and_trailing_slash() {
        let transport = HttpTransport::new(&endpoint()).expect("transport");
        assert_eq!(
            transport.url_for("workflows?conditions=name=test-workflow").unwrap().as_str(),
            "https://vro.domain.local:8281/vco/api/workflows?conditions=name=test-workflow"
        );
        assert_eq!(
            transport.url_for("/workflows/wf-123/executions/").unwrap().as_str(),
            "https://vro.domain.local:8281/vco/api/workflows/wf-123/executions/"
        );
    }

    #[test]
    fn base_url_rules() {
        assert!(validate_base_url("http://localhost:8281/vco/api/").is_ok());
        assert!(validate_base_url("http://127.0.0.1:9000/vco/api").is_ok());
        assert!(validate_base_url("https://vro.example.com/vco/api/").is_ok());
        assert!(matches!(
            validate_base_url("http://vro.example.com/vco/api/"),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert!(matches!(validate_base_url("not a url"), Err(TransportError::InvalidUrl { .. })));
        assert_eq!(
            validate_base_url("http://127.0.0.1:9000/vco/api").unwrap().as_str(),
            "http://127.0.0.1:9000/vco/api/"
        );
    }

    #[test]
    fn decode_body_is_strict_only_for_success() {
        assert_eq!(decode_body("", StatusCode::OK).unwrap(), None);
        assert!(matches!(decode_body("<html>", StatusCode::OK), Err(TransportError::Decode(_))));
        assert_eq!(decode_body("<html>", StatusCode::INTERNAL_SERVER_ERROR).unwrap(), None);
        assert_eq!(
            decode_body(r#"{"value":"running"}"#, StatusCode::OK).unwrap(),
            Some(json!({"value": "running"}))
        );
    }
}
