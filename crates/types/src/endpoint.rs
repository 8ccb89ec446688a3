use std::fmt;

/// Default vRO REST listener port.
pub const DEFAULT_PORT: u16 = 8281;

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for a single client session.
///
/// The endpoint is immutable once a transport has been built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    /// When `false`, TLS certificate validation is skipped.
    pub validate_certs: bool,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            credentials,
            validate_certs: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_validate_certs(mut self, validate_certs: bool) -> Self {
        self.validate_certs = validate_certs;
        self
    }

    /// Root of the REST API, always ending in a slash so relative paths join onto it.
    pub fn api_base_url(&self) -> String {
        format!("https://{}:{}/vco/api/", self.host, self.port)
    }
}
