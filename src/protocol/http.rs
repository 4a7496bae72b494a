// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for leak guard devices.
//!
//! The device serves its REST API under `<base>/api/rest/<command>` and
//! protects it with HTTP Basic authentication. [`HttpConfig`] describes how
//! to reach one device and turns into a [`LeakGuardClient`]; [`HttpTransport`]
//! performs the GET requests with `reqwest` and hands status, `Retry-After`
//! and body back to the client unchanged.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, RETRY_AFTER};

use crate::error::{ConnectionError, Error, Result};
use crate::protocol::{HttpReply, LeakGuardClient, RetryPolicy, Transport};

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";

// ============================================================================
// HttpConfig - How to reach one device
// ============================================================================

/// Where a leak guard lives and how to talk to it.
///
/// `host` is usually a bare address, and the base URL is assembled from
/// scheme and port. Gateways that expose the device under another prefix
/// can pass a full URL instead (`http://judo.local:8080`); that URL is then
/// taken verbatim and the port and HTTPS settings no longer apply.
///
/// Firmware that cannot take the payload in the path accepts it as
/// `?data=<hex>` instead, see [`with_payload_as_query`](Self::with_payload_as_query).
/// Devices behind HTTPS normally present a self-signed certificate, which
/// has to be allowed explicitly.
///
/// # Examples
///
/// ```
/// use leakguard_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let local = HttpConfig::new("192.168.1.60").with_credentials("admin", "Connectivity");
/// assert_eq!(local.base_url(), "http://192.168.1.60");
///
/// let tls = HttpConfig::new("192.168.1.60")
///     .with_https()
///     .with_accept_invalid_certs(true)
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(tls.base_url(), "https://192.168.1.60");
///
/// let proxied = HttpConfig::new("http://judo.local:8080/").with_port(9000);
/// assert_eq!(proxied.base_url(), "http://judo.local:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    credentials: Option<(String, String)>,
    timeout: Duration,
    payload_as_query: bool,
    accept_invalid_certs: bool,
    retry_policy: RetryPolicy,
}

impl HttpConfig {
    /// Port used for plain HTTP unless overridden.
    pub const DEFAULT_PORT: u16 = 80;
    /// Port used once HTTPS is switched on, unless overridden.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Time allowed for one request, including reading the body.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Starts a configuration for `host`: an IP address, a hostname, or a
    /// complete base URL with scheme.
    ///
    /// No credentials are set; most devices answer 401 until
    /// [`with_credentials`](Self::with_credentials) is added.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
            payload_as_query: false,
            accept_invalid_certs: false,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Sends `username`/`password` as HTTP Basic auth on every request.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Overrides the port. Ignored when the host is a full URL.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Talks `https` to the device.
    ///
    /// A port still at 80 moves to 443. A port set earlier with
    /// [`with_port`](Self::with_port) stays.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Allows the self-signed certificates leak guards ship with.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Bounds each request, not the whole retry loop.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Moves command payloads from the path (`5A0F06...`) into a query
    /// parameter (`5A00?data=0F06...`).
    #[must_use]
    pub fn with_payload_as_query(mut self, enabled: bool) -> Self {
        self.payload_as_query = enabled;
        self
    }

    /// Replaces the backoff used on HTTP 429 and transport errors.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Host as given to [`new`](Self::new).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port used when the host carries no scheme.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether `https` was requested.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Basic auth username and password.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn payload_as_query(&self) -> bool {
        self.payload_as_query
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    fn has_scheme(&self) -> bool {
        self.host.starts_with("http://") || self.host.starts_with("https://")
    }

    /// URL that command paths are appended to.
    ///
    /// A host with its own scheme comes back unchanged apart from a trailing
    /// slash. Otherwise the port is written only when it differs from the
    /// scheme's default.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.has_scheme() {
            return self.host.trim_end_matches('/').to_string();
        }
        let (scheme, default_port) = if self.use_https {
            ("https", Self::DEFAULT_HTTPS_PORT)
        } else {
            ("http", Self::DEFAULT_PORT)
        };
        if self.port == default_port {
            format!("{scheme}://{}", self.host)
        } else {
            format!("{scheme}://{}:{}", self.host, self.port)
        }
    }

    /// Creates a [`LeakGuardClient`] backed by `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<LeakGuardClient<HttpTransport>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        let credentials = self
            .credentials
            .clone()
            .map(|(username, password)| Credentials { username, password });

        let transport = HttpTransport {
            client,
            credentials,
        };
        Ok(self.into_client_with(transport))
    }

    /// Creates a [`LeakGuardClient`] over a custom transport.
    ///
    /// Credentials and timeout are the transport's concern and are ignored.
    #[must_use]
    pub fn into_client_with<T: Transport>(self, transport: T) -> LeakGuardClient<T> {
        LeakGuardClient::new(self.base_url(), transport)
            .with_retry_policy(self.retry_policy)
            .with_payload_as_query(self.payload_as_query)
    }
}

// ============================================================================
// HttpTransport - reqwest implementation of Transport
// ============================================================================

/// HTTP Basic credentials, passed through unchanged.
#[derive(Clone)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// [`Transport`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpTransport {
    /// Returns the configured credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> ConnectionError {
    if error.is_timeout() {
        ConnectionError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        ConnectionError::Unreachable {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        ConnectionError::Http(error)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> std::result::Result<HttpReply, ConnectionError> {
        let mut request = self.client.get(url).header(ACCEPT, ACCEPT_VALUE);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await.map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(HttpReply {
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_default_values() {
        let config = HttpConfig::new("192.168.1.60");
        assert_eq!(config.host(), "192.168.1.60");
        assert_eq!(config.port(), 80);
        assert!(!config.use_https());
        assert!(config.credentials().is_none());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(!config.payload_as_query());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn http_config_with_https() {
        let config = HttpConfig::new("192.168.1.60").with_https();
        assert!(config.use_https());
        assert_eq!(config.port(), 443);
        assert_eq!(config.base_url(), "https://192.168.1.60");
    }

    #[test]
    fn http_config_with_https_custom_port() {
        let config = HttpConfig::new("192.168.1.60")
            .with_port(8443)
            .with_https();
        assert_eq!(config.port(), 8443);
        assert_eq!(config.base_url(), "https://192.168.1.60:8443");
    }

    #[test]
    fn http_config_base_url_custom_port() {
        let config = HttpConfig::new("192.168.1.60").with_port(8080);
        assert_eq!(config.base_url(), "http://192.168.1.60:8080");
    }

    #[test]
    fn http_config_host_with_scheme_is_kept() {
        let config = HttpConfig::new("http://judo.local:8080/").with_port(9000);
        assert_eq!(config.base_url(), "http://judo.local:8080");

        let gateway = HttpConfig::new("https://gw.example/judo/").with_port(80);
        assert_eq!(gateway.base_url(), "https://gw.example/judo");
        assert!(!gateway.use_https());
    }

    #[test]
    fn http_config_with_credentials() {
        let config = HttpConfig::new("192.168.1.60").with_credentials("admin", "secret");
        assert_eq!(config.credentials(), Some(("admin", "secret")));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn http_config_into_client() {
        let client = HttpConfig::new("192.168.1.60")
            .with_credentials("user", "pass")
            .with_payload_as_query(true)
            .into_client()
            .unwrap();
        assert_eq!(client.base_url(), "http://192.168.1.60");
        assert!(client.payload_as_query());
        assert_eq!(client.transport().credentials().unwrap().username, "user");
    }
}
