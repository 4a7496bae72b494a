// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The request engine shared by every command and JSON endpoint.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::command::Command;
use crate::error::{ConnectionError, Error, Result};
use crate::protocol::{
    HttpReply, HttpTransport, RetryPolicy, Transport, WireResponse, parse_retry_after,
};
use crate::snapshot::{DeviceSnapshot, SnapshotOptions};

/// Path prefix of the hex command API.
const REST_PREFIX: &str = "/api/rest/";

/// Client for one leak guard device.
///
/// Every request goes through a single-flight gate: one request is on the
/// wire at a time and concurrent callers queue in arrival order. The gate is
/// held for the whole retry loop of a request, backoff sleeps included,
/// because the device firmware only handles one session reliably.
///
/// Status handling:
///
/// | Status | Outcome |
/// |--------|---------|
/// | 2xx | body returned |
/// | 401, 403 | [`Error::Authentication`], never retried |
/// | 404 | empty response |
/// | 429 | backoff and retry, [`ConnectionError::RateLimited`] once the budget is spent |
/// | other | empty response, logged at debug level |
///
/// Transport failures are retried with the same backoff and surface as
/// [`Error::Connection`] once the budget is spent.
///
/// # Examples
///
/// ```no_run
/// use leakguard_lib::protocol::HttpConfig;
///
/// # async fn example() -> leakguard_lib::Result<()> {
/// let client = HttpConfig::new("192.168.1.60")
///     .with_credentials("admin", "Connectivity")
///     .into_client()?;
///
/// let total = client.read_total_water().await?;
/// println!("{} m3", total.m3());
///
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LeakGuardClient<T: Transport = HttpTransport> {
    base_url: String,
    transport: T,
    policy: RetryPolicy,
    payload_as_query: bool,
    gate: Mutex<()>,
    closed: AtomicBool,
    snapshot_options: SnapshotOptions,
    last_snapshot: RwLock<Option<DeviceSnapshot>>,
}

impl<T: Transport> LeakGuardClient<T> {
    /// Creates a client for `base_url` over `transport`.
    ///
    /// A trailing slash on `base_url` is dropped.
    #[must_use]
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            policy: RetryPolicy::default(),
            payload_as_query: false,
            gate: Mutex::new(()),
            closed: AtomicBool::new(false),
            snapshot_options: SnapshotOptions::default(),
            last_snapshot: RwLock::new(None),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sends command payloads as a `?data=` query parameter.
    #[must_use]
    pub fn with_payload_as_query(mut self, enabled: bool) -> Self {
        self.payload_as_query = enabled;
        self
    }

    /// Sets the snapshot options.
    #[must_use]
    pub fn with_snapshot_options(mut self, options: SnapshotOptions) -> Self {
        self.snapshot_options = options;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns whether payloads travel as a query parameter.
    #[must_use]
    pub fn payload_as_query(&self) -> bool {
        self.payload_as_query
    }

    /// Returns the snapshot options.
    #[must_use]
    pub fn snapshot_options(&self) -> &SnapshotOptions {
        &self.snapshot_options
    }

    /// Returns the most recent non-empty snapshot.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<DeviceSnapshot> {
        self.last_snapshot.read().clone()
    }

    pub(crate) fn store_snapshot(&self, snapshot: &DeviceSnapshot) {
        *self.last_snapshot.write() = Some(snapshot.clone());
    }

    /// Returns `true` once [`close`](Self::close) has completed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the client.
    ///
    /// Waits until no request is in flight; every later request fails with
    /// [`ConnectionError::Closed`].
    pub async fn close(&self) {
        let _guard = self.gate.lock().await;
        self.closed.store(true, Ordering::Release);
        tracing::debug!(base_url = %self.base_url, "Client closed");
    }

    /// Builds the full URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Builds the URL for a command.
    #[must_use]
    pub fn command_url(&self, command: &Command) -> String {
        let path = if self.payload_as_query && command.has_payload() {
            format!(
                "{REST_PREFIX}{}?data={}",
                command.opcode_hex(),
                command.payload_hex()
            )
        } else {
            format!("{REST_PREFIX}{}", command.to_hex())
        };
        self.url(&path)
    }

    /// Sends a command and returns the parsed response.
    ///
    /// Soft failures (404 and non-auth error statuses) yield an empty
    /// response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] for HTTP 401/403 and
    /// [`Error::Connection`] when the device cannot be reached or keeps
    /// rate limiting.
    pub async fn send(&self, command: &Command) -> Result<WireResponse> {
        let url = self.command_url(command);
        let Some(body) = self.execute(&url).await? else {
            return Ok(WireResponse::empty());
        };
        let response = WireResponse::from_body(&body);
        tracing::debug!(url = %url, kind = ?response.kind(), "Received command response");
        Ok(response)
    }

    /// Fetches a JSON document from an optional endpoint.
    ///
    /// Returns `None` if the endpoint is missing, empty or not JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] for HTTP 401/403 and
    /// [`Error::Connection`] when the device cannot be reached or keeps
    /// rate limiting.
    pub async fn fetch_json(&self, path: &str) -> Result<Option<Value>> {
        let url = self.url(path);
        let Some(body) = self.execute(&url).await? else {
            return Ok(None);
        };
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Invalid JSON from endpoint");
                Ok(None)
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ConnectionError::Closed.into());
        }
        Ok(())
    }

    /// Runs one logical request through the gate and the retry loop.
    ///
    /// Returns `None` for soft failures.
    async fn execute(&self, url: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        let _guard = self.gate.lock().await;
        self.ensure_open()?;

        let mut state = self.policy.start();
        loop {
            let attempt = state.begin_attempt();
            tracing::debug!(url = %url, attempt, "Sending request");

            let retry_after = match self.transport.get(url).await {
                Ok(reply) => match classify(url, reply)? {
                    Outcome::Done(body) => return Ok(body),
                    Outcome::RateLimited(retry_after) => {
                        state.record_error(ConnectionError::RateLimited {
                            url: url.to_string(),
                            attempts: attempt,
                        });
                        retry_after
                    }
                },
                Err(e) => {
                    tracing::debug!(url = %url, attempt, error = %e, "Request failed");
                    state.record_error(e);
                    None
                }
            };

            if !state.can_retry() {
                break;
            }

            let wait = state.next_wait(retry_after);
            tracing::warn!(
                url = %url,
                attempt,
                max_attempts = self.policy.max_attempts(),
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "Backing off before retry"
            );
            self.transport.backoff(wait).await;
        }

        let error = state.take_error().unwrap_or(ConnectionError::RateLimited {
            url: url.to_string(),
            attempts: state.attempt(),
        });
        tracing::warn!(
            url = %url,
            attempts = state.attempt(),
            error = %error,
            "Retry budget exhausted"
        );
        Err(error.into())
    }
}

enum Outcome {
    /// Final answer: a body, or `None` for a soft failure.
    Done(Option<String>),
    /// HTTP 429 with an optional `Retry-After` hint.
    RateLimited(Option<std::time::Duration>),
}

fn classify(url: &str, reply: HttpReply) -> Result<Outcome> {
    match reply.status {
        _ if reply.is_success() => Ok(Outcome::Done(Some(reply.body))),
        401 | 403 => Err(Error::Authentication {
            status: reply.status,
        }),
        404 => {
            tracing::debug!(url = %url, "Endpoint not present");
            Ok(Outcome::Done(None))
        }
        429 => {
            let hint = reply.retry_after.as_deref().and_then(|value| {
                let parsed = parse_retry_after(value);
                if parsed.is_none() {
                    tracing::debug!(url = %url, value = %value, "Invalid Retry-After header");
                }
                parsed
            });
            Ok(Outcome::RateLimited(hint))
        }
        status => {
            tracing::debug!(url = %url, status, "Unexpected status, treating as no data");
            Ok(Outcome::Done(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTransport;

    impl Transport for NoTransport {
        async fn get(&self, url: &str) -> std::result::Result<HttpReply, ConnectionError> {
            Err(ConnectionError::Unreachable {
                url: url.to_string(),
                message: "offline".to_string(),
            })
        }
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = LeakGuardClient::new("http://judo.local/", NoTransport);
        assert_eq!(client.base_url(), "http://judo.local");
        assert_eq!(client.url("api/device"), "http://judo.local/api/device");
        assert_eq!(client.url("/api/device"), "http://judo.local/api/device");
    }

    #[test]
    fn command_url_in_path() {
        let client = LeakGuardClient::new("http://judo.local", NoTransport);
        assert_eq!(
            client.command_url(&Command::bare(0x28)),
            "http://judo.local/api/rest/2800"
        );
        let write = Command::new(0x53, vec![0x0A]).unwrap();
        assert_eq!(
            client.command_url(&write),
            "http://judo.local/api/rest/530A"
        );
    }

    #[test]
    fn command_url_as_query() {
        let client =
            LeakGuardClient::new("http://judo.local", NoTransport).with_payload_as_query(true);
        let write = Command::new(0x5F, vec![0, 100, 1, 244, 0, 60]).unwrap();
        assert_eq!(
            client.command_url(&write),
            "http://judo.local/api/rest/5F00?data=006401F4003C"
        );
        assert_eq!(
            client.command_url(&Command::bare(0x51)),
            "http://judo.local/api/rest/5100"
        );
    }

    #[test]
    fn classify_statuses() {
        let url = "http://judo.local/api/rest/2800";
        assert!(matches!(
            classify(url, HttpReply::new(200, "2A")),
            Ok(Outcome::Done(Some(_)))
        ));
        assert!(matches!(
            classify(url, HttpReply::new(403, "")),
            Err(Error::Authentication { status: 403 })
        ));
        assert!(matches!(
            classify(url, HttpReply::new(404, "")),
            Ok(Outcome::Done(None))
        ));
        assert!(matches!(
            classify(url, HttpReply::new(503, "")),
            Ok(Outcome::Done(None))
        ));
        assert!(matches!(
            classify(url, HttpReply::new(429, "").with_retry_after("later")),
            Ok(Outcome::RateLimited(None))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_exhaust_the_budget() {
        let client = LeakGuardClient::new("http://judo.local", NoTransport)
            .with_retry_policy(RetryPolicy::new().with_max_attempts(2));
        let err = client.send(&Command::bare(0x28)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Connection(ConnectionError::Unreachable { .. })
        ));
    }

    #[tokio::test]
    async fn closed_client_rejects_requests() {
        let client = LeakGuardClient::new("http://judo.local", NoTransport);
        client.close().await;
        assert!(client.is_closed());
        let err = client.fetch_json("/api/device").await.unwrap_err();
        assert!(matches!(err, Error::Connection(ConnectionError::Closed)));
    }
}
