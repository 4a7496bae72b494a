// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request plumbing between the client and the device.
//!
//! - [`Transport`]: one raw HTTP GET, plus the backoff sleep. The default
//!   implementation is [`HttpTransport`] on top of `reqwest`; tests plug in
//!   in-memory doubles.
//! - [`LeakGuardClient`]: single-flight gate, status classification and the
//!   retry loop shared by every command and JSON endpoint.
//! - [`RetryPolicy`]: attempt budget and backoff delays.
//! - [`WireResponse`]: the parsed response body.

mod client;
mod http;
pub mod response;
mod retry;

use std::time::Duration;

pub use client::LeakGuardClient;
pub use http::{Credentials, HttpConfig, HttpTransport};
pub use response::{BodyKind, WireResponse};
pub use retry::{RetryPolicy, RetryState, parse_retry_after};

use crate::error::ConnectionError;

/// A raw HTTP reply: status, `Retry-After` header and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Retry-After` header, if present.
    pub retry_after: Option<String>,
    /// Response body.
    pub body: String,
}

impl HttpReply {
    /// Creates a reply without `Retry-After` header.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    /// Sets the `Retry-After` header.
    #[must_use]
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Trait for transports that can reach a leak guard.
///
/// A transport performs exactly one request per call; retries, gating and
/// status handling live in [`LeakGuardClient`].
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Performs a GET request and returns the raw reply.
    ///
    /// Any HTTP status is a successful reply here; only transport failures
    /// are errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] on timeouts, connection failures or other
    /// client errors.
    async fn get(&self, url: &str) -> Result<HttpReply, ConnectionError>;

    /// Waits before the next attempt.
    async fn backoff(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
