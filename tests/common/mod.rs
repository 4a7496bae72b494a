// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport for exercising the request engine without a server.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use leakguard_lib::{ConnectionError, HttpReply, LeakGuardClient, SnapshotOptions, Transport};

pub const BASE_URL: &str = "http://leakguard.test";

/// Replies are scripted per path. The last reply of a path repeats once the
/// queue is down to it; unscripted paths answer 404.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<HttpReply>>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<String>>,
    waits: Mutex<Vec<Duration>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, path: &str, reply: HttpReply) -> Self {
        self.replies
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(self, path: &str, body: &str) -> Self {
        self.reply(path, HttpReply::new(200, body))
    }

    pub fn status(self, path: &str, status: u16) -> Self {
        self.reply(path, HttpReply::new(status, ""))
    }

    /// Makes every request to `path` take `delay` before answering.
    pub fn delay(self, path: &str, delay: Duration) -> Self {
        self.delays.lock().insert(path.to_string(), delay);
        self
    }

    /// Paths requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|p| *p == path).count()
    }

    /// Backoff delays requested by the client, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }

    /// Highest number of requests that were in flight at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn next_reply(&self, path: &str) -> HttpReply {
        let mut replies = self.replies.lock();
        match replies.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(not_found),
            Some(queue) => queue.front().cloned().unwrap_or_else(not_found),
            None => not_found(),
        }
    }
}

fn not_found() -> HttpReply {
    HttpReply::new(404, "")
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, ConnectionError> {
        let path = url.strip_prefix(BASE_URL).unwrap_or(url).to_string();
        self.requests.lock().push(path.clone());

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let delay = self.delays.lock().get(&path).copied();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(self.next_reply(&path))
    }

    async fn backoff(&self, delay: Duration) {
        self.waits.lock().push(delay);
        tokio::time::sleep(delay).await;
    }
}

/// A client over `transport` that only issues command reads in snapshots.
pub fn client(transport: ScriptedTransport) -> LeakGuardClient<ScriptedTransport> {
    LeakGuardClient::new(BASE_URL, transport)
        .with_snapshot_options(SnapshotOptions::new().without_json_endpoints())
}
