// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The poll cycle: JSON endpoints, command reads, merge and normalization.

use std::future::Future;
use std::time::Duration;

use chrono::{Datelike, Utc};
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::error::Result;
use crate::protocol::{LeakGuardClient, Transport};
use crate::snapshot::{DeviceSnapshot, StatisticsPeriod, ToFields, deep_merge, normalize};
use crate::types::DeviceClock;

const META_ENDPOINTS: &[&str] = &["/api/device", "/device", "/api/info", "/info"];

const STATUS_ENDPOINTS: &[&str] = &[
    "/api/status",
    "/api/live",
    "/api/values",
    "/status",
    "/live",
    "/values",
    "/zewa/status",
    "/zewa/live",
    "/judo/leakguard/status",
];

const COUNTER_ENDPOINTS: &[&str] = &["/api/counters", "/counters"];

fn owned(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| (*p).to_string()).collect()
}

/// Options of a poll cycle.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use leakguard_lib::snapshot::SnapshotOptions;
///
/// let options = SnapshotOptions::new()
///     .with_poll_timeout(Duration::from_secs(20))
///     .with_status_endpoints(["/api/status"])
///     .with_meta_endpoints(Vec::<String>::new());
/// assert_eq!(options.status_endpoints(), ["/api/status"]);
/// assert!(options.meta_endpoints().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    poll_timeout: Duration,
    meta_endpoints: Vec<String>,
    status_endpoints: Vec<String>,
    counter_endpoints: Vec<String>,
}

impl SnapshotOptions {
    /// Default poll cycle timeout.
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates options with the default endpoints and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time budget of one poll cycle.
    ///
    /// Reads still pending when it runs out are skipped and the fields
    /// collected so far are returned.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Replaces the JSON endpoints merged under `meta`.
    #[must_use]
    pub fn with_meta_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the JSON endpoints merged at the top level.
    #[must_use]
    pub fn with_status_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the JSON endpoints merged under `counters`.
    #[must_use]
    pub fn with_counter_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.counter_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Disables every JSON endpoint; only command reads are issued.
    #[must_use]
    pub fn without_json_endpoints(mut self) -> Self {
        self.meta_endpoints.clear();
        self.status_endpoints.clear();
        self.counter_endpoints.clear();
        self
    }

    /// Returns the poll cycle timeout.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Returns the `meta` endpoints.
    #[must_use]
    pub fn meta_endpoints(&self) -> &[String] {
        &self.meta_endpoints
    }

    /// Returns the top-level status endpoints.
    #[must_use]
    pub fn status_endpoints(&self) -> &[String] {
        &self.status_endpoints
    }

    /// Returns the `counters` endpoints.
    #[must_use]
    pub fn counter_endpoints(&self) -> &[String] {
        &self.counter_endpoints
    }
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
            meta_endpoints: owned(META_ENDPOINTS),
            status_endpoints: owned(STATUS_ENDPOINTS),
            counter_endpoints: owned(COUNTER_ENDPOINTS),
        }
    }
}

/// Deadline bookkeeping for one poll cycle.
struct PollCycle {
    deadline: Instant,
    expired: bool,
}

impl PollCycle {
    fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            expired: false,
        }
    }

    /// Runs one read of the cycle.
    ///
    /// Fatal errors propagate. Other errors are logged and yield `None`, as
    /// does every read once the deadline has passed.
    async fn run<V>(
        &mut self,
        read: &str,
        future: impl Future<Output = Result<V>>,
    ) -> Result<Option<V>> {
        if self.expired {
            return Ok(None);
        }
        match tokio::time::timeout_at(self.deadline, future).await {
            Ok(Ok(value)) => Ok(Some(value)),
            Ok(Err(e)) if e.is_fatal() => Err(e),
            Ok(Err(e)) => {
                tracing::debug!(read, error = %e, "Read failed, skipping field");
                Ok(None)
            }
            Err(_) => {
                self.expired = true;
                tracing::warn!(read, "Poll cycle timed out, skipping remaining reads");
                Ok(None)
            }
        }
    }
}

/// Returns `value` if it is a non-empty object.
fn non_empty_object(value: Option<Value>) -> Option<Map<String, Value>> {
    match value {
        Some(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}

fn nest(key: &str, object: Map<String, Value>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), Value::Object(object));
    map
}

impl<T: Transport> LeakGuardClient<T> {
    /// Runs one poll cycle and returns the device snapshot.
    ///
    /// The cycle queries the optional `meta`, status and `counters` JSON
    /// endpoints, then the command read sequence. A read that fails softly
    /// is skipped; authentication and connection errors abort the cycle.
    /// Command results take precedence over same-named JSON fields.
    ///
    /// An empty snapshot means nothing could be collected, which callers
    /// should treat as a failed poll.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`](crate::Error::Authentication) or
    /// [`Error::Connection`](crate::Error::Connection) if any request hits
    /// one of them.
    pub async fn fetch_snapshot(&self) -> Result<DeviceSnapshot> {
        let options = self.snapshot_options().clone();
        let mut cycle = PollCycle::new(options.poll_timeout());

        let mut merged = Map::new();
        self.collect_json(&mut cycle, &options, &mut merged).await?;

        let rest = self.collect_commands(&mut cycle).await?;
        deep_merge(&mut merged, rest.clone());

        if merged.is_empty() {
            tracing::debug!(base_url = %self.base_url(), "No data collected from any source");
            return Ok(DeviceSnapshot::default());
        }

        let mut fields = normalize(merged, Utc::now());
        fields.extend(rest);

        let snapshot = DeviceSnapshot::from_map(fields);
        tracing::debug!(keys = snapshot.len(), "Snapshot collected");
        self.store_snapshot(&snapshot);
        Ok(snapshot)
    }

    async fn collect_json(
        &self,
        cycle: &mut PollCycle,
        options: &SnapshotOptions,
        merged: &mut Map<String, Value>,
    ) -> Result<()> {
        for path in options.meta_endpoints() {
            let value = cycle.run(path, self.fetch_json(path)).await?.flatten();
            if let Some(object) = non_empty_object(value) {
                deep_merge(merged, nest("meta", object));
            }
        }
        for path in options.status_endpoints() {
            let value = cycle.run(path, self.fetch_json(path)).await?.flatten();
            if let Some(object) = non_empty_object(value) {
                deep_merge(merged, object);
            }
        }
        for path in options.counter_endpoints() {
            let value = cycle.run(path, self.fetch_json(path)).await?.flatten();
            if let Some(object) = non_empty_object(value) {
                deep_merge(merged, nest("counters", object));
            }
        }
        Ok(())
    }

    async fn collect_commands(&self, cycle: &mut PollCycle) -> Result<Map<String, Value>> {
        let mut rest = Map::new();

        if let Some(v) = cycle.run("device_type", self.read_device_type()).await? {
            v.write_fields(&mut rest);
        }
        if let Some(v) = cycle.run("serial_number", self.read_serial_number()).await? {
            v.write_fields(&mut rest);
        }
        if let Some(v) = cycle
            .run("firmware_version", self.read_firmware_version())
            .await?
        {
            v.write_fields(&mut rest);
        }
        if let Some(v) = cycle
            .run("installation_date", self.read_installation_date())
            .await?
        {
            v.write_fields(&mut rest);
        }
        if let Some(v) = cycle.run("total_water", self.read_total_water()).await? {
            v.write_fields(&mut rest);
        }
        if let Some(Some(hours)) = cycle
            .run("sleep_duration", self.read_sleep_duration())
            .await?
        {
            rest.insert("sleep_hours".to_string(), hours.into());
        }
        if let Some(Some(v)) = cycle
            .run("absence_limits", self.read_absence_limits())
            .await?
        {
            v.write_fields(&mut rest);
        }
        if let Some(Some(mode)) = cycle
            .run("micro_leak_mode", self.read_micro_leak_mode())
            .await?
        {
            rest.insert("microleak_mode".to_string(), mode.into());
        }
        if let Some(Some(kind)) = cycle
            .run("vacation_type", self.read_vacation_type())
            .await?
        {
            rest.insert("vacation_type".to_string(), kind.into());
        }
        if let Some(Some(v)) = cycle.run("learn_status", self.read_learn_status()).await? {
            v.write_fields(&mut rest);
        }

        let clock = cycle.run("device_clock", self.read_device_clock()).await?;
        if let Some(clock) = &clock {
            clock.write_fields(&mut rest);
        }

        let reference = clock
            .as_ref()
            .and_then(DeviceClock::to_datetime)
            .unwrap_or_else(|| Utc::now().naive_utc());
        let day = i64::from(reference.day());
        let month = i64::from(reference.month());
        let year = i64::from(reference.year());
        let iso = reference.iso_week();

        if let Some(usage) = cycle
            .run("day_statistics", self.read_day_statistics(day, month, year))
            .await?
        {
            (StatisticsPeriod::Day, usage).write_fields(&mut rest);
        }
        if let Some(usage) = cycle
            .run(
                "week_statistics",
                self.read_week_statistics(i64::from(iso.week()), i64::from(iso.year())),
            )
            .await?
        {
            (StatisticsPeriod::Week, usage).write_fields(&mut rest);
        }
        if let Some(usage) = cycle
            .run("month_statistics", self.read_month_statistics(month, year))
            .await?
        {
            (StatisticsPeriod::Month, usage).write_fields(&mut rest);
        }
        if let Some(usage) = cycle
            .run("year_statistics", self.read_year_statistics(year))
            .await?
        {
            (StatisticsPeriod::Year, usage).write_fields(&mut rest);
        }

        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = SnapshotOptions::default();
        assert_eq!(options.poll_timeout(), Duration::from_secs(60));
        assert_eq!(options.meta_endpoints().len(), 4);
        assert_eq!(options.status_endpoints().len(), 9);
        assert_eq!(options.counter_endpoints(), ["/api/counters", "/counters"]);
    }

    #[test]
    fn without_json_endpoints_clears_all_lists() {
        let options = SnapshotOptions::new().without_json_endpoints();
        assert!(options.meta_endpoints().is_empty());
        assert!(options.status_endpoints().is_empty());
        assert!(options.counter_endpoints().is_empty());
    }

    #[test]
    fn nest_wraps_object() {
        let inner = Map::from_iter([("model".to_string(), Value::from("i-SAFE"))]);
        let nested = nest("meta", inner);
        assert_eq!(nested["meta"]["model"], Value::from("i-SAFE"));
    }

    #[test]
    fn non_empty_object_filters() {
        assert!(non_empty_object(None).is_none());
        assert!(non_empty_object(Some(Value::from(3))).is_none());
        assert!(non_empty_object(Some(Value::Object(Map::new()))).is_none());
    }
}
