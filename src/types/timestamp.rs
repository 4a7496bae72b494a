// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Freshness timestamps reported by the JSON status endpoints.
//!
//! Depending on the firmware, the "last update" field is one of:
//!
//! - Unix epoch seconds: `1718454600` or `"1718454600"`
//! - Unix epoch milliseconds: `1718454600000`
//! - ISO 8601 with timezone: `"2024-06-15T12:30:00Z"`
//! - ISO 8601 without timezone (read as UTC): `"2024-06-15T12:30:00"`
//!
//! # Examples
//!
//! ```
//! use leakguard_lib::types::UpdateTimestamp;
//!
//! let ts: UpdateTimestamp = "2024-06-15T12:30:00Z".parse().unwrap();
//! let ms: UpdateTimestamp = "1718454600000".parse().unwrap();
//! assert_eq!(ts, ms);
//! ```

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Epoch values above this are milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Error returned when a timestamp cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParseError {
    input: String,
}

impl TimestampParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl std::fmt::Display for TimestampParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to parse timestamp: '{}' (expected ISO 8601 or Unix epoch)",
            self.input
        )
    }
}

impl std::error::Error for TimestampParseError {}

/// A point in time reported by the device, normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UpdateTimestamp(DateTime<Utc>);

impl UpdateTimestamp {
    /// Interprets an epoch value, detecting milliseconds by magnitude.
    #[must_use]
    pub fn from_epoch(value: i64) -> Option<Self> {
        if value <= 0 {
            return None;
        }
        let datetime = if value > EPOCH_MILLIS_THRESHOLD {
            Utc.timestamp_millis_opt(value).single()?
        } else {
            Utc.timestamp_opt(value, 0).single()?
        };
        Some(Self(datetime))
    }

    /// Interprets a JSON value: a number, or a string in any supported format.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                // Fractional epochs are truncated to whole units
                #[allow(clippy::cast_possible_truncation)]
                let epoch = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
                Self::from_epoch(epoch)
            }
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn parse_iso_with_tz(s: &str) -> Option<Self> {
        let datetime = DateTime::parse_from_rfc3339(s).ok()?;
        Some(Self(datetime.with_timezone(&Utc)))
    }

    fn parse_iso_naive(s: &str) -> Option<Self> {
        let formats = [
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
        ];

        formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| Self(naive.and_utc()))
    }

    /// Returns the timestamp as a UTC datetime.
    #[must_use]
    pub const fn to_utc(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns the age of the timestamp relative to `now`, rounded to whole
    /// seconds, or `None` if the timestamp lies in the future.
    #[must_use]
    pub fn age_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        let millis = (now - self.0).num_milliseconds();
        if millis < 0 {
            return None;
        }
        Some((millis + 500) / 1000)
    }
}

impl FromStr for UpdateTimestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if !s.is_empty()
            && s.chars().all(|c| c.is_ascii_digit())
            && let Some(ts) = s.parse().ok().and_then(Self::from_epoch)
        {
            return Ok(ts);
        }

        if let Some(ts) = Self::parse_iso_with_tz(s) {
            return Ok(ts);
        }

        Self::parse_iso_naive(s).ok_or_else(|| TimestampParseError::new(s))
    }
}

impl From<DateTime<Utc>> for UpdateTimestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }
}
