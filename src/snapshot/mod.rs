// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device snapshots: one merged view of everything a poll cycle collected.
//!
//! A poll cycle queries the optional JSON endpoints, runs the command read
//! sequence, merges the results and normalizes live values. See
//! [`LeakGuardClient::fetch_snapshot`](crate::LeakGuardClient::fetch_snapshot).
//!
//! Keys written from command reads:
//!
//! | Key | Source |
//! |-----|--------|
//! | `device_type_code`, `device_type_hex`, `device_type_label` | device type |
//! | `serial` | serial number |
//! | `firmware`, `sw_version` | firmware version |
//! | `installation_timestamp`, `installation_datetime` | installation date |
//! | `total_water_l`, `total_water_m3` | total water |
//! | `sleep_hours` | sleep duration |
//! | `absence_flow_l_h`, `absence_volume_l`, `absence_duration_min` | absence limits |
//! | `microleak_mode`, `vacation_type` | modes |
//! | `learn_active`, `learn_remaining_l`, `learn_remaining_m3` | learn status |
//! | `device_time_*`, `device_time` | device clock |
//! | `daily_usage_l` .. `yearly_usage_m3` | statistics |

mod aggregator;
mod fields;
mod merge;
mod normalize;

pub use aggregator::SnapshotOptions;
pub use fields::{StatisticsPeriod, ToFields};
pub use merge::deep_merge;
pub use normalize::normalize;

use serde::Serialize;
use serde_json::{Map, Value};

/// The merged, normalized state of a device.
///
/// Values are JSON primitives or nested objects. The snapshot serializes as
/// a plain JSON object.
///
/// # Examples
///
/// ```
/// use leakguard_lib::snapshot::DeviceSnapshot;
/// use serde_json::json;
///
/// let map = json!({"total_water_l": 12345, "meta": {"model": "i-SAFE"}})
///     .as_object().cloned().unwrap();
/// let snapshot = DeviceSnapshot::from_map(map);
///
/// assert_eq!(snapshot.get_u64("total_water_l"), Some(12345));
/// assert_eq!(snapshot.get_str("meta.model"), Some("i-SAFE"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeviceSnapshot {
    fields: Map<String, Value>,
}

impl DeviceSnapshot {
    /// Wraps a field map.
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns `true` if the poll cycle collected nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns the value at a dotted path such as `meta.model`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.fields, path)
    }

    /// Returns the value at `path` as a string.
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Returns the value at `path` as an unsigned integer.
    #[must_use]
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    /// Returns the value at `path` as a float.
    #[must_use]
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    /// Returns the value at `path` as a boolean.
    #[must_use]
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Returns `true` if `path` holds a value.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the snapshot and returns the underlying map.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

/// Looks up a dotted path in a JSON object.
#[must_use]
pub fn get_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Returns the first non-null value found at any of `paths`, in order.
#[must_use]
pub fn first_present<'a>(map: &'a Map<String, Value>, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| get_path(map, path))
        .find(|value| !value.is_null())
}
