// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization of live values collected from the JSON endpoints.
//!
//! Field names differ between firmwares, so each normalized key has an
//! ordered list of candidate paths. The first non-null candidate wins.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::snapshot::{first_present, get_path};
use crate::types::{LITRES_PER_M3, UpdateTimestamp};

/// A numeric field with its candidate paths and accepted range.
struct NumericField {
    key: &'static str,
    paths: &'static [&'static str],
    accepts: fn(f64) -> bool,
}

const NUMERIC_FIELDS: &[NumericField] = &[
    NumericField {
        key: "pressure_bar",
        paths: &[
            "pressure_bar",
            "pressure",
            "sensors.pressure_bar",
            "live.pressure_bar",
        ],
        accepts: |v| (0.0..20.0).contains(&v),
    },
    NumericField {
        key: "water_flow_l_min",
        paths: &[
            "water_flow_l_min",
            "flow_l_min",
            "flow",
            "sensors.flow",
            "live.flow",
        ],
        accepts: |v| v >= 0.0,
    },
    NumericField {
        key: "temperature_c",
        paths: &[
            "temperature_c",
            "temp_c",
            "temperature",
            "sensors.temperature_c",
        ],
        accepts: |_| true,
    },
    NumericField {
        key: "battery_percent",
        paths: &["battery_percent", "battery", "status.battery_percent"],
        accepts: |v| (0.0..=100.0).contains(&v),
    },
];

/// Text fields copied to the top level from the first populated path.
const TEXT_FIELDS: &[(&str, &[&str])] = &[
    ("manufacturer", &["manufacturer", "brand", "meta.manufacturer"]),
    ("model", &["model", "device.model", "meta.model"]),
    ("serial", &["serial", "device.serial", "meta.serial"]),
    ("firmware", &["firmware", "sw_version", "meta.firmware"]),
];

const TOTAL_M3_PATHS: &[&str] = &["total_water_m3", "counters.total_water_m3"];
const TOTAL_L_PATHS: &[&str] = &["total_water_l", "counters.total_water_l"];
const TIMESTAMP_PATHS: &[&str] = &["last_update", "meta.last_update", "timestamp"];

/// Reads a number, accepting numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

/// Normalizes a merged map.
///
/// Adds or overwrites `pressure_bar`, `water_flow_l_min`, `temperature_c`,
/// `battery_percent`, `total_water_m3`, `manufacturer`, `model`, `serial`,
/// `firmware` and `last_update_seconds`. Values outside a field's plausible
/// range are dropped; other keys are left untouched.
///
/// `now` is the reference time for `last_update_seconds`.
#[must_use]
pub fn normalize(mut map: Map<String, Value>, now: DateTime<Utc>) -> Map<String, Value> {
    if map.is_empty() {
        return map;
    }

    for field in NUMERIC_FIELDS {
        let value = first_present(&map, field.paths)
            .and_then(as_number)
            .filter(|v| (field.accepts)(*v));
        if let Some(value) = value {
            map.insert(field.key.to_string(), Value::from(value));
        }
    }

    let total_m3 = match first_present(&map, TOTAL_M3_PATHS) {
        Some(value) => as_number(value),
        None => first_present(&map, TOTAL_L_PATHS)
            .and_then(as_number)
            .map(|litres| litres / LITRES_PER_M3),
    };
    if let Some(total_m3) = total_m3 {
        map.insert("total_water_m3".to_string(), Value::from(total_m3));
    }

    for (key, paths) in TEXT_FIELDS {
        let value = paths
            .iter()
            .filter_map(|path| get_path(&map, path))
            .find(|value| is_populated(value))
            .cloned();
        if let Some(value) = value {
            map.insert((*key).to_string(), value);
        }
    }

    let age = first_present(&map, TIMESTAMP_PATHS)
        .and_then(UpdateTimestamp::from_json)
        .and_then(|ts| ts.age_seconds(now));
    if let Some(age) = age {
        map.insert("last_update_seconds".to_string(), Value::from(age));
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T12:31:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn empty_map_stays_empty() {
        assert!(normalize(Map::new(), now()).is_empty());
    }

    #[test]
    fn live_values_from_nested_paths() {
        let map = normalize(
            object(json!({
                "sensors": {"pressure_bar": "3.2", "flow": 12, "temperature_c": 14.5},
                "battery": 87,
            })),
            now(),
        );
        assert_eq!(map["pressure_bar"], json!(3.2));
        assert_eq!(map["water_flow_l_min"], json!(12.0));
        assert_eq!(map["temperature_c"], json!(14.5));
        assert_eq!(map["battery_percent"], json!(87.0));
    }

    #[test]
    fn implausible_values_are_dropped() {
        let map = normalize(
            object(json!({"pressure": 25, "flow": -1, "battery": 140, "temperature": "warm"})),
            now(),
        );
        assert!(!map.contains_key("pressure_bar"));
        assert!(!map.contains_key("water_flow_l_min"));
        assert!(!map.contains_key("battery_percent"));
        assert!(!map.contains_key("temperature_c"));
    }

    #[test]
    fn total_m3_derived_from_litres() {
        let map = normalize(object(json!({"counters": {"total_water_l": "12345"}})), now());
        assert_eq!(map["total_water_m3"], json!(12.345));
    }

    #[test]
    fn total_m3_reported_wins_over_litres() {
        let map = normalize(
            object(json!({"counters": {"total_water_m3": 7.5}, "total_water_l": 100})),
            now(),
        );
        assert_eq!(map["total_water_m3"], json!(7.5));
    }

    #[test]
    fn identity_copied_from_first_populated_path() {
        let map = normalize(
            object(json!({
                "brand": "",
                "meta": {"manufacturer": "JUDO", "model": "ZEWA i-SAFE", "firmware": "2.4"},
                "device": {"serial": 123456},
            })),
            now(),
        );
        assert_eq!(map["manufacturer"], json!("JUDO"));
        assert_eq!(map["model"], json!("ZEWA i-SAFE"));
        assert_eq!(map["serial"], json!(123_456));
        assert_eq!(map["firmware"], json!("2.4"));
    }

    #[test]
    fn last_update_age_in_all_formats() {
        for ts in [
            json!(1_718_454_600),
            json!(1_718_454_600_000_i64),
            json!("2024-06-15T12:30:00Z"),
        ] {
            let map = normalize(object(json!({"meta": {"last_update": ts}})), now());
            assert_eq!(map["last_update_seconds"], json!(60));
        }
    }

    #[test]
    fn future_timestamp_has_no_age() {
        let map = normalize(object(json!({"timestamp": "2030-01-01T00:00:00Z"})), now());
        assert!(!map.contains_key("last_update_seconds"));
    }

    #[test]
    fn unrelated_numeric_strings_are_untouched() {
        let map = normalize(object(json!({"mode": "2"})), now());
        assert_eq!(map["mode"], json!("2"));
    }
}
