// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot keys written by each typed read.

use serde_json::{Map, Value};

use crate::types::{
    AbsenceLimits, DeviceClock, DeviceType, FirmwareVersion, InstallationDate, LearnStatus,
    SerialNumber, TotalWater, UsageStatistics, litres_to_m3,
};

/// A value that contributes fields to a snapshot.
pub trait ToFields {
    /// Writes this value's snapshot keys into `map`.
    fn write_fields(&self, map: &mut Map<String, Value>);

    /// Returns this value's snapshot keys as a new map.
    fn to_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        self.write_fields(&mut map);
        map
    }
}

fn put(map: &mut Map<String, Value>, key: &str, value: impl Into<Value>) {
    map.insert(key.to_string(), value.into());
}

impl ToFields for DeviceType {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "device_type_code", self.code());
        put(map, "device_type_hex", self.hex());
        put(map, "device_type_label", self.label());
    }
}

impl ToFields for SerialNumber {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "serial", self.to_string());
    }
}

impl ToFields for FirmwareVersion {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "firmware", self.to_string());
        put(map, "sw_version", self.to_string());
    }
}

impl ToFields for InstallationDate {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "installation_timestamp", self.timestamp());
        if let Some(datetime) = self.to_datetime() {
            put(map, "installation_datetime", datetime.to_rfc3339());
        }
    }
}

impl ToFields for TotalWater {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "total_water_l", self.litres());
        put(map, "total_water_m3", self.m3());
    }
}

impl ToFields for AbsenceLimits {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "absence_flow_l_h", self.flow_l_h);
        put(map, "absence_volume_l", self.volume_l);
        put(map, "absence_duration_min", self.duration_min);
    }
}

impl ToFields for LearnStatus {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "learn_active", self.active);
        if let Some(remaining) = self.remaining_l {
            put(map, "learn_remaining_l", remaining);
            put(map, "learn_remaining_m3", litres_to_m3(u64::from(remaining)));
        }
    }
}

impl ToFields for DeviceClock {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        put(map, "device_time_day", self.day);
        put(map, "device_time_month", self.month);
        put(map, "device_time_year", self.year);
        put(map, "device_time_hour", self.hour);
        put(map, "device_time_minute", self.minute);
        put(map, "device_time_second", self.second);
        if let Some(datetime) = self.to_datetime() {
            put(
                map,
                "device_time",
                datetime.format("%Y-%m-%dT%H:%M:%S").to_string(),
            );
        }
    }
}

/// Which period a [`UsageStatistics`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsPeriod {
    /// One day.
    Day,
    /// One ISO week.
    Week,
    /// One month.
    Month,
    /// One year.
    Year,
}

impl StatisticsPeriod {
    /// Returns the snapshot key prefix, e.g. `daily`.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Day => "daily",
            Self::Week => "weekly",
            Self::Month => "monthly",
            Self::Year => "yearly",
        }
    }
}

impl ToFields for (StatisticsPeriod, UsageStatistics) {
    fn write_fields(&self, map: &mut Map<String, Value>) {
        let (period, usage) = self;
        if usage.is_empty() {
            return;
        }
        let prefix = period.key_prefix();
        put(map, &format!("{prefix}_usage_l"), usage.total_l());
        put(map, &format!("{prefix}_usage_m3"), usage.total_m3());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FromPayload;
    use serde_json::json;

    #[test]
    fn device_type_fields() {
        let map = DeviceType::ZEWA_I_SAFE.to_fields();
        assert_eq!(map["device_type_code"], json!(0x44));
        assert_eq!(map["device_type_hex"], json!("0x44"));
        assert_eq!(map["device_type_label"], json!("ZEWA i-SAFE"));
    }

    #[test]
    fn clock_fields() {
        let clock = DeviceClock::from_payload(&[15, 6, 24, 12, 30, 5]).unwrap();
        let map = clock.to_fields();
        assert_eq!(map["device_time_year"], json!(2024));
        assert_eq!(map["device_time"], json!("2024-06-15T12:30:05"));
    }

    #[test]
    fn learn_fields_without_remaining() {
        let status = LearnStatus {
            active: true,
            remaining_l: None,
        };
        let map = status.to_fields();
        assert_eq!(map["learn_active"], json!(true));
        assert!(!map.contains_key("learn_remaining_l"));
    }

    #[test]
    fn total_water_fields() {
        let map = TotalWater::new(12_345).to_fields();
        assert_eq!(map["total_water_l"], json!(12_345));
        assert_eq!(map["total_water_m3"], json!(12.345));
    }

    #[test]
    fn statistics_fields_skip_empty() {
        let empty = (StatisticsPeriod::Day, UsageStatistics::default());
        assert!(empty.to_fields().is_empty());

        let week: (StatisticsPeriod, UsageStatistics) =
            (StatisticsPeriod::Week, [100, 250].into_iter().collect());
        let map = week.to_fields();
        assert_eq!(map["weekly_usage_l"], json!(350));
        assert_eq!(map["weekly_usage_m3"], json!(0.35));
    }
}
