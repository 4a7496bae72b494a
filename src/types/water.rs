// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Water consumption counters and usage statistics.

use crate::codec::{self, FromPayload};
use crate::error::DecodeError;

/// Litres per cubic metre.
pub const LITRES_PER_M3: f64 = 1000.0;

/// Converts litres to cubic metres.
#[must_use]
pub fn litres_to_m3(litres: u64) -> f64 {
    // Precision loss only above 2^52 litres
    #[allow(clippy::cast_precision_loss)]
    let litres = litres as f64;
    litres / LITRES_PER_M3
}

/// Total water that passed through the device, in litres.
///
/// # Examples
///
/// ```
/// use leakguard_lib::codec::FromPayload;
/// use leakguard_lib::types::TotalWater;
///
/// let total = TotalWater::from_payload(&[0x00, 0x00, 0x30, 0x39]).unwrap();
/// assert_eq!(total.litres(), 12_345);
/// assert!((total.m3() - 12.345).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TotalWater(u32);

impl TotalWater {
    /// Wraps a litre count.
    #[must_use]
    pub const fn new(litres: u32) -> Self {
        Self(litres)
    }

    /// Returns the total in litres.
    #[must_use]
    pub const fn litres(&self) -> u32 {
        self.0
    }

    /// Returns the total in cubic metres.
    #[must_use]
    pub fn m3(&self) -> f64 {
        litres_to_m3(u64::from(self.0))
    }
}

impl FromPayload for TotalWater {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self(codec::read_u32(payload, 0)?))
    }
}

/// A series of 4-byte usage records for one day, week, month or year.
///
/// The device reports one record per sub-period (for example one per
/// three hours of a day, or one per day of a week).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStatistics {
    values: Vec<u32>,
}

impl UsageStatistics {
    /// Returns the individual records in litres.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Returns `true` if the device reported no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the sum of all records in litres.
    #[must_use]
    pub fn total_l(&self) -> u64 {
        self.values.iter().map(|v| u64::from(*v)).sum()
    }

    /// Returns the sum of all records in cubic metres.
    #[must_use]
    pub fn total_m3(&self) -> f64 {
        litres_to_m3(self.total_l())
    }
}

impl FromIterator<u32> for UsageStatistics {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl FromPayload for UsageStatistics {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let hex = hex::encode_upper(payload);
        codec::chunk(&hex, 4)
            .map(|record| codec::decode_u32(record, 0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_water_big_endian() {
        let total = TotalWater::from_payload(&[0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(total.litres(), 0x0102_0304);
    }

    #[test]
    fn statistics_sum_records() {
        let stats =
            UsageStatistics::from_payload(&[0, 0, 0, 10, 0, 0, 0, 20, 0, 0, 1, 0]).unwrap();
        assert_eq!(stats.values(), [10, 20, 256]);
        assert_eq!(stats.total_l(), 286);
        assert!((stats.total_m3() - 0.286).abs() < 1e-9);
    }

    #[test]
    fn statistics_drop_partial_record() {
        let stats = UsageStatistics::from_payload(&[0, 0, 0, 5, 0, 0]).unwrap();
        assert_eq!(stats.values(), [5]);
    }

    #[test]
    fn statistics_empty() {
        let stats = UsageStatistics::from_payload(&[]).unwrap();
        assert!(stats.is_empty());
        assert_eq!(stats.total_l(), 0);
    }

    #[test]
    fn total_does_not_overflow() {
        let stats: UsageStatistics = [u32::MAX, u32::MAX].into_iter().collect();
        assert_eq!(stats.total_l(), 2 * u64::from(u32::MAX));
    }
}
