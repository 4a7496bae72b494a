// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device's wall clock.
//!
//! The clock travels as six bytes: day, month, year offset from 2000, hour,
//! minute and second. The device keeps local time without timezone, so the
//! clock maps to a [`NaiveDateTime`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::codec::{self, FromPayload};
use crate::error::{DecodeError, ValueError};

/// First year the clock can represent.
pub const MIN_YEAR: i32 = 2000;
/// Last year the clock can represent.
pub const MAX_YEAR: i32 = MIN_YEAR + 255;

/// Clock value as stored by the device.
///
/// # Examples
///
/// ```
/// use leakguard_lib::codec::FromPayload;
/// use leakguard_lib::types::DeviceClock;
///
/// let clock = DeviceClock::from_payload(&[15, 6, 24, 12, 30, 0]).unwrap();
/// assert_eq!(clock.year, 2024);
/// assert_eq!(clock.to_payload(), [15, 6, 24, 12, 30, 0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceClock {
    /// Day of month.
    pub day: u8,
    /// Month (1-12).
    pub month: u8,
    /// Full year (2000-2255).
    pub year: u16,
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
    /// Second (0-59).
    pub second: u8,
}

impl DeviceClock {
    /// Builds a clock value from a datetime.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::YearOutOfRange`] for years outside 2000-2255.
    pub fn from_datetime(datetime: &NaiveDateTime) -> Result<Self, ValueError> {
        let year = datetime.year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ValueError::YearOutOfRange(year));
        }
        // Calendar fields fit a byte; the year was range-checked above
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let clock = Self {
            day: datetime.day() as u8,
            month: datetime.month() as u8,
            year: year as u16,
            hour: datetime.hour() as u8,
            minute: datetime.minute() as u8,
            second: datetime.second() as u8,
        };
        Ok(clock)
    }

    /// Returns the six-byte wire form.
    #[must_use]
    pub fn to_payload(&self) -> [u8; 6] {
        let offset = u8::try_from(i32::from(self.year) - MIN_YEAR).unwrap_or(u8::MAX);
        [
            self.day,
            self.month,
            offset,
            self.hour,
            self.minute,
            self.second,
        ]
    }

    /// Returns the clock as a datetime, or `None` if the fields do not form
    /// a valid calendar date.
    ///
    /// Zero day or month values, which some firmwares report before the
    /// clock has been set, are read as 1.
    #[must_use]
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month.max(1)),
            u32::from(self.day.max(1)),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }
}

impl FromPayload for DeviceClock {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let offset = codec::read_u8(payload, 2)?;
        Ok(Self {
            day: codec::read_u8(payload, 0)?,
            month: codec::read_u8(payload, 1)?,
            year: 2000 + u16::from(offset),
            hour: codec::read_u8(payload, 3)?,
            minute: codec::read_u8(payload, 4)?,
            second: codec::read_u8(payload, 5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn decode_six_bytes() {
        let clock = DeviceClock::from_payload(&[0x0F, 0x06, 0x18, 0x0C, 0x1E, 0x05]).unwrap();
        assert_eq!(clock.day, 15);
        assert_eq!(clock.month, 6);
        assert_eq!(clock.year, 2024);
        assert_eq!(clock.hour, 12);
        assert_eq!(clock.minute, 30);
        assert_eq!(clock.second, 5);
        assert_eq!(clock.to_datetime(), Some(datetime(2024, 6, 15, 12, 30, 5)));
    }

    #[test]
    fn decode_short_payload_fails() {
        assert!(DeviceClock::from_payload(&[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn encode_from_datetime() {
        let clock = DeviceClock::from_datetime(&datetime(2031, 12, 24, 18, 5, 59)).unwrap();
        assert_eq!(clock.to_payload(), [24, 12, 31, 18, 5, 59]);
    }

    #[test]
    fn year_bounds() {
        assert!(DeviceClock::from_datetime(&datetime(2000, 1, 1, 0, 0, 0)).is_ok());
        let last = DeviceClock::from_datetime(&datetime(2255, 12, 31, 23, 59, 59)).unwrap();
        assert_eq!(last.to_payload()[2], 255);
        assert_eq!(
            DeviceClock::from_datetime(&datetime(1999, 12, 31, 0, 0, 0)),
            Err(ValueError::YearOutOfRange(1999))
        );
        assert_eq!(
            DeviceClock::from_datetime(&datetime(2256, 1, 1, 0, 0, 0)),
            Err(ValueError::YearOutOfRange(2256))
        );
    }

    #[test]
    fn unset_clock_reads_as_first_of_month() {
        let clock = DeviceClock::from_payload(&[0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(clock.to_datetime(), Some(datetime(2000, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn invalid_calendar_date() {
        let clock = DeviceClock::from_payload(&[31, 2, 24, 0, 0, 0]).unwrap();
        assert!(clock.to_datetime().is_none());
    }
}
