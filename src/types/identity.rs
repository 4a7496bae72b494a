// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identity: type code, serial number, firmware and installation date.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::codec::{self, FromPayload};
use crate::error::DecodeError;

/// Device type code as reported by command `FF`.
///
/// # Examples
///
/// ```
/// use leakguard_lib::types::DeviceType;
///
/// let device = DeviceType::new(0x44);
/// assert_eq!(device.hex(), "0x44");
/// assert_eq!(device.label(), "ZEWA i-SAFE");
/// assert_eq!(DeviceType::new(0x33).label(), "0x33");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceType(u8);

impl DeviceType {
    /// Type code of the ZEWA i-SAFE / Leakguard.
    pub const ZEWA_I_SAFE: Self = Self(0x44);

    /// Wraps a raw type code.
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Returns the raw type code.
    #[must_use]
    pub const fn code(&self) -> u8 {
        self.0
    }

    /// Returns the code formatted as `0xNN`.
    #[must_use]
    pub fn hex(&self) -> String {
        format!("0x{:02X}", self.0)
    }

    /// Returns a readable model name, or the hex code for unknown types.
    #[must_use]
    pub fn label(&self) -> String {
        match *self {
            Self::ZEWA_I_SAFE => "ZEWA i-SAFE".to_string(),
            _ => self.hex(),
        }
    }
}

impl FromPayload for DeviceType {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self(codec::read_u8(payload, 0)?))
    }
}

/// Device serial number (4 bytes, big-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerialNumber(u32);

impl SerialNumber {
    /// Wraps a raw serial number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the numeric serial.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromPayload for SerialNumber {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self(codec::read_u32(payload, 0)?))
    }
}

/// Firmware version (3 bytes: major, minor, patch).
///
/// # Examples
///
/// ```
/// use leakguard_lib::codec::FromPayload;
/// use leakguard_lib::types::FirmwareVersion;
///
/// let fw = FirmwareVersion::from_payload(&[2, 4, 11]).unwrap();
/// assert_eq!(fw.to_string(), "2.4.11");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Patch level.
    pub patch: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromPayload for FirmwareVersion {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            major: codec::read_u8(payload, 0)?,
            minor: codec::read_u8(payload, 1)?,
            patch: codec::read_u8(payload, 2)?,
        })
    }
}

/// Installation date as Unix epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstallationDate(u32);

impl InstallationDate {
    /// Wraps raw epoch seconds.
    #[must_use]
    pub const fn new(timestamp: u32) -> Self {
        Self(timestamp)
    }

    /// Returns the raw epoch seconds.
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        self.0
    }

    /// Returns the date as a UTC datetime.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(i64::from(self.0), 0).single()
    }
}

impl FromPayload for InstallationDate {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self(codec::read_u32(payload, 0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_labels() {
        assert_eq!(DeviceType::ZEWA_I_SAFE.label(), "ZEWA i-SAFE");
        assert_eq!(DeviceType::new(0x0A).label(), "0x0A");
        assert_eq!(
            DeviceType::from_payload(&[0x44]).unwrap(),
            DeviceType::ZEWA_I_SAFE
        );
    }

    #[test]
    fn serial_is_big_endian() {
        let serial = SerialNumber::from_payload(&[0x00, 0x01, 0xE2, 0x40]).unwrap();
        assert_eq!(serial.value(), 123_456);
        assert_eq!(serial.to_string(), "123456");
    }

    #[test]
    fn firmware_requires_three_bytes() {
        assert!(FirmwareVersion::from_payload(&[1, 2]).is_err());
        let fw = FirmwareVersion::from_payload(&[1, 2, 3]).unwrap();
        assert_eq!(fw.to_string(), "1.2.3");
    }

    #[test]
    fn installation_date_to_datetime() {
        let date = InstallationDate::from_payload(&[0x66, 0x6D, 0x89, 0x48]).unwrap();
        assert_eq!(date.timestamp(), 0x666D_8948);
        assert_eq!(
            date.to_datetime().unwrap().to_rfc3339(),
            "2024-06-15T12:30:00+00:00"
        );
    }
}
