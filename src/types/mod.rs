// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed values read from and written to a leak guard.
//!
//! Each read model implements [`FromPayload`](crate::codec::FromPayload) and
//! decodes the big-endian payload of one command. Write models clamp caller
//! input into the device's accepted ranges at construction time.
//!
//! # Types
//!
//! - [`DeviceType`], [`SerialNumber`], [`FirmwareVersion`],
//!   [`InstallationDate`] - device identity
//! - [`DeviceClock`] - the device's local wall clock
//! - [`TotalWater`], [`UsageStatistics`] - consumption counters
//! - [`AbsenceLimits`], [`LeakPreset`], [`AbsenceWindow`], [`LearnStatus`] -
//!   leak protection settings
//! - [`UpdateTimestamp`] - freshness timestamps from the JSON endpoints

mod clock;
mod identity;
mod settings;
mod timestamp;
mod water;

pub use clock::{DeviceClock, MAX_YEAR, MIN_YEAR};
pub use identity::{DeviceType, FirmwareVersion, InstallationDate, SerialNumber};
pub use settings::{
    ABSENCE_SLOTS, AbsenceLimits, AbsenceWindow, LeakPreset, LearnStatus, MAX_MICRO_LEAK_MODE,
    MAX_VACATION_TYPE, SLEEP_HOURS, clamp_slot,
};
pub use timestamp::{TimestampParseError, UpdateTimestamp};
pub use water::{LITRES_PER_M3, TotalWater, UsageStatistics, litres_to_m3};
