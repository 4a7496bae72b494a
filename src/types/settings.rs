// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Leak protection settings: absence limits, presets, schedules and learn mode.
//!
//! Constructors that take caller input clamp every field into the range the
//! device accepts, so a value built here can always be written.

use crate::codec::{self, FromPayload};
use crate::error::DecodeError;

/// Number of absence window slots.
pub const ABSENCE_SLOTS: u8 = 7;

/// Highest vacation type (0 = off, 1-3 = device presets).
pub const MAX_VACATION_TYPE: u8 = 3;

/// Highest micro-leak mode (0 = off, 1 = notify, 2 = notify and close).
pub const MAX_MICRO_LEAK_MODE: u8 = 2;

/// Sleep duration bounds in hours.
pub const SLEEP_HOURS: (u8, u8) = (1, 10);

/// Thresholds that trigger a leak alarm while nobody is home.
///
/// # Examples
///
/// ```
/// use leakguard_lib::types::AbsenceLimits;
///
/// let limits = AbsenceLimits::new(100, 500, 60);
/// assert_eq!(limits.to_payload(), [0x00, 0x64, 0x01, 0xF4, 0x00, 0x3C]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbsenceLimits {
    /// Maximum flow in litres per hour.
    pub flow_l_h: u16,
    /// Maximum volume in litres.
    pub volume_l: u16,
    /// Maximum duration in minutes.
    pub duration_min: u16,
}

impl AbsenceLimits {
    /// Creates limits from raw values.
    #[must_use]
    pub const fn new(flow_l_h: u16, volume_l: u16, duration_min: u16) -> Self {
        Self {
            flow_l_h,
            volume_l,
            duration_min,
        }
    }

    /// Creates limits from unchecked input, clamping each field to `u16`.
    #[must_use]
    pub fn clamped(flow_l_h: i64, volume_l: i64, duration_min: i64) -> Self {
        Self::new(
            codec::clamp_u16(flow_l_h),
            codec::clamp_u16(volume_l),
            codec::clamp_u16(duration_min),
        )
    }

    /// Returns the six-byte wire form.
    #[must_use]
    pub fn to_payload(&self) -> [u8; 6] {
        let [f0, f1] = self.flow_l_h.to_be_bytes();
        let [v0, v1] = self.volume_l.to_be_bytes();
        let [d0, d1] = self.duration_min.to_be_bytes();
        [f0, f1, v0, v1, d0, d1]
    }
}

impl FromPayload for AbsenceLimits {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            flow_l_h: codec::read_u16(payload, 0)?,
            volume_l: codec::read_u16(payload, 2)?,
            duration_min: codec::read_u16(payload, 4)?,
        })
    }
}

/// A vacation type combined with absence limits, written in one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeakPreset {
    vacation_type: u8,
    limits: AbsenceLimits,
}

impl LeakPreset {
    /// Creates a preset, clamping the vacation type to `0..=3`.
    #[must_use]
    pub fn new(vacation_type: i64, limits: AbsenceLimits) -> Self {
        Self {
            vacation_type: codec::clamp_u8(vacation_type, 0, MAX_VACATION_TYPE),
            limits,
        }
    }

    /// Returns the vacation type.
    #[must_use]
    pub const fn vacation_type(&self) -> u8 {
        self.vacation_type
    }

    /// Returns the absence limits.
    #[must_use]
    pub const fn limits(&self) -> AbsenceLimits {
        self.limits
    }

    /// Returns the seven-byte wire form.
    #[must_use]
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(7);
        payload.push(self.vacation_type);
        payload.extend_from_slice(&self.limits.to_payload());
        payload
    }
}

/// A weekly absence schedule entry.
///
/// Days count from 0 (Monday) to 6 (Sunday).
///
/// # Examples
///
/// ```
/// use leakguard_lib::types::AbsenceWindow;
///
/// let window = AbsenceWindow::new(9, 0, 8, 0, 4, 30, 75);
/// assert_eq!(window.slot(), 6);
/// assert_eq!(window.to_payload(), [6, 0, 8, 0, 4, 23, 59]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbsenceWindow {
    slot: u8,
    start_day: u8,
    start_hour: u8,
    start_minute: u8,
    end_day: u8,
    end_hour: u8,
    end_minute: u8,
}

impl AbsenceWindow {
    /// Creates a window, clamping every field into its range.
    #[must_use]
    pub fn new(
        slot: i64,
        start_day: i64,
        start_hour: i64,
        start_minute: i64,
        end_day: i64,
        end_hour: i64,
        end_minute: i64,
    ) -> Self {
        Self {
            slot: clamp_slot(slot),
            start_day: codec::clamp_u8(start_day, 0, 6),
            start_hour: codec::clamp_u8(start_hour, 0, 23),
            start_minute: codec::clamp_u8(start_minute, 0, 59),
            end_day: codec::clamp_u8(end_day, 0, 6),
            end_hour: codec::clamp_u8(end_hour, 0, 23),
            end_minute: codec::clamp_u8(end_minute, 0, 59),
        }
    }

    /// Decodes the six-byte read response for `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is shorter than six bytes.
    pub fn from_payload(slot: u8, payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            slot,
            start_day: codec::read_u8(payload, 0)?,
            start_hour: codec::read_u8(payload, 1)?,
            start_minute: codec::read_u8(payload, 2)?,
            end_day: codec::read_u8(payload, 3)?,
            end_hour: codec::read_u8(payload, 4)?,
            end_minute: codec::read_u8(payload, 5)?,
        })
    }

    /// Returns the slot index (0-6).
    #[must_use]
    pub const fn slot(&self) -> u8 {
        self.slot
    }

    /// Start day of week.
    #[must_use]
    pub const fn start_day(&self) -> u8 {
        self.start_day
    }

    /// Start hour.
    #[must_use]
    pub const fn start_hour(&self) -> u8 {
        self.start_hour
    }

    /// Start minute.
    #[must_use]
    pub const fn start_minute(&self) -> u8 {
        self.start_minute
    }

    /// End day of week.
    #[must_use]
    pub const fn end_day(&self) -> u8 {
        self.end_day
    }

    /// End hour.
    #[must_use]
    pub const fn end_hour(&self) -> u8 {
        self.end_hour
    }

    /// End minute.
    #[must_use]
    pub const fn end_minute(&self) -> u8 {
        self.end_minute
    }

    /// Returns `true` unless every schedule field is zero.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        [
            self.start_day,
            self.start_hour,
            self.start_minute,
            self.end_day,
            self.end_hour,
            self.end_minute,
        ]
        .iter()
        .any(|v| *v != 0)
    }

    /// Returns the seven-byte write form: slot followed by the schedule.
    ///
    /// Fields decoded from a device response are clamped here, so the write
    /// always stays in range.
    #[must_use]
    pub fn to_payload(&self) -> [u8; 7] {
        [
            self.slot.min(ABSENCE_SLOTS - 1),
            self.start_day.min(6),
            self.start_hour.min(23),
            self.start_minute.min(59),
            self.end_day.min(6),
            self.end_hour.min(23),
            self.end_minute.min(59),
        ]
    }
}

/// Clamps a slot index to `0..=6`.
#[must_use]
pub fn clamp_slot(slot: i64) -> u8 {
    codec::clamp_u8(slot, 0, ABSENCE_SLOTS - 1)
}

/// Learn mode status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LearnStatus {
    /// Whether learn mode is running.
    pub active: bool,
    /// Litres left to learn, if the firmware reports it.
    pub remaining_l: Option<u16>,
}

impl FromPayload for LearnStatus {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let active = codec::read_u8(payload, 0)? != 0;
        let remaining_l = if payload.len() >= 3 {
            Some(codec::read_u16(payload, 1)?)
        } else {
            None
        };
        Ok(Self {
            active,
            remaining_l,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absence_limits_decode() {
        let limits = AbsenceLimits::from_payload(&[0x00, 0x64, 0x01, 0xF4, 0x00, 0x3C]).unwrap();
        assert_eq!(limits, AbsenceLimits::new(100, 500, 60));
    }

    #[test]
    fn absence_limits_clamp() {
        let limits = AbsenceLimits::clamped(-1, 70_000, 30);
        assert_eq!(limits, AbsenceLimits::new(0, u16::MAX, 30));
    }

    #[test]
    fn leak_preset_payload() {
        let preset = LeakPreset::new(7, AbsenceLimits::new(1, 2, 3));
        assert_eq!(preset.vacation_type(), 3);
        assert_eq!(preset.to_payload(), vec![3, 0, 1, 0, 2, 0, 3]);
    }

    #[test]
    fn absence_window_clamps_every_field() {
        let window = AbsenceWindow::new(-2, 8, 24, 60, -1, -1, 99);
        assert_eq!(window.to_payload(), [0, 6, 23, 59, 0, 0, 59]);
    }

    #[test]
    fn absence_window_decode() {
        let window = AbsenceWindow::from_payload(3, &[1, 22, 0, 2, 6, 30]).unwrap();
        assert_eq!(window.slot(), 3);
        assert_eq!(window.start_hour(), 22);
        assert_eq!(window.end_minute(), 30);
        assert!(window.is_configured());
        assert!(
            !AbsenceWindow::from_payload(0, &[0; 6])
                .unwrap()
                .is_configured()
        );
    }

    #[test]
    fn decoded_out_of_range_window_is_clamped_for_writing() {
        let window = AbsenceWindow::from_payload(0, &[1, 200, 0, 99, 16, 0]).unwrap();
        assert_eq!(window.start_hour(), 200);
        assert_eq!(window.to_payload(), [0, 1, 23, 0, 6, 16, 0]);
    }

    #[test]
    fn learn_status_with_and_without_remaining() {
        let short = LearnStatus::from_payload(&[1]).unwrap();
        assert!(short.active);
        assert_eq!(short.remaining_l, None);

        let full = LearnStatus::from_payload(&[0, 0x01, 0x2C]).unwrap();
        assert!(!full.active);
        assert_eq!(full.remaining_l, Some(300));
    }
}
