// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device's command table.
//!
//! | Command | Opcode | Kind | Response | Allow empty |
//! |---------|--------|------|----------|-------------|
//! | [`DEVICE_TYPE`] | `FF` | read | 1 byte | no |
//! | [`SERIAL_NUMBER`] | `06` | read | 4 bytes | no |
//! | [`FIRMWARE_VERSION`] | `01` | read | 3 bytes | no |
//! | [`INSTALLATION_DATE`] | `0E` | read | 4 bytes | no |
//! | [`TOTAL_WATER`] | `28` | read | 4 bytes | no |
//! | [`DEVICE_CLOCK`] | `59` | read | 6 bytes | no |
//! | [`SLEEP_DURATION`] | `66` | read | 1 byte | yes |
//! | [`ABSENCE_LIMITS`] | `5E` | read | 6 bytes | yes |
//! | [`MICRO_LEAK_MODE`] | `65` | read | 1 byte | yes |
//! | [`VACATION_TYPE`] | `56` | read | 1 byte | yes |
//! | [`LEARN_STATUS`] | `64` | read | 1-3 bytes | yes |
//! | [`ABSENCE_WINDOW`] | `60` | read | 6 bytes | yes |
//! | [`DAY_STATISTICS`] .. [`YEAR_STATISTICS`] | `FB`-`FE` | read | 4-byte records | yes |
//!
//! Writes and actions ignore the response body.

use crate::command::Command;
use crate::error::{ProtocolError, ValueError};

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Reads a value.
    Read,
    /// Writes a setting with a payload.
    Write,
    /// Triggers an action without payload.
    Action,
}

/// The payload size a command promises in its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// The response is not inspected.
    Ignored,
    /// Exactly `n` bytes.
    Exact(usize),
    /// Between `min` and `max` bytes, inclusive.
    Between(usize, usize),
    /// Any number of `n`-byte records.
    Records(usize),
}

impl PayloadShape {
    fn describe(self) -> String {
        match self {
            Self::Ignored => "any".to_string(),
            Self::Exact(n) => n.to_string(),
            Self::Between(min, max) => format!("{min}-{max}"),
            Self::Records(n) => format!("a multiple of {n}"),
        }
    }

    fn minimum(self) -> usize {
        match self {
            Self::Ignored => 0,
            Self::Exact(n) | Self::Records(n) => n,
            Self::Between(min, _) => min,
        }
    }

    fn accepts(self, len: usize) -> bool {
        match self {
            Self::Ignored => true,
            Self::Exact(n) => len == n,
            Self::Between(min, max) => (min..=max).contains(&len),
            Self::Records(n) => n != 0 && len % n == 0,
        }
    }
}

/// One entry of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Stable name used in logs and errors.
    pub name: &'static str,
    /// The opcode byte.
    pub opcode: u8,
    /// Read, write or action.
    pub kind: CommandKind,
    /// Size contract of the response payload.
    pub response: PayloadShape,
    /// Whether an absent or short payload means "unknown" instead of an error.
    pub allow_empty: bool,
}

impl CommandSpec {
    const fn read(name: &'static str, opcode: u8, response: PayloadShape) -> Self {
        Self {
            name,
            opcode,
            kind: CommandKind::Read,
            response,
            allow_empty: false,
        }
    }

    const fn optional_read(name: &'static str, opcode: u8, response: PayloadShape) -> Self {
        Self {
            name,
            opcode,
            kind: CommandKind::Read,
            response,
            allow_empty: true,
        }
    }

    const fn write(name: &'static str, opcode: u8) -> Self {
        Self {
            name,
            opcode,
            kind: CommandKind::Write,
            response: PayloadShape::Ignored,
            allow_empty: true,
        }
    }

    const fn action(name: &'static str, opcode: u8) -> Self {
        Self {
            name,
            opcode,
            kind: CommandKind::Action,
            response: PayloadShape::Ignored,
            allow_empty: true,
        }
    }

    /// Returns the command without payload.
    #[must_use]
    pub const fn bare(&self) -> Command {
        Command::bare(self.opcode)
    }

    /// Returns the command with the given payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::CommandTooLong`] if the payload exceeds
    /// [`MAX_PAYLOAD_LEN`](crate::command::MAX_PAYLOAD_LEN) bytes.
    pub fn with_payload(&self, payload: Vec<u8>) -> Result<Command, ValueError> {
        Command::new(self.opcode, payload)
    }

    /// Checks a decoded payload against the response contract.
    ///
    /// Returns `Ok(None)` when the payload is absent or short and the command
    /// allows empty responses.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingData`] for an absent payload and
    /// [`ProtocolError::UnexpectedLength`] for a wrongly sized one, unless
    /// `allow_empty` applies.
    pub fn validate(&self, payload: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, ProtocolError> {
        let payload = match payload {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ if self.allow_empty || self.response == PayloadShape::Ignored => return Ok(None),
            _ => return Err(ProtocolError::MissingData { command: self.name }),
        };

        if self.response.accepts(payload.len()) {
            return Ok(Some(payload));
        }
        if self.allow_empty && payload.len() < self.response.minimum() {
            return Ok(None);
        }
        Err(ProtocolError::UnexpectedLength {
            command: self.name,
            expected: self.response.describe(),
            actual: payload.len(),
        })
    }
}

/// Device type code.
pub const DEVICE_TYPE: CommandSpec = CommandSpec::read("device_type", 0xFF, PayloadShape::Exact(1));
/// Serial number.
pub const SERIAL_NUMBER: CommandSpec =
    CommandSpec::read("serial_number", 0x06, PayloadShape::Exact(4));
/// Firmware version.
pub const FIRMWARE_VERSION: CommandSpec =
    CommandSpec::read("firmware_version", 0x01, PayloadShape::Exact(3));
/// Installation date as epoch seconds.
pub const INSTALLATION_DATE: CommandSpec =
    CommandSpec::read("installation_date", 0x0E, PayloadShape::Exact(4));
/// Total water in litres.
pub const TOTAL_WATER: CommandSpec = CommandSpec::read("total_water", 0x28, PayloadShape::Exact(4));
/// Device clock.
pub const DEVICE_CLOCK: CommandSpec =
    CommandSpec::read("device_clock", 0x59, PayloadShape::Exact(6));
/// Sleep duration in hours.
pub const SLEEP_DURATION: CommandSpec =
    CommandSpec::optional_read("sleep_duration", 0x66, PayloadShape::Exact(1));
/// Absence limits.
pub const ABSENCE_LIMITS: CommandSpec =
    CommandSpec::optional_read("absence_limits", 0x5E, PayloadShape::Exact(6));
/// Micro-leak mode.
pub const MICRO_LEAK_MODE: CommandSpec =
    CommandSpec::optional_read("micro_leak_mode", 0x65, PayloadShape::Exact(1));
/// Vacation type.
pub const VACATION_TYPE: CommandSpec =
    CommandSpec::optional_read("vacation_type", 0x56, PayloadShape::Exact(1));
/// Learn mode status.
pub const LEARN_STATUS: CommandSpec =
    CommandSpec::optional_read("learn_status", 0x64, PayloadShape::Between(1, 3));
/// One absence window slot.
pub const ABSENCE_WINDOW: CommandSpec =
    CommandSpec::optional_read("absence_window", 0x60, PayloadShape::Exact(6));
/// Day statistics.
pub const DAY_STATISTICS: CommandSpec =
    CommandSpec::optional_read("day_statistics", 0xFB, PayloadShape::Records(4));
/// Week statistics.
pub const WEEK_STATISTICS: CommandSpec =
    CommandSpec::optional_read("week_statistics", 0xFC, PayloadShape::Records(4));
/// Month statistics.
pub const MONTH_STATISTICS: CommandSpec =
    CommandSpec::optional_read("month_statistics", 0xFD, PayloadShape::Records(4));
/// Year statistics.
pub const YEAR_STATISTICS: CommandSpec =
    CommandSpec::optional_read("year_statistics", 0xFE, PayloadShape::Records(4));

/// Leak preset: vacation type plus absence limits.
pub const WRITE_LEAK_PRESET: CommandSpec = CommandSpec::write("write_leak_preset", 0x50);
/// Sleep duration in hours.
pub const WRITE_SLEEP_DURATION: CommandSpec = CommandSpec::write("write_sleep_duration", 0x53);
/// Vacation type.
pub const WRITE_VACATION_TYPE: CommandSpec = CommandSpec::write("write_vacation_type", 0x56);
/// Device clock.
pub const WRITE_DEVICE_CLOCK: CommandSpec = CommandSpec::write("write_device_clock", 0x5A);
/// Micro-leak mode.
pub const WRITE_MICRO_LEAK_MODE: CommandSpec = CommandSpec::write("write_micro_leak_mode", 0x5B);
/// Absence limits.
pub const WRITE_ABSENCE_LIMITS: CommandSpec = CommandSpec::write("write_absence_limits", 0x5F);
/// One absence window slot.
pub const WRITE_ABSENCE_WINDOW: CommandSpec = CommandSpec::write("write_absence_window", 0x61);
/// Clears one absence window slot.
pub const DELETE_ABSENCE_WINDOW: CommandSpec = CommandSpec::write("delete_absence_window", 0x62);

/// Closes the valve.
pub const CLOSE_VALVE: CommandSpec = CommandSpec::action("close_valve", 0x51);
/// Opens the valve.
pub const OPEN_VALVE: CommandSpec = CommandSpec::action("open_valve", 0x52);
/// Starts sleep mode.
pub const SLEEP_START: CommandSpec = CommandSpec::action("sleep_start", 0x54);
/// Ends sleep mode.
pub const SLEEP_END: CommandSpec = CommandSpec::action("sleep_end", 0x55);
/// Starts vacation mode.
pub const VACATION_START: CommandSpec = CommandSpec::action("vacation_start", 0x57);
/// Ends vacation mode.
pub const VACATION_END: CommandSpec = CommandSpec::action("vacation_end", 0x58);
/// Triggers the micro-leak test.
pub const MICRO_LEAK_TEST: CommandSpec = CommandSpec::action("micro_leak_test", 0x5C);
/// Starts learn mode.
pub const LEARN_START: CommandSpec = CommandSpec::action("learn_start", 0x5D);
/// Acknowledges the active alarm.
pub const ACKNOWLEDGE_ALARM: CommandSpec = CommandSpec::action("acknowledge_alarm", 0x63);

/// Every command the device understands.
pub const REPERTOIRE: &[CommandSpec] = &[
    DEVICE_TYPE,
    SERIAL_NUMBER,
    FIRMWARE_VERSION,
    INSTALLATION_DATE,
    TOTAL_WATER,
    DEVICE_CLOCK,
    SLEEP_DURATION,
    ABSENCE_LIMITS,
    MICRO_LEAK_MODE,
    VACATION_TYPE,
    LEARN_STATUS,
    ABSENCE_WINDOW,
    DAY_STATISTICS,
    WEEK_STATISTICS,
    MONTH_STATISTICS,
    YEAR_STATISTICS,
    WRITE_LEAK_PRESET,
    WRITE_SLEEP_DURATION,
    WRITE_VACATION_TYPE,
    WRITE_DEVICE_CLOCK,
    WRITE_MICRO_LEAK_MODE,
    WRITE_ABSENCE_LIMITS,
    WRITE_ABSENCE_WINDOW,
    DELETE_ABSENCE_WINDOW,
    CLOSE_VALVE,
    OPEN_VALVE,
    SLEEP_START,
    SLEEP_END,
    VACATION_START,
    VACATION_END,
    MICRO_LEAK_TEST,
    LEARN_START,
    ACKNOWLEDGE_ALARM,
];

/// Looks up a command by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    REPERTOIRE.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, spec) in REPERTOIRE.iter().enumerate() {
            assert!(
                REPERTOIRE[i + 1..].iter().all(|other| other.name != spec.name),
                "duplicate command name {}",
                spec.name
            );
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("total_water"), Some(&TOTAL_WATER));
        assert!(lookup("unknown").is_none());
    }

    #[test]
    fn exact_shape_accepts_matching_length() {
        let payload = TOTAL_WATER.validate(Some(vec![0, 0, 1, 0])).unwrap();
        assert_eq!(payload, Some(vec![0, 0, 1, 0]));
    }

    #[test]
    fn required_read_rejects_wrong_length() {
        let short = TOTAL_WATER.validate(Some(vec![0, 1]));
        assert!(matches!(
            short,
            Err(ProtocolError::UnexpectedLength { actual: 2, .. })
        ));

        let long = TOTAL_WATER.validate(Some(vec![0; 5]));
        assert!(matches!(
            long,
            Err(ProtocolError::UnexpectedLength { actual: 5, .. })
        ));
    }

    #[test]
    fn required_read_rejects_missing_payload() {
        assert!(matches!(
            SERIAL_NUMBER.validate(None),
            Err(ProtocolError::MissingData {
                command: "serial_number"
            })
        ));
        assert!(SERIAL_NUMBER.validate(Some(Vec::new())).is_err());
    }

    #[test]
    fn optional_read_tolerates_absent_or_short_payload() {
        assert_eq!(ABSENCE_LIMITS.validate(None).unwrap(), None);
        assert_eq!(ABSENCE_LIMITS.validate(Some(vec![0, 1])).unwrap(), None);
    }

    #[test]
    fn optional_read_still_rejects_long_payload() {
        assert!(ABSENCE_LIMITS.validate(Some(vec![0; 7])).is_err());
    }

    #[test]
    fn records_shape_requires_whole_records() {
        assert!(DAY_STATISTICS.validate(Some(vec![0; 8])).unwrap().is_some());
        assert!(DAY_STATISTICS.validate(Some(vec![0; 6])).is_err());
        assert_eq!(DAY_STATISTICS.validate(Some(vec![0; 3])).unwrap(), None);
    }

    #[test]
    fn between_shape() {
        assert!(LEARN_STATUS.validate(Some(vec![1])).unwrap().is_some());
        assert!(LEARN_STATUS.validate(Some(vec![1, 0, 5])).unwrap().is_some());
        assert!(LEARN_STATUS.validate(Some(vec![1, 0, 5, 0])).is_err());
    }

    #[test]
    fn writes_ignore_response() {
        assert_eq!(WRITE_SLEEP_DURATION.validate(None).unwrap(), None);
        assert!(
            WRITE_SLEEP_DURATION
                .validate(Some(vec![1, 2, 3]))
                .unwrap()
                .is_some()
        );
    }
}
