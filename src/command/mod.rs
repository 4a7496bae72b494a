// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device command definitions.
//!
//! A device command is one opcode byte followed by up to 79 payload bytes,
//! all written as uppercase hex in the request path. A command without a
//! payload is sent in its padded four-digit form (`FF00`); a command with a
//! payload is sent as the two-digit opcode followed by the payload (`530A`).
//!
//! The [`table`] module lists every command the device understands together
//! with its response contract. The typed read/write operations live on
//! [`LeakGuardClient`](crate::LeakGuardClient).
//!
//! # Examples
//!
//! ```
//! use leakguard_lib::command::Command;
//!
//! let read = Command::bare(0x28);
//! assert_eq!(read.to_hex(), "2800");
//!
//! let write = Command::new(0x53, vec![0x0A]).unwrap();
//! assert_eq!(write.to_hex(), "530A");
//! ```

mod repertoire;
pub mod table;

pub use table::{CommandKind, CommandSpec, PayloadShape};

use crate::error::ValueError;

/// Largest payload accepted on the wire, so the full command fits in 80 bytes.
pub const MAX_PAYLOAD_LEN: usize = 79;

/// A single command ready to be sent to the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    opcode: u8,
    payload: Vec<u8>,
}

impl Command {
    /// Creates a command with a payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::CommandTooLong`] if the payload exceeds
    /// [`MAX_PAYLOAD_LEN`] bytes.
    pub fn new(opcode: u8, payload: Vec<u8>) -> Result<Self, ValueError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ValueError::CommandTooLong(payload.len()));
        }
        Ok(Self { opcode, payload })
    }

    /// Creates a command without payload.
    #[must_use]
    pub const fn bare(opcode: u8) -> Self {
        Self {
            opcode,
            payload: Vec::new(),
        }
    }

    /// Returns the opcode byte.
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns `true` if the command carries a payload.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Returns the padded four-digit opcode form, e.g. `"2800"`.
    #[must_use]
    pub fn opcode_hex(&self) -> String {
        format!("{:02X}00", self.opcode)
    }

    /// Returns the payload as uppercase hex.
    #[must_use]
    pub fn payload_hex(&self) -> String {
        hex::encode_upper(&self.payload)
    }

    /// Returns the full command as sent in the request path.
    #[must_use]
    pub fn to_hex(&self) -> String {
        if self.payload.is_empty() {
            self.opcode_hex()
        } else {
            format!("{:02X}{}", self.opcode, self.payload_hex())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command_is_padded() {
        assert_eq!(Command::bare(0xFF).to_hex(), "FF00");
        assert_eq!(Command::bare(0x06).to_hex(), "0600");
    }

    #[test]
    fn payload_follows_two_digit_opcode() {
        let cmd = Command::new(0x5F, vec![0x00, 0x64, 0x01, 0xF4, 0x00, 0x3C]).unwrap();
        assert_eq!(cmd.to_hex(), "5F006401F4003C");
        assert_eq!(cmd.opcode_hex(), "5F00");
        assert_eq!(cmd.payload_hex(), "006401F4003C");
    }

    #[test]
    fn encoded_length_is_even_and_bounded() {
        let cmd = Command::new(0x61, vec![0xAB; MAX_PAYLOAD_LEN]).unwrap();
        let hex = cmd.to_hex();
        assert_eq!(hex.len() % 2, 0);
        assert_eq!(hex.len(), 160);
    }

    #[test]
    fn oversized_payload_rejected() {
        let result = Command::new(0x61, vec![0; MAX_PAYLOAD_LEN + 1]);
        assert_eq!(result, Err(ValueError::CommandTooLong(80)));
    }
}
