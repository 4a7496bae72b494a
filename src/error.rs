// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `leakguard_lib` library.
//!
//! The hierarchy mirrors how failures are handled while polling a device:
//!
//! - [`Error::Authentication`] and [`Error::Connection`] are *fatal*: they
//!   mean the device or the session is unusable and abort a whole snapshot.
//! - [`Error::Protocol`], [`Error::Decode`] and [`Error::Value`] concern a
//!   single command and are absorbed field-by-field by the aggregator.
//!
//! Soft failures (HTTP 404 and non-auth 4xx/5xx) never become errors; the
//! transport turns them into empty responses.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The device rejected the credentials (HTTP 401 or 403).
    #[error("authentication failed (HTTP {status})")]
    Authentication {
        /// The HTTP status returned by the device.
        status: u16,
    },

    /// The device could not be reached, or kept rate limiting until the
    /// retry budget was exhausted.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A successful response carried a payload that does not match the
    /// command's contract.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A hex payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A value could not be encoded for the wire.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Returns `true` for errors that make the whole device unusable.
    ///
    /// The aggregator aborts a snapshot on fatal errors and skips the
    /// affected field on every other error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Connection(_))
    }
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The request did not complete within the configured timeout.
    #[error("timeout while requesting {url}")]
    Timeout {
        /// The requested URL.
        url: String,
    },

    /// The device could not be connected to.
    #[error("cannot connect to {url}: {message}")]
    Unreachable {
        /// The requested URL.
        url: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The device answered HTTP 429 on every attempt.
    #[error("rate limited on {url} after {attempts} attempts")]
    RateLimited {
        /// The requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The client was closed.
    #[error("client is closed")]
    Closed,

    /// Any other HTTP client failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Malformed or unexpected payloads in otherwise successful responses.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The response carried no data field for a command that requires one.
    #[error("no data returned for command {command}")]
    MissingData {
        /// Name of the command.
        command: &'static str,
    },

    /// The payload size does not match the command's contract.
    #[error("command {command} expected {expected} bytes, got {actual}")]
    UnexpectedLength {
        /// Name of the command.
        command: &'static str,
        /// Human readable description of the accepted sizes.
        expected: String,
        /// The size actually received.
        actual: usize,
    },

    /// The data field is not valid hex.
    #[error("invalid hex payload for command {command}: {source}")]
    InvalidPayload {
        /// Name of the command.
        command: &'static str,
        /// The decoding failure.
        source: DecodeError,
    },
}

/// Errors raised while decoding hex payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The hex string has an odd number of digits.
    #[error("hex string has odd length {0}")]
    OddLength(usize),

    /// The hex string contains a non-hex character.
    #[error("invalid hex character in {0:?}")]
    InvalidCharacter(String),

    /// A field window reaches past the end of the buffer.
    #[error("{width}-byte field at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        /// Byte offset of the field.
        offset: usize,
        /// Width of the field in bytes.
        width: usize,
        /// Length of the buffer in bytes.
        len: usize,
    },
}

/// Errors related to value validation and encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the field's range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The value that was provided.
        actual: i64,
    },

    /// The device clock stores the year as an offset from 2000 in one byte.
    #[error("year {0} cannot be stored by the device clock (2000-2255)")]
    YearOutOfRange(i32),

    /// A command payload exceeds the wire limit.
    #[error("command payload of {0} bytes exceeds the 79-byte limit")]
    CommandTooLong(usize),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 1,
            max: 10,
            actual: 12,
        };
        assert_eq!(err.to_string(), "value 12 is out of range [1, 10]");
    }

    #[test]
    fn error_from_decode_error() {
        let err: Error = DecodeError::OddLength(3).into();
        assert!(matches!(err, Error::Decode(DecodeError::OddLength(3))));
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::UnexpectedLength {
            command: "total_water",
            expected: "4".to_string(),
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "command total_water expected 4 bytes, got 2"
        );
    }

    #[test]
    fn fatal_classification() {
        assert!(Error::Authentication { status: 401 }.is_fatal());
        assert!(Error::Connection(ConnectionError::Closed).is_fatal());
        assert!(
            !Error::Protocol(ProtocolError::MissingData {
                command: "serial_number"
            })
            .is_fatal()
        );
        assert!(!Error::Value(ValueError::YearOutOfRange(1999)).is_fatal());
    }
}
