// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Big-endian hex codec for the device's REST command set.
//!
//! Every value travelling between the library and the device is written as
//! uppercase hex. Multi-byte integers are big-endian. Encoders come in two
//! flavours:
//!
//! - [`encode_u8`], [`encode_u16`] and [`encode_u32`] clamp into the field's
//!   range, which is what every write command uses.
//! - [`try_encode_u8`], [`try_encode_u16`] and [`try_encode_u32`] reject
//!   out-of-range input with [`ValueError::OutOfRange`].
//!
//! # Examples
//!
//! ```
//! use leakguard_lib::codec;
//!
//! assert_eq!(codec::encode_u16(0x1234), "1234");
//! assert_eq!(codec::encode_u8(300), "FF");
//! assert_eq!(codec::decode_u16("001234", 1).unwrap(), 0x1234);
//! assert_eq!(codec::normalize_hex(" \"0x2a\" ").unwrap(), "2A");
//! ```

use crate::error::{DecodeError, ValueError};

/// A type that can be decoded from a raw device payload.
pub trait FromPayload: Sized {
    /// Decodes the value from the payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is too short.
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError>;
}

/// Single-byte settings such as modes and durations.
impl FromPayload for u8 {
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        read_u8(payload, 0)
    }
}

/// Clamps `value` into `[min, max]`.
#[must_use]
pub fn clamp(value: i64, min: i64, max: i64) -> i64 {
    value.clamp(min, max)
}

/// Clamps `value` into `[min, max]` and narrows it to a byte.
#[must_use]
pub fn clamp_u8(value: i64, min: u8, max: u8) -> u8 {
    // Safe: the clamped value lies within u8 bounds
    u8::try_from(clamp(value, i64::from(min), i64::from(max))).unwrap_or(max)
}

/// Clamps `value` into the full `u16` range.
#[must_use]
pub fn clamp_u16(value: i64) -> u16 {
    u16::try_from(clamp(value, 0, i64::from(u16::MAX))).unwrap_or(u16::MAX)
}

/// Clamps `value` into the full `u32` range.
#[must_use]
pub fn clamp_u32(value: i64) -> u32 {
    u32::try_from(clamp(value, 0, i64::from(u32::MAX))).unwrap_or(u32::MAX)
}

/// Encodes a byte, clamping to `0..=255`.
#[must_use]
pub fn encode_u8(value: i64) -> String {
    hex::encode_upper([clamp_u8(value, 0, u8::MAX)])
}

/// Encodes a big-endian `u16`, clamping to `0..=65535`.
#[must_use]
pub fn encode_u16(value: i64) -> String {
    hex::encode_upper(clamp_u16(value).to_be_bytes())
}

/// Encodes a big-endian `u32`, clamping to `0..=2^32-1`.
#[must_use]
pub fn encode_u32(value: i64) -> String {
    hex::encode_upper(clamp_u32(value).to_be_bytes())
}

fn check_range(value: i64, max: i64) -> Result<(), ValueError> {
    if (0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValueError::OutOfRange {
            min: 0,
            max,
            actual: value,
        })
    }
}

/// Encodes a byte, rejecting values outside `0..=255`.
///
/// # Errors
///
/// Returns [`ValueError::OutOfRange`] for out-of-range input.
pub fn try_encode_u8(value: i64) -> Result<String, ValueError> {
    check_range(value, i64::from(u8::MAX))?;
    Ok(encode_u8(value))
}

/// Encodes a big-endian `u16`, rejecting out-of-range input.
///
/// # Errors
///
/// Returns [`ValueError::OutOfRange`] for out-of-range input.
pub fn try_encode_u16(value: i64) -> Result<String, ValueError> {
    check_range(value, i64::from(u16::MAX))?;
    Ok(encode_u16(value))
}

/// Encodes a big-endian `u32`, rejecting out-of-range input.
///
/// # Errors
///
/// Returns [`ValueError::OutOfRange`] for out-of-range input.
pub fn try_encode_u32(value: i64) -> Result<String, ValueError> {
    check_range(value, i64::from(u32::MAX))?;
    Ok(encode_u32(value))
}

/// Normalizes a hex string received from the device.
///
/// Strips surrounding whitespace and quotes, an optional `0x` prefix and any
/// interior whitespace, then upper-cases the result. An empty input yields an
/// empty string.
///
/// # Errors
///
/// Returns [`DecodeError::OddLength`] or [`DecodeError::InvalidCharacter`]
/// when the cleaned string is not valid hex.
pub fn normalize_hex(raw: &str) -> Result<String, DecodeError> {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    let unprefixed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let cleaned: String = unprefixed
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidCharacter(raw.to_string()));
    }
    if cleaned.len() % 2 != 0 {
        return Err(DecodeError::OddLength(cleaned.len()));
    }
    Ok(cleaned)
}

/// Decodes a hex string into bytes after normalizing it.
///
/// # Errors
///
/// Returns [`DecodeError`] if the input is not valid hex.
pub fn to_bytes(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned = normalize_hex(raw)?;
    hex::decode(&cleaned).map_err(|_| DecodeError::InvalidCharacter(raw.to_string()))
}

fn window(bytes: &[u8], offset: usize, width: usize) -> Result<&[u8], DecodeError> {
    offset
        .checked_add(width)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(DecodeError::OutOfBounds {
            offset,
            width,
            len: bytes.len(),
        })
}

/// Reads a byte at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::OutOfBounds`] if the buffer is too short.
pub fn read_u8(bytes: &[u8], offset: usize) -> Result<u8, DecodeError> {
    Ok(window(bytes, offset, 1)?[0])
}

/// Reads a big-endian `u16` at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::OutOfBounds`] if the buffer is too short.
pub fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let w = window(bytes, offset, 2)?;
    Ok(u16::from_be_bytes([w[0], w[1]]))
}

/// Reads a big-endian `u32` at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::OutOfBounds`] if the buffer is too short.
pub fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let w = window(bytes, offset, 4)?;
    Ok(u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
}

/// Decodes a byte from a hex string at byte `offset`.
///
/// # Errors
///
/// Returns [`DecodeError`] for invalid hex or an out-of-bounds window.
pub fn decode_u8(hex: &str, offset: usize) -> Result<u8, DecodeError> {
    read_u8(&to_bytes(hex)?, offset)
}

/// Decodes a big-endian `u16` from a hex string at byte `offset`.
///
/// # Errors
///
/// Returns [`DecodeError`] for invalid hex or an out-of-bounds window.
pub fn decode_u16(hex: &str, offset: usize) -> Result<u16, DecodeError> {
    read_u16(&to_bytes(hex)?, offset)
}

/// Decodes a big-endian `u32` from a hex string at byte `offset`.
///
/// # Errors
///
/// Returns [`DecodeError`] for invalid hex or an out-of-bounds window.
pub fn decode_u32(hex: &str, offset: usize) -> Result<u32, DecodeError> {
    read_u32(&to_bytes(hex)?, offset)
}

/// Decodes an ASCII string, dropping NUL padding and surrounding spaces.
///
/// # Errors
///
/// Returns [`DecodeError`] if the input is not valid hex.
pub fn decode_ascii(hex: &str) -> Result<String, DecodeError> {
    let bytes = to_bytes(hex)?;
    let text: String = bytes
        .iter()
        .filter(|b| b.is_ascii() && **b != 0)
        .map(|b| char::from(*b))
        .collect();
    Ok(text.trim().to_string())
}

/// Splits a flat hex payload into `width`-byte records.
///
/// Only complete records are yielded; a trailing partial record is dropped.
/// A zero width yields nothing.
///
/// ```
/// use leakguard_lib::codec::chunk;
///
/// let records: Vec<&str> = chunk("0000000A0000000B", 4).collect();
/// assert_eq!(records, ["0000000A", "0000000B"]);
/// ```
pub fn chunk(hex: &str, width: usize) -> impl Iterator<Item = &str> + '_ {
    let step = width * 2;
    let count = if step == 0 { 0 } else { hex.len() / step };
    (0..count).filter_map(move |i| hex.get(i * step..(i + 1) * step))
}
