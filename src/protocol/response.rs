// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of REST command response bodies.
//!
//! Depending on the firmware, the device answers a command with one of:
//!
//! - a JSON object: `{"data": "2A"}` (or a list whose first element is one)
//! - a form string: `data=2A`, or several `key=value` pairs joined by `&`
//! - bare hex text: `2A`
//! - an empty body
//!
//! [`parse`] turns all of them into one flat map and never fails; anything it
//! cannot classify ends up under the `raw` key. [`extract_data_field`] then
//! picks the hex payload out of that map.
//!
//! # Examples
//!
//! ```
//! use leakguard_lib::protocol::WireResponse;
//!
//! for body in [r#"{"data":"2A"}"#, "data=2A", "2A"] {
//!     assert_eq!(WireResponse::from_body(body).data().as_deref(), Some("2A"));
//! }
//! ```

use serde_json::{Map, Value};

/// Keys that may carry the hex payload, in lookup order.
const DATA_KEYS: [&str; 5] = ["data", "Data", "DATA", "value", "Value"];

/// Key holding an unclassified body.
pub const RAW_KEY: &str = "raw";

/// How a response body was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// The body was empty or whitespace.
    Empty,
    /// The body was a JSON object.
    Json,
    /// The body was `data=...` or `key=value` pairs.
    Form,
    /// Anything else, kept verbatim under `raw`.
    Raw,
}

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    kind: BodyKind,
    fields: Map<String, Value>,
}

impl WireResponse {
    /// Returns an empty response, used for soft failures.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kind: BodyKind::Empty,
            fields: Map::new(),
        }
    }

    /// Parses a raw response body.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        let (kind, fields) = classify(body);
        Self { kind, fields }
    }

    /// Returns how the body was classified.
    #[must_use]
    pub const fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Returns the parsed fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns `true` if the response carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the hex payload, if any.
    #[must_use]
    pub fn data(&self) -> Option<String> {
        extract_data_field(&self.fields)
    }
}

/// Parses a response body into a flat map.
///
/// Never fails: unparseable bodies are returned as `{"raw": <trimmed>}`.
#[must_use]
pub fn parse(body: &str) -> Map<String, Value> {
    classify(body).1
}

fn classify(body: &str) -> (BodyKind, Map<String, Value>) {
    let cleaned = body.trim();
    if cleaned.is_empty() {
        return (BodyKind::Empty, Map::new());
    }

    if let Some(object) = parse_json_object(cleaned) {
        return (BodyKind::Json, object);
    }

    if let Some(rest) = strip_prefix_ignore_case(cleaned, "data=") {
        let mut map = Map::new();
        map.insert("data".to_string(), Value::String(rest.trim().to_string()));
        return (BodyKind::Form, map);
    }

    let pairs: Map<String, Value> = cleaned
        .split('&')
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().to_string(),
                Value::String(value.trim().to_string()),
            )
        })
        .collect();
    if !pairs.is_empty() {
        return (BodyKind::Form, pairs);
    }

    let mut map = Map::new();
    map.insert(RAW_KEY.to_string(), Value::String(cleaned.to_string()));
    (BodyKind::Raw, map)
}

fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.into_iter().find_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        }),
        _ => None,
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// Extracts the hex payload from a parsed response.
///
/// Looks at `data`, `Data`, `DATA`, `value` and `Value` in that order. A
/// list of byte values is re-encoded as hex. Without any of these keys the
/// `raw` body is used, but only if it is valid hex.
#[must_use]
pub fn extract_data_field(fields: &Map<String, Value>) -> Option<String> {
    for key in DATA_KEYS {
        let Some(value) = fields.get(key) else {
            continue;
        };
        match value {
            Value::Null => {}
            Value::String(s) => return Some(s.clone()),
            Value::Number(n) => return Some(n.to_string()),
            Value::Array(items) => {
                if let Some(hex) = bytes_to_hex(items) {
                    return Some(hex);
                }
            }
            other => return Some(other.to_string()),
        }
    }

    let raw = fields.get(RAW_KEY)?.as_str()?;
    let candidate = raw.trim();
    let is_hex = !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_hexdigit());
    is_hex.then(|| candidate.to_string())
}

fn bytes_to_hex(items: &[Value]) -> Option<String> {
    items
        .iter()
        .map(|item| {
            let value = item.as_i64()?;
            // Masking keeps the low byte, as the device firmware does
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let byte = (value & 0xFF) as u8;
            Some(format!("{byte:02X}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_empty_map() {
        assert!(parse("").is_empty());
        assert!(parse("  \n").is_empty());
        assert_eq!(WireResponse::from_body(" ").kind(), BodyKind::Empty);
    }

    #[test]
    fn json_object_is_returned_as_is() {
        let map = parse(r#"{"data":"2A","status":"ok"}"#);
        assert_eq!(map.get("status"), Some(&json!("ok")));
        assert_eq!(extract_data_field(&map).as_deref(), Some("2A"));
    }

    #[test]
    fn json_list_yields_first_object() {
        let response = WireResponse::from_body(r#"[{"data":"0102"},{"data":"FFFF"}]"#);
        assert_eq!(response.kind(), BodyKind::Json);
        assert_eq!(response.data().as_deref(), Some("0102"));
    }

    #[test]
    fn json_scalar_falls_back_to_raw() {
        let response = WireResponse::from_body("12");
        assert_eq!(response.kind(), BodyKind::Raw);
        assert_eq!(response.data().as_deref(), Some("12"));
    }

    #[test]
    fn form_data_prefix_is_case_insensitive() {
        assert_eq!(parse("DATA=00FF").get("data"), Some(&json!("00FF")));
        assert_eq!(parse("data= 2A ").get("data"), Some(&json!("2A")));
    }

    #[test]
    fn key_value_pairs() {
        let response = WireResponse::from_body("status=1&value=0A0B");
        assert_eq!(response.kind(), BodyKind::Form);
        assert_eq!(response.fields().get("status"), Some(&json!("1")));
        assert_eq!(response.data().as_deref(), Some("0A0B"));
    }

    #[test]
    fn bare_hex_goes_to_raw() {
        let map = parse("  00003039 ");
        assert_eq!(map.get(RAW_KEY), Some(&json!("00003039")));
        assert_eq!(extract_data_field(&map).as_deref(), Some("00003039"));
    }

    #[test]
    fn non_hex_raw_has_no_data() {
        let response = WireResponse::from_body("<html>error</html>");
        assert_eq!(response.kind(), BodyKind::Raw);
        assert!(response.data().is_none());
    }

    #[test]
    fn data_key_precedence() {
        let map = parse(r#"{"Value":"BB","data":"AA"}"#);
        assert_eq!(extract_data_field(&map).as_deref(), Some("AA"));
    }

    #[test]
    fn byte_list_is_reencoded() {
        let map = parse(r#"{"data":[0,1,255,16]}"#);
        assert_eq!(extract_data_field(&map).as_deref(), Some("0001FF10"));
    }

    #[test]
    fn invalid_byte_list_moves_to_next_key() {
        let map = parse(r#"{"data":["x"],"value":"2A"}"#);
        assert_eq!(extract_data_field(&map).as_deref(), Some("2A"));
    }

    #[test]
    fn null_data_is_skipped() {
        let map = parse(r#"{"data":null}"#);
        assert!(extract_data_field(&map).is_none());
    }
}
