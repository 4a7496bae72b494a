// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recursive merge of JSON objects.

use serde_json::{Map, Value};

/// Merges `update` into `base`.
///
/// Nested objects are merged key by key; any other value in `update`
/// replaces the one in `base`.
///
/// # Examples
///
/// ```
/// use leakguard_lib::snapshot::deep_merge;
/// use serde_json::json;
///
/// let mut base = json!({"meta": {"model": "i-SAFE"}, "flow": 0})
///     .as_object().cloned().unwrap();
/// let update = json!({"meta": {"serial": "123"}, "flow": 4})
///     .as_object().cloned().unwrap();
///
/// deep_merge(&mut base, update);
/// assert_eq!(
///     serde_json::Value::Object(base),
///     json!({"meta": {"model": "i-SAFE", "serial": "123"}, "flow": 4})
/// );
/// ```
pub fn deep_merge(base: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        match value {
            Value::Object(incoming) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => deep_merge(existing, incoming),
                _ => {
                    base.insert(key, Value::Object(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn nested_objects_merge() {
        let mut base = object(json!({"a": {"b": 1, "c": {"d": 2}}}));
        deep_merge(&mut base, object(json!({"a": {"c": {"e": 3}}})));
        assert_eq!(
            Value::Object(base),
            json!({"a": {"b": 1, "c": {"d": 2, "e": 3}}})
        );
    }

    #[test]
    fn scalars_and_type_changes_replace() {
        let mut base = object(json!({"a": {"b": 1}, "x": 1}));
        deep_merge(&mut base, object(json!({"a": 5, "x": "two"})));
        assert_eq!(Value::Object(base), json!({"a": 5, "x": "two"}));
    }

    #[test]
    fn empty_update_is_noop() {
        let mut base = object(json!({"a": 1}));
        deep_merge(&mut base, Map::new());
        assert_eq!(Value::Object(base), json!({"a": 1}));
    }
}
