//! Key-based redaction of sensitive fields
//!
//! Any object key whose lowercase form is in the configured mask set has its
//! value replaced with [`MASK_MARKER`], whatever the value's type or nesting
//! depth. Redaction is irreversible and happens before persistence; masked
//! diffs are re-derived from masked snapshots (see the diff engine) so the
//! two never disagree.

use std::collections::HashSet;

use serde_json::Value;

use crate::diff::AttributeMap;

/// The literal marker stored in place of a redacted value.
pub const MASK_MARKER: &str = "***";

/// Redact every masked key in an attribute map.
///
/// `mask_keys` must hold lowercase names; matching is case-insensitive on the
/// data side. An empty set returns the input unchanged. Unmasked siblings and
/// nested structures are walked further; array elements are recursed
/// elementwise (indices are never mask keys).
pub fn mask_attributes(map: AttributeMap, mask_keys: &HashSet<String>) -> AttributeMap {
    if mask_keys.is_empty() {
        return map;
    }
    map.into_iter()
        .map(|(k, v)| {
            let masked = if mask_keys.contains(&k.to_lowercase()) {
                Value::String(MASK_MARKER.to_string())
            } else {
                mask_value(v, mask_keys)
            };
            (k, masked)
        })
        .collect()
}

fn mask_value(value: Value, mask_keys: &HashSet<String>) -> Value {
    match value {
        Value::Object(map) => Value::Object(mask_attributes(map, mask_keys)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| mask_value(v, mask_keys))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn obj(v: Value) -> AttributeMap {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_masks_regardless_of_value_type() {
        let data = obj(json!({"password": {"hash": "h", "salt": "s"}, "n": 1}));
        let masked = mask_attributes(data, &keys(&["password"]));
        assert_eq!(masked["password"], json!(MASK_MARKER));
        assert_eq!(masked["n"], json!(1));
    }

    #[test]
    fn test_case_insensitive_on_data_keys() {
        let data = obj(json!({"Token": "abc", "API_Key": "k"}));
        let masked = mask_attributes(data, &keys(&["token", "api_key"]));
        assert_eq!(masked["Token"], json!(MASK_MARKER));
        assert_eq!(masked["API_Key"], json!(MASK_MARKER));
    }

    #[test]
    fn test_walks_nested_and_arrays() {
        let data = obj(json!({
            "profile": {"secret": "s", "name": "a"},
            "creds": [{"token": "t"}, {"public": true}]
        }));
        let masked = mask_attributes(data, &keys(&["secret", "token"]));
        assert_eq!(masked["profile"]["secret"], json!(MASK_MARKER));
        assert_eq!(masked["profile"]["name"], json!("a"));
        assert_eq!(masked["creds"][0]["token"], json!(MASK_MARKER));
        assert_eq!(masked["creds"][1]["public"], json!(true));
    }

    #[test]
    fn test_empty_key_set_is_identity() {
        let data = obj(json!({"password": "visible"}));
        let masked = mask_attributes(data.clone(), &HashSet::new());
        assert_eq!(masked, data);
    }

    #[test]
    fn test_idempotent() {
        let data = obj(json!({"password": "p", "nested": {"token": 5}}));
        let mask_keys = keys(&["password", "token"]);
        let once = mask_attributes(data, &mask_keys);
        let twice = mask_attributes(once.clone(), &mask_keys);
        assert_eq!(once, twice);
    }
}
