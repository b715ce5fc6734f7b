//! Semantic normalization — empty-string ≡ absent
//!
//! Raw attribute sets coming out of a data layer often flip between `""` and
//! `null` for the same logical "no value". Normalization maps both to `Null`
//! before any comparison so the diff engine never records that flip as a
//! change. Pure functions, applied independently to old and new values.

use serde_json::Value;

use crate::diff::AttributeMap;

/// Canonicalize a single value tree.
///
/// When `null_equals_empty_string` is true, every empty-string scalar at any
/// depth becomes `Null`; objects and arrays are walked recursively with keys
/// preserved. All other values pass through. The flag false is the identity.
pub fn normalize_value(value: Value, null_equals_empty_string: bool) -> Value {
    if !null_equals_empty_string {
        return value;
    }
    match value {
        Value::String(s) if s.is_empty() => Value::Null,
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_value(v, true)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| normalize_value(v, true))
                .collect(),
        ),
        other => other,
    }
}

/// Canonicalize every field of an attribute map.
pub fn normalize_attributes(map: AttributeMap, null_equals_empty_string: bool) -> AttributeMap {
    if !null_equals_empty_string {
        return map;
    }
    map.into_iter()
        .map(|(k, v)| (k, normalize_value(v, true)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_string_becomes_null() {
        assert_eq!(normalize_value(json!(""), true), Value::Null);
        assert_eq!(normalize_value(json!("x"), true), json!("x"));
        assert_eq!(normalize_value(json!(0), true), json!(0));
        assert_eq!(normalize_value(Value::Null, true), Value::Null);
    }

    #[test]
    fn test_recurses_into_nested_structures() {
        let v = json!({"profile": {"bio": "", "tags": ["", "rust"]}});
        let normalized = normalize_value(v, true);
        assert_eq!(
            normalized,
            json!({"profile": {"bio": null, "tags": [null, "rust"]}})
        );
    }

    #[test]
    fn test_flag_off_is_identity() {
        let v = json!({"bio": "", "n": 1});
        assert_eq!(normalize_value(v.clone(), false), v);
    }

    #[test]
    fn test_idempotent() {
        let v = json!({"a": "", "b": {"c": ["", null, "x"]}});
        let once = normalize_value(v, true);
        let twice = normalize_value(once.clone(), true);
        assert_eq!(once, twice);
    }
}
