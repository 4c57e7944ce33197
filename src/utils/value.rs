//! Helper functions for extracting values from loosely-typed JSON objects.
//!
//! Hand-edited plant files mix numbers with numeric strings and lists with
//! comma-separated strings. These helpers accept both and return `None`
//! for anything else instead of failing the whole record.

use serde_json::{Map, Value};

/// First non-null value among `keys` (aliases tried in order).
pub fn field<'a>(data: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .find(|v| !v.is_null())
}

/// Extract a non-blank string.
pub fn get_str<'a>(data: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    field(data, keys)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Extract a non-negative integer that fits in u32.
pub fn get_u32(data: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    field(data, keys).and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
            .and_then(|n| u32::try_from(n).ok())
    })
}

/// Extract a list of strings from an array or a `,`/`;` separated string.
///
/// Non-string array members are skipped. Returns `None` when the field is
/// absent or has an unusable type, `Some(vec![])` for an empty list.
pub fn get_string_list(data: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    match field(data, keys)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        ),
        Value::String(s) => Some(
            s.split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        ),
        _ => None,
    }
}

/// Extract a nested object.
pub fn get_object<'a>(
    data: &'a Map<String, Value>,
    keys: &[&str],
) -> Option<&'a Map<String, Value>> {
    field(data, keys).and_then(|v| v.as_object())
}

/// Numeric JSON value or string-encoded number.
pub(crate) fn value_as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_str_aliases() {
        let data = obj(json!({"name": "  ", "display_name": "Basil", "other": null}));
        assert_eq!(get_str(&data, &["name"]), None);
        assert_eq!(get_str(&data, &["other", "display_name"]), Some("Basil"));
    }

    #[test]
    fn test_numeric_strings() {
        let data = obj(json!({"a": 6.5, "b": "7.0", "c": "n/a", "d": 60, "e": "75", "f": -3}));
        assert_eq!(field(&data, &["a"]).and_then(value_as_f64), Some(6.5));
        assert_eq!(field(&data, &["b"]).and_then(value_as_f64), Some(7.0));
        assert_eq!(field(&data, &["c"]).and_then(value_as_f64), None);
        assert_eq!(get_u32(&data, &["d"]), Some(60));
        assert_eq!(get_u32(&data, &["e"]), Some(75));
        assert_eq!(get_u32(&data, &["f"]), None);
    }

    #[test]
    fn test_string_lists() {
        let data = obj(json!({
            "arr": ["Basil", 3, " Marigold ", ""],
            "csv": "Basil, Marigold;Borage",
            "bad": {"x": 1}
        }));
        assert_eq!(get_string_list(&data, &["arr"]), Some(vec!["Basil".into(), "Marigold".into()]));
        assert_eq!(
            get_string_list(&data, &["csv"]),
            Some(vec!["Basil".into(), "Marigold".into(), "Borage".into()])
        );
        assert_eq!(get_string_list(&data, &["bad"]), None);
        assert_eq!(get_string_list(&data, &["missing"]), None);
    }
}
