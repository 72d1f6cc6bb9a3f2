//! Field decoding for tracker APIs that are loose about JSON types.
//!
//! Counts arrive as numbers, numeric strings, `null`, or garbage depending on
//! the indexer. Anything that is not a non-negative integer reads as 0.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn u64_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn u32_from_value(value: &Value) -> u32 {
    u64_from_value(value).min(u32::MAX as u64) as u32
}

pub(crate) fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(u64_from_value).unwrap_or(0))
}

pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(u32_from_value).unwrap_or(0))
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_from_value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_u64_from_value() {
        assert_eq!(u64_from_value(&json!(42)), 42);
        assert_eq!(u64_from_value(&json!("1234")), 1234);
        assert_eq!(u64_from_value(&json!(" 7 ")), 7);
        assert_eq!(u64_from_value(&json!(12.9)), 12);
        assert_eq!(u64_from_value(&json!(-3)), 0);
        assert_eq!(u64_from_value(&json!("-3")), 0);
        assert_eq!(u64_from_value(&json!("lots")), 0);
        assert_eq!(u64_from_value(&json!(null)), 0);
        assert_eq!(u64_from_value(&json!([1])), 0);
    }

    #[test]
    fn test_u32_saturates() {
        assert_eq!(u32_from_value(&json!(u64::MAX)), u32::MAX);
    }

    #[test]
    fn test_string_from_value() {
        assert_eq!(string_from_value(&json!("abc")), Some("abc".to_string()));
        assert_eq!(string_from_value(&json!(0)), Some("0".to_string()));
        assert_eq!(string_from_value(&json!("  ")), None);
        assert_eq!(string_from_value(&json!(null)), None);
    }

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_u32")]
        seeders: u32,
        #[serde(default, deserialize_with = "lenient_u64")]
        size: u64,
        #[serde(default, deserialize_with = "lenient_string")]
        id: String,
    }

    #[test]
    fn test_lenient_struct_fields() {
        let row: Row = serde_json::from_value(json!({
            "seeders": "15",
            "size": null,
            "id": 0
        }))
        .unwrap();
        assert_eq!(row.seeders, 15);
        assert_eq!(row.size, 0);
        assert_eq!(row.id, "0");

        let empty: Row = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.seeders, 0);
        assert_eq!(empty.size, 0);
        assert_eq!(empty.id, "");
    }
}
