//! Lenient field decoders for backend payloads.
//!
//! The automation backend does not guarantee field shapes, so every optional
//! attribute is decoded through one of these helpers: a value of the wrong
//! shape becomes "absent" instead of failing the whole record.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => Some(raw),
        _ => None,
    })
}

pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| value.as_u64()))
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| value.as_f64()))
}

/// Keeps `null` distinct from a missing key only where callers care; here both
/// collapse to `None`.
pub fn opt_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    })
}

pub fn opt_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(raw) if !raw.trim().is_empty() => Some(raw),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

pub fn value_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

pub fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

/// Decodes each array element independently and drops the ones that do not
/// fit `T`.
pub fn decode_each<T>(items: Vec<Value>) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "opt_u64")]
        count: Option<u64>,
        #[serde(default, deserialize_with = "opt_string_list")]
        urls: Option<Vec<String>>,
    }

    #[test]
    fn wrong_shapes_collapse_to_absent() {
        let probe: Probe = serde_json::from_value(json!({
            "name": 12,
            "count": "seven",
            "urls": "not-a-list"
        }))
        .expect("decode");
        assert_eq!(probe.name, None);
        assert_eq!(probe.count, None);
        assert_eq!(probe.urls, None);
    }

    #[test]
    fn string_lists_skip_blank_and_non_string_items() {
        let probe: Probe = serde_json::from_value(json!({
            "urls": ["a.png", "", 3, "b.png"]
        }))
        .expect("decode");
        assert_eq!(
            probe.urls,
            Some(vec!["a.png".to_string(), "b.png".to_string()])
        );
    }

    #[test]
    fn decode_each_drops_malformed_items() {
        let decoded: Vec<u32> = decode_each(vec![json!(1), json!("x"), json!(3)]);
        assert_eq!(decoded, vec![1, 3]);
    }
}
