//! Lenient field access over untyped backend JSON.
//!
//! The backend is not consistent about field names or about whether a
//! reference is embedded as an object or sent as a bare id, so every accessor
//! takes a list of candidate keys and never fails: anything missing or of the
//! wrong shape reads as `None`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

/// Unwraps the common `{ success, data: ... }` envelope.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub fn as_object(value: &Value) -> Option<&Object> {
    value.as_object()
}

/// First non-null value among `keys`.
pub fn pick<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// String field; numbers are stringified, blank strings are treated as absent.
pub fn pick_str(obj: &Object, keys: &[&str]) -> Option<String> {
    pick(obj, keys).and_then(|value| match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Numeric field; numeric strings such as `"12.5"` are accepted.
pub fn pick_f64(obj: &Object, keys: &[&str]) -> Option<f64> {
    pick(obj, keys).and_then(|value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn pick_u64(obj: &Object, keys: &[&str]) -> Option<u64> {
    pick(obj, keys).and_then(|value| match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn pick_bool(obj: &Object, keys: &[&str]) -> Option<bool> {
    pick(obj, keys).and_then(|value| match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" | "1" | "on" | "yes" => Some(true),
            "false" | "0" | "off" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

pub fn pick_object<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Object> {
    pick(obj, keys).and_then(Value::as_object)
}

pub fn pick_array<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Vec<Value>> {
    pick(obj, keys).and_then(Value::as_array)
}

/// RFC 3339 timestamp or epoch milliseconds.
pub fn pick_datetime(obj: &Object, keys: &[&str]) -> Option<DateTime<Utc>> {
    pick(obj, keys).and_then(|value| match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

/// Id of a reference that may be embedded (`{ "_id": .. }`) or a bare id.
pub fn ref_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => pick_str(obj, &["_id", "id"]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn pick_prefers_first_present_key() {
        let o = obj(json!({ "company": "Acme", "companyName": "Acme Ltd" }));
        assert_eq!(pick_str(&o, &["companyName", "company"]).as_deref(), Some("Acme Ltd"));

        let o = obj(json!({ "companyName": null, "company": "Acme" }));
        assert_eq!(pick_str(&o, &["companyName", "company"]).as_deref(), Some("Acme"));
    }

    #[test]
    fn numbers_tolerate_strings() {
        let o = obj(json!({ "rate": "12.5", "count": 3.0, "bad": "x" }));
        assert_eq!(pick_f64(&o, &["rate"]), Some(12.5));
        assert_eq!(pick_u64(&o, &["count"]), Some(3));
        assert_eq!(pick_f64(&o, &["bad"]), None);
    }

    #[test]
    fn unwraps_data_envelope() {
        assert_eq!(unwrap_data(json!({ "success": true, "data": [1] })), json!([1]));
        assert_eq!(unwrap_data(json!({ "tags": [] })), json!({ "tags": [] }));
    }

    #[test]
    fn ref_id_accepts_object_or_string() {
        assert_eq!(ref_id(&json!("abc")).as_deref(), Some("abc"));
        assert_eq!(ref_id(&json!({ "_id": "def", "name": "x" })).as_deref(), Some("def"));
        assert_eq!(ref_id(&json!(null)), None);
    }

    #[test]
    fn datetime_parses_rfc3339() {
        let o = obj(json!({ "createdAt": "2024-03-01T10:00:00.000Z", "bad": "yesterday" }));
        assert!(pick_datetime(&o, &["createdAt"]).is_some());
        assert!(pick_datetime(&o, &["bad"]).is_none());
    }
}
