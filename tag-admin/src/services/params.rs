//! Query-string sanitization shared by every list endpoint, and encoding of
//! ids placed into backend paths.

use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

use super::error::ApiError;

/// Value the filter dropdowns use for "no filter".
const ALL: &str = "all";

/// Serializes a filter struct into query pairs, dropping `null`, empty and
/// `"all"` values. Nested arrays/objects are not valid filters and are skipped.
pub fn sanitize_params<T: Serialize>(filters: &T) -> Vec<(String, String)> {
    let value = match serde_json::to_value(filters) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize filters, sending none");
            return Vec::new();
        }
    };

    let Value::Object(map) = value else {
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL) {
                        return None;
                    }
                    trimmed.to_string()
                }
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((key, text))
        })
        .collect()
}

/// Percent-encodes one path segment so `?`, `#` and `/` in an id cannot change
/// the request target. Dot segments are refused outright: URL parsing collapses
/// them even when encoded.
pub fn path_segment(raw: &str) -> Result<Cow<'_, str>, ApiError> {
    let trimmed = raw.trim();
    let is_dots = trimmed
        .to_ascii_lowercase()
        .replace("%2e", ".")
        .chars()
        .all(|c| c == '.');
    if is_dots {
        return Err(ApiError::precondition(format!("Invalid identifier '{}'", raw)));
    }
    Ok(urlencoding::encode(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Filters {
        status: Option<String>,
        batch_name: Option<String>,
        search: Option<String>,
        page: Option<u32>,
        limit: u32,
    }

    #[test]
    fn drops_empty_null_and_all() {
        let params = sanitize_params(&Filters {
            status: Some("all".to_string()),
            batch_name: Some("  ".to_string()),
            search: None,
            page: Some(2),
            limit: 10,
        });

        assert_eq!(
            params,
            vec![
                ("limit".to_string(), "10".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn keeps_real_values_trimmed() {
        let params = sanitize_params(&Filters {
            status: Some("activated".to_string()),
            batch_name: Some(" March ".to_string()),
            search: Some("ABC".to_string()),
            page: None,
            limit: 25,
        });

        assert!(params.contains(&("status".to_string(), "activated".to_string())));
        assert!(params.contains(&("batchName".to_string(), "March".to_string())));
        assert!(params.contains(&("search".to_string(), "ABC".to_string())));
        assert!(!params.iter().any(|(k, _)| k == "page"));
    }

    #[test]
    fn path_segment_encodes_reserved_characters() {
        assert_eq!(path_segment("QX7K2").unwrap(), "QX7K2");
        assert_eq!(path_segment("ABC?X9").unwrap(), "ABC%3FX9");
        assert_eq!(path_segment("../admin").unwrap(), "..%2Fadmin");
        assert_eq!(path_segment("a b#c").unwrap(), "a%20b%23c");
    }

    #[test]
    fn path_segment_refuses_dot_segments() {
        for raw in ["", " ", ".", "..", "%2e%2E"] {
            assert!(path_segment(raw).is_err(), "{raw:?} accepted");
        }
    }
}
