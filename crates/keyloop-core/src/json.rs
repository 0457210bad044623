//! Case-insensitive decoding of upstream JSON
//!
//! The upstream is not consistent about field-name casing. Bodies are first
//! parsed into a [`Value`], every object key is rewritten to canonical
//! camelCase, and only then deserialized into the camelCase model types.
//! Free-form payloads under [`OPAQUE_KEYS`] keep their keys verbatim.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Decode an upstream body, ignoring field-name casing
pub fn from_upstream_slice<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    let value: Value = serde_json::from_slice(bytes)?;
    serde_json::from_value(normalize_keys(value))
}

/// Fields carried as untyped JSON; their contents are not renamed
pub const OPAQUE_KEYS: &[&str] = &[
    "additionalDetail",
    "relations",
    "mandatoryVehicleReferences",
    "orderPrices",
    "unitOfMeasure",
];

/// Recursively rewrite object keys to canonical camelCase
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let key = canonical_key(&k);
                    if OPAQUE_KEYS.contains(&key.as_str()) {
                        (key, v)
                    } else {
                        (key, normalize_keys(v))
                    }
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Canonical camelCase form of a field name.
///
/// `PartId`, `partId`, `part_id`, `PART_ID` and `part-id` all become
/// `partId`. A key with no lowercase letters only splits on separators, so
/// `DESCRIPTION` becomes `description`.
pub fn canonical_key(key: &str) -> String {
    let has_lower = key.chars().any(char::is_lowercase);
    let chars: Vec<char> = key.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if has_lower && c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // "partId" splits before 'I'; "HTTPServer" splits before 'S'
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut out = String::with_capacity(key.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// Accept a JSON string or number and carry it as a string.
///
/// Part codes arrive as either depending on the brand.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

/// Accept RFC 3339 timestamps and offset-less ones, which are taken as UTC
pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| D::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_canonical_key_variants() {
        for key in ["partId", "PartId", "part_id", "PART_ID", "part-id", "Part_Id"] {
            assert_eq!(canonical_key(key), "partId", "key {}", key);
        }
        assert_eq!(canonical_key("DESCRIPTION"), "description");
        assert_eq!(canonical_key("description"), "description");
        assert_eq!(canonical_key("PartsOrderDateTime"), "partsOrderDateTime");
        assert_eq!(canonical_key("customerID"), "customerId");
        assert_eq!(canonical_key("HTTPServer"), "httpServer");
        assert_eq!(canonical_key("addressLine1"), "addressLine1");
        assert_eq!(canonical_key("access_token"), "accessToken");
        assert_eq!(canonical_key(""), "");
    }

    #[test]
    fn test_normalize_nested() {
        let value = json!({
            "Parts": [{"PartId": "P1", "ListPrice": {"NetValue": 1.5}}],
            "TotalItems": 1
        });
        assert_eq!(
            normalize_keys(value),
            json!({
                "parts": [{"partId": "P1", "listPrice": {"netValue": 1.5}}],
                "totalItems": 1
            })
        );
    }

    #[test]
    fn test_opaque_payloads_keep_their_keys() {
        let value = json!({
            "AdditionalDetail": {"loyalty_tier": "gold", "VIP": true, "dms-code": "X"},
            "order_prices": [{"NET_VALUE": 1}],
            "CustomerId": "C-1"
        });
        assert_eq!(
            normalize_keys(value),
            json!({
                "additionalDetail": {"loyalty_tier": "gold", "VIP": true, "dms-code": "X"},
                "orderPrices": [{"NET_VALUE": 1}],
                "customerId": "C-1"
            })
        );
    }

    #[derive(Debug, Deserialize)]
    struct Stamped {
        #[serde(default, deserialize_with = "opt_timestamp")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_timestamp_with_and_without_offset() {
        let expected = "2024-05-01T08:30:00Z".parse::<DateTime<Utc>>().unwrap();
        for raw in [
            "2024-05-01T08:30:00",
            "2024-05-01T08:30:00Z",
            "2024-05-01T10:30:00+02:00",
        ] {
            let s: Stamped = serde_json::from_value(json!({ "at": raw })).unwrap();
            assert_eq!(s.at, Some(expected), "{}", raw);
        }
        let frac: Stamped =
            serde_json::from_value(json!({"at": "2024-05-01T08:30:00.1234567"})).unwrap();
        assert!(frac.at.is_some());

        let none: Stamped = serde_json::from_value(json!({ "at": null })).unwrap();
        assert_eq!(none.at, None);
        assert!(serde_json::from_value::<Stamped>(json!({"at": "yesterday"})).is_err());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        part_id: Option<String>,
        #[serde(default, deserialize_with = "opt_string_or_number")]
        part_code: Option<String>,
    }

    #[test]
    fn test_from_upstream_slice_ignores_case() {
        let a: Sample = from_upstream_slice(br#"{"PARTID_x": 1, "PartId": "A", "partCode": 123}"#)
            .unwrap();
        assert_eq!(
            a,
            Sample {
                part_id: Some("A".into()),
                part_code: Some("123".into())
            }
        );

        let b: Sample = from_upstream_slice(br#"{"part_id": "B", "PART_CODE": "X-9"}"#).unwrap();
        assert_eq!(b.part_id.as_deref(), Some("B"));
        assert_eq!(b.part_code.as_deref(), Some("X-9"));
    }

    #[test]
    fn test_missing_optional_fields_stay_unset() {
        let s: Sample = from_upstream_slice(b"{}").unwrap();
        assert_eq!(
            s,
            Sample {
                part_id: None,
                part_code: None
            }
        );
    }

    #[test]
    fn test_part_code_rejects_objects() {
        let err = from_upstream_slice::<Sample>(br#"{"partCode": {"a": 1}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(from_upstream_slice::<Sample>(b"{not json").is_err());
        assert!(from_upstream_slice::<Sample>(b"").is_err());
    }
}
