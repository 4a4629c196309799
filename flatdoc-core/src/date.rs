//! Pluggable date (de)serialization.
//!
//! A date value is not a native JSON scalar, so it is encoded with a short
//! type tag at write time and reconstructed at read time: a one-entry
//! object, `{"$date": "<rfc3339>"}`. Since the storage collaborator's
//! documents are plain `serde_json::Value` trees, a tagged object
//! round-trips through them without extra bookkeeping.

use chrono::{DateTime, Utc};
use serde_json::Value;

const TAG: &str = "$date";

/// Encode a UTC timestamp as a tagged JSON value.
pub fn encode(dt: &DateTime<Utc>) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert(TAG.to_string(), Value::String(dt.to_rfc3339()));
    Value::Object(obj)
}

/// Decode a tagged date value back into a UTC timestamp, if `value` carries
/// the `$date` tag and its payload parses as RFC 3339.
pub fn decode(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_object()?.get(TAG)?.as_str()?;
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Whether a value is a tagged date (used by storage backends when deciding
/// whether a field needs reconstruction on read).
pub fn is_tagged_date(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.len() == 1 && obj.contains_key(TAG))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips_through_json() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        let encoded = encode(&dt);
        assert!(is_tagged_date(&encoded));
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, dt);
    }

    #[test]
    fn plain_values_are_not_tagged_dates() {
        assert!(!is_tagged_date(&serde_json::json!({"a": 1})));
        assert!(!is_tagged_date(&serde_json::json!("2024-03-05")));
        assert!(decode(&serde_json::json!({"a": 1})).is_none());
    }
}
