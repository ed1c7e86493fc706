//! Lenient serde adapters for document fields.
//!
//! Documents arrive as loosely typed JSON. Text fields accept strings,
//! numbers and booleans; date fields accept RFC 3339 timestamps, plain
//! `YYYY-MM-DD` dates and epoch milliseconds. `null` always clears a field.
//! Anything else is rejected with a cast error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde_json::Value;

/// Render a scalar JSON value as text.
///
/// Returns `None` for `null`, arrays and objects.
#[must_use]
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a JSON value into a UTC timestamp truncated to milliseconds.
///
/// Returns `None` when the value cannot be interpreted as a date.
/// Fractional epoch milliseconds are truncated.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn as_date(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    parsed.map(|dt| dt.trunc_subsecs(3))
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a timestamp the way stored documents emit it.
#[must_use]
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `#[serde(with = "coerce::text")]` for `Option<String>` fields.
pub mod text {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    /// Serialize the text as-is.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    /// Deserialize a scalar into text.
    ///
    /// # Errors
    ///
    /// Fails for arrays and objects.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => super::as_text(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("Cast to string failed for value {value}"))),
        }
    }
}

/// `#[serde(with = "coerce::date")]` for `Option<DateTime<Utc>>` fields.
pub mod date {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    /// Serialize as RFC 3339 with milliseconds.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&super::format_date(dt)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize any accepted date representation.
    ///
    /// # Errors
    ///
    /// Fails when the value cannot be read as a date.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            value => super::as_date(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("Cast to date failed for value {value}"))),
        }
    }
}
