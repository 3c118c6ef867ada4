use chrono::{DateTime, NaiveDateTime, Utc};

/// Remote task identifiers are opaque strings assigned by the training service.
pub type TaskId = String;

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Parse a timestamp as emitted by the training service.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, `...+02:00`) as well as naive
/// ISO-8601 values without an offset (`2024-01-01T00:00:00.123456`), which
/// are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(rfc_err) => raw
            .parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(|_| rfc_err),
    }
}

/// Serde adapter for optional timestamps using [`parse_timestamp`].
///
/// Use together with `#[serde(default)]` so that a missing field becomes
/// `None` rather than an error.
pub mod lenient_timestamp {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{parse_timestamp, Timestamp};

    pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse_timestamp(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_rfc3339_with_zulu() {
        let ts = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn parses_rfc3339_with_offset_into_utc() {
        let ts = parse_timestamp("2024-01-01T02:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 0);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn parses_naive_timestamp_as_utc() {
        let ts = parse_timestamp("2024-03-05T10:11:12.345678").unwrap();
        assert_eq!(ts.day(), 5);
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
