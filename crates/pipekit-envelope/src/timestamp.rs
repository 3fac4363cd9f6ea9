//! Envelope timestamps.
//!
//! Stamps written here are naive UTC, ISO-8601 with microsecond precision,
//! so they sort as strings. Timestamps read from an incoming envelope are
//! kept as the text they arrived with. [`Timestamp::now`] is the only clock
//! read in the crate.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Output format for every timestamp this crate creates.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Accepts any fractional precision, including none.
const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// An envelope timestamp as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Current UTC time, truncated to what [`FORMAT`] can carry.
    pub fn now() -> Self {
        let now = Utc::now().naive_utc();
        let now = now
            .with_nanosecond(now.nanosecond() / 1_000 * 1_000)
            .unwrap_or(now);
        Self::from_datetime(&now)
    }

    pub fn from_datetime(datetime: &NaiveDateTime) -> Self {
        Self(format(datetime))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Interpret the text as a UTC date-time; see [`parse`].
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        parse(&self.0)
    }
}

impl From<String> for Timestamp {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Timestamp {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn format(datetime: &NaiveDateTime) -> String {
    datetime.format(FORMAT).to_string()
}

/// Parse a naive timestamp, an RFC 3339 one converted to UTC, or a bare
/// date read as midnight.
pub fn parse(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, PARSE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|parsed| parsed.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Serde adapter for optional timestamps.
///
/// `null` and `""` both read as absent. Anything else is kept verbatim.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<Timestamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(timestamp) => serializer.serialize_str(timestamp.as_str()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.filter(|value| !value.is_empty()).map(Timestamp))
    }
}
