//! Dates as the Remote Store encodes them.
//!
//! Older records carry epoch milliseconds (as a number or a numeric string),
//! newer ones ISO-8601 text. Both must sort together.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A creation date in whichever encoding the backend used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch.
    Epoch(i64),
    /// Any textual form, usually ISO-8601.
    Text(String),
}

impl Timestamp {
    /// The current instant as epoch milliseconds.
    #[must_use]
    pub fn now() -> Self {
        Self::Epoch(Utc::now().timestamp_millis())
    }

    /// Parse to UTC, or `None` if the encoding is not recognised.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(millis) => DateTime::from_timestamp_millis(*millis),
            Self::Text(raw) => parse_text(raw.trim()),
        }
    }

    /// Sort key in epoch milliseconds; unparsable dates sort as zero.
    #[must_use]
    pub fn sort_key(&self) -> i64 {
        self.to_datetime().map_or(0, |dt| dt.timestamp_millis())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Epoch(dt.timestamp_millis())
    }
}

fn parse_text(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // ISO without offset: treat as UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
