//! Microsecond-precision timestamp type
//!
//! Datastore timestamps are UTC instants with microsecond precision.
//!
//! ## Precision
//!
//! Timestamps are stored as signed microseconds since Unix epoch
//! (1970-01-01 00:00:00 UTC), so instants before the epoch are representable.
//!
//! ## Text Form
//!
//! The storage encoding is ISO-8601 without offset and with exactly six
//! fractional digits (`2013-01-21T10:15:00.000250`). Fixed width means the
//! lexicographic order of the text form equals chronological order for years
//! 0000 through 9999, which the storage engine relies on when sorting.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const ISO_FORMAT_NO_FRACTION: &str = "%Y-%m-%dT%H:%M:%S";

/// Microsecond-precision UTC timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Create a timestamp for the current moment
    ///
    /// Returns epoch if the system clock is before the Unix epoch.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as i64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from seconds since epoch
    #[inline]
    pub const fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// Convert to a chrono UTC datetime
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_micros(self.0).single()
    }

    /// Render the fixed-width ISO-8601 storage form
    pub fn to_iso(&self) -> Result<String> {
        let datetime = self.to_datetime().ok_or_else(|| {
            Error::invalid_value(format!("timestamp {} is out of range", self.0))
        })?;
        Ok(datetime.format(ISO_FORMAT).to_string())
    }

    /// Parse the ISO-8601 storage form
    ///
    /// Accepts the form with and without fractional seconds.
    pub fn parse_iso(text: &str) -> Result<Self> {
        let naive = NaiveDateTime::parse_from_str(text, ISO_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(text, ISO_FORMAT_NO_FRACTION))
            .map_err(|e| Error::corrupt(format!("invalid timestamp '{}': {}", text, e)))?;
        Ok(Timestamp(naive.and_utc().timestamp_micros()))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Timestamp(datetime.timestamp_micros())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_iso() {
            Ok(text) => write!(f, "{}Z", text),
            Err(_) => write!(f, "{}us", self.0),
        }
    }
}
