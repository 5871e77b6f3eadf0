// src/models/market.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bucket as delivered by the data feed.
///
/// Every field defaults to zero when the upstream source omits it. Nothing here
/// is validated: ordering and positivity are the feed's responsibility.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct OhlcvRecord {
    /// Bucket open time, milliseconds since the Unix epoch
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvRecord {
    /// Bucket open time as a UTC datetime, if the timestamp is representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
