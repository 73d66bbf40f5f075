//! JSON encoding and decoding of API payloads.
//!
//! Dates on the wire are local date-times without an offset. They are written
//! as `YYYY-MM-DDThh:mm:ss.sss` and read in that format or, for older
//! records, without the milliseconds.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format used for encoding and tried first when decoding.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Legacy format without milliseconds.
pub const LEGACY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Serialize a request payload.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Deserialize a response body.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// A date-time as the API sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiDate(pub NaiveDateTime);

impl ApiDate {
    /// Parse either accepted format.
    pub fn parse(value: &str) -> Result<Self, String> {
        NaiveDateTime::parse_from_str(value, DATE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(value, LEGACY_DATE_FORMAT))
            .map(ApiDate)
            .map_err(|_| format!("Cannot decode date string {}", value))
    }

    /// Midnight of the given day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(ApiDate)
    }

    /// Current local time, for new logs and drafts.
    pub fn now() -> Self {
        ApiDate(chrono::Local::now().naive_local())
    }
}

impl From<NaiveDateTime> for ApiDate {
    fn from(value: NaiveDateTime) -> Self {
        ApiDate(value)
    }
}

impl std::fmt::Display for ApiDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for ApiDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ApiDate::parse(&raw).map_err(serde::de::Error::custom)
    }
}
