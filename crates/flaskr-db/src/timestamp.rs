//! Two-way timestamp codec for the store boundary.
//!
//! Timestamps are UTC with whole-second precision, stored as TEXT in the
//! form `YYYY-MM-DD HH:MM:SS`. That is the same form SQLite's
//! `CURRENT_TIMESTAMP` column default produces, so rows written by the
//! default and rows written by the application decode identically.
//! Sub-second components are truncated on encode.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, Serializer};

/// Storage format for timestamps.
pub const STORE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted on decode, most specific first.
const DECODE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Encodes `value` in the store representation, dropping sub-seconds.
pub fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.trunc_subsecs(0).format(STORE_FORMAT).to_string()
}

/// Decodes the store representation back into a UTC timestamp.
///
/// Accepts a space or `T` separator and an optional fractional-seconds
/// suffix (dropped), plus RFC 3339 strings with an explicit offset.
/// Returns `None` for anything else.
pub fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    for format in DECODE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().trunc_subsecs(0));
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(0))
}

/// A UTC timestamp at second precision that round-trips through SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wraps `value`, truncating it to whole seconds.
    pub fn new(value: DateTime<Utc>) -> Self {
        Self(value.trunc_subsecs(0))
    }

    /// The current time, truncated to whole seconds.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// The wrapped value.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_timestamp(self.0))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(encode_timestamp(self.0)))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(bytes) => {
                let raw = std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                decode_timestamp(raw).map(Timestamp).ok_or_else(|| {
                    FromSqlError::Other(format!("invalid timestamp: {raw:?}").into())
                })
            }
            // Unix seconds, as written by `strftime('%s')`.
            ValueRef::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .map(Timestamp)
                .ok_or(FromSqlError::OutOfRange(secs)),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}
