//! Dynamically-typed field values.
//!
//! Values are what a saved row carries per field; they serialize to the
//! JSON representation the insert endpoint expects.

use std::collections::BTreeMap;
use std::fmt;

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::util::{
    date_to_days, format_date, format_datetime, format_time, format_timestamp, MAX_DATE_DAYS,
    MAX_EPOCH_MICROS, MAX_TIME_MICROS, MIN_DATE_DAYS, MIN_EPOCH_MICROS,
};

/// A saved row: field name to value.
///
/// Field names are unique; iteration order is by name so the JSON encoding
/// is deterministic.
pub type Row = BTreeMap<String, Value>;

/// Column types a schema field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int64,
    Float64,
    Numeric,
    String,
    Bytes,
    Date,
    Time,
    Datetime,
    Timestamp,
    Record,
}

impl FieldType {
    /// Returns the type name as used in table schemas.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "BOOLEAN",
            FieldType::Int64 => "INTEGER",
            FieldType::Float64 => "FLOAT",
            FieldType::Numeric => "NUMERIC",
            FieldType::String => "STRING",
            FieldType::Bytes => "BYTES",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::Datetime => "DATETIME",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Record => "RECORD",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically-typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (NULL column).
    Null,

    Bool(bool),

    Int64(i64),

    /// 64-bit IEEE 754 float. Non-finite values are sent as strings.
    Float64(f64),

    /// Exact decimal in its canonical string form (e.g. `"123.45"`).
    Numeric(String),

    String(String),

    /// Opaque bytes, sent base64-encoded.
    Bytes(Vec<u8>),

    /// Calendar date.
    Date {
        /// Signed days since Unix epoch (1970-01-01).
        days: i32,
    },

    /// Time of day.
    Time {
        /// Microseconds since midnight (0 to 86,399,999,999).
        time_us: i64,
    },

    /// Civil date and time with no zone.
    Datetime {
        /// Microseconds since 1970-01-01T00:00:00 (civil).
        epoch_us: i64,
    },

    /// Absolute point in time.
    Timestamp {
        /// Microseconds since the Unix epoch (UTC).
        epoch_us: i64,
    },

    /// Repeated value.
    Array(Vec<Value>),

    /// Nested record.
    Record(Row),
}

impl Value {
    /// Creates a `Date` value from a calendar date, or `None` if the date is invalid.
    pub fn date(year: i32, month: u32, day: u32) -> Option<Value> {
        date_to_days(year, month, day).map(|days| Value::Date { days })
    }

    /// Returns the column type this value can fill, or `None` for `Null` and arrays.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Null | Value::Array(_) => None,
            Value::Bool(_) => Some(FieldType::Bool),
            Value::Int64(_) => Some(FieldType::Int64),
            Value::Float64(_) => Some(FieldType::Float64),
            Value::Numeric(_) => Some(FieldType::Numeric),
            Value::String(_) => Some(FieldType::String),
            Value::Bytes(_) => Some(FieldType::Bytes),
            Value::Date { .. } => Some(FieldType::Date),
            Value::Time { .. } => Some(FieldType::Time),
            Value::Datetime { .. } => Some(FieldType::Datetime),
            Value::Timestamp { .. } => Some(FieldType::Timestamp),
            Value::Record(_) => Some(FieldType::Record),
        }
    }

    /// Short description of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Array(_) => "array",
            other => other.field_type().map(FieldType::name).unwrap_or("value"),
        }
    }

    /// Returns true if this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Checks that a temporal value is within the range its wire form can
    /// represent (years 0001 to 9999, time of day within one day).
    ///
    /// Returns a reason if not. Arrays and records are not descended into.
    pub fn validate(&self) -> Option<&'static str> {
        match self {
            Value::Date { days } => {
                if *days < MIN_DATE_DAYS || *days > MAX_DATE_DAYS {
                    return Some("DATE outside range [0001-01-01, 9999-12-31]");
                }
            }
            Value::Time { time_us } => {
                if *time_us < 0 || *time_us > MAX_TIME_MICROS {
                    return Some("TIME time_us outside range [0, 86399999999]");
                }
            }
            Value::Datetime { epoch_us } => {
                if *epoch_us < MIN_EPOCH_MICROS || *epoch_us > MAX_EPOCH_MICROS {
                    return Some("DATETIME outside years [0001, 9999]");
                }
            }
            Value::Timestamp { epoch_us } => {
                if *epoch_us < MIN_EPOCH_MICROS || *epoch_us > MAX_EPOCH_MICROS {
                    return Some("TIMESTAMP outside years [0001, 9999]");
                }
            }
            _ => {}
        }
        None
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float64(v) => {
                if v.is_nan() {
                    serializer.serialize_str("NaN")
                } else if v.is_infinite() {
                    serializer.serialize_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
                } else {
                    serializer.serialize_f64(*v)
                }
            }
            Value::Numeric(v) | Value::String(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&BASE64_STANDARD.encode(v)),
            Value::Date { days } => serializer.serialize_str(&format_date(*days)),
            Value::Time { time_us } => serializer.serialize_str(&format_time(*time_us)),
            Value::Datetime { epoch_us } => serializer.serialize_str(&format_datetime(*epoch_us)),
            Value::Timestamp { epoch_us } => {
                serializer.serialize_str(&format_timestamp(*epoch_us))
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Record(row) => {
                let mut map = serializer.serialize_map(Some(row.len()))?;
                for (name, value) in row {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}
