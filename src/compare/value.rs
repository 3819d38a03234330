//! Canonical cell values.
//!
//! Both sides of the comparison are reduced to this representation before
//! anything is compared: integer widths collapse to i64, f32 widens to f64,
//! timestamps become microseconds since epoch. Declared types therefore
//! never influence the outcome, only stored values do.

use std::cmp::Ordering;
use std::fmt;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate};

/// A canonicalized cell value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Date(NaiveDate),
    /// Microseconds since epoch
    Timestamp(i64),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // NaN counts as equal to NaN; a NaN that survives the roundtrip
            // is not a corruption
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(micros) => match DateTime::from_timestamp_micros(*micros) {
                Some(at) => write!(f, "{}", at.naive_utc()),
                None => write!(f, "timestamp({micros}us)"),
            },
        }
    }
}

/// Total order over canonical values, used to sort rows by the key column
pub fn compare(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::Bytes(_) => 4,
            Value::Text(_) => 5,
            Value::Date(_) => 6,
            Value::Timestamp(_) => 7,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Unit of the integer timestamps a query engine returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimestampUnit {
    /// Parse a unit from its command-line spelling
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "s" | "sec" | "secs" | "seconds" => Ok(TimestampUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimestampUnit::Milliseconds),
            "us" | "micros" | "microseconds" => Ok(TimestampUnit::Microseconds),
            "ns" | "nanos" | "nanoseconds" => Ok(TimestampUnit::Nanoseconds),
            other => bail!(
                "Unknown timestamp unit: {}. Valid units: s, ms, us, ns",
                other
            ),
        }
    }

    /// Convert an engine timestamp in this unit to canonical microseconds
    pub fn to_micros(&self, value: i64) -> i64 {
        match self {
            TimestampUnit::Seconds => value * 1_000_000,
            TimestampUnit::Milliseconds => value * 1_000,
            TimestampUnit::Microseconds => value,
            TimestampUnit::Nanoseconds => value / 1_000,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimestampUnit::Seconds => "s",
            TimestampUnit::Milliseconds => "ms",
            TimestampUnit::Microseconds => "us",
            TimestampUnit::Nanoseconds => "ns",
        }
    }
}
