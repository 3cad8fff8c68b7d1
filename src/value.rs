//! Row cell values produced by the column converter.
//!
//! The value model keeps a dedicated [`Value::UBigInt`] slot so that
//! `BIGINT UNSIGNED` cells above `i64::MAX` are never reinterpreted as
//! signed. Narrower unsigned widths fit losslessly in [`Value::BigInt`].

use chrono::{DateTime, Utc};

use crate::error::{Result, TaosError};
use crate::types::TimestampPrecision;

/// A TDengine timestamp: raw ticks since the Unix epoch plus their precision.
///
/// Ticks may be negative for instants before 1970.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    raw: i64,
    precision: TimestampPrecision,
}

impl Timestamp {
    pub fn new(raw: i64, precision: TimestampPrecision) -> Self {
        Self { raw, precision }
    }

    /// Creates a millisecond-precision timestamp.
    pub fn from_millis(millis: i64) -> Self {
        Self::new(millis, TimestampPrecision::Millisecond)
    }

    /// Raw tick count as stored by the server.
    pub fn as_raw_i64(&self) -> i64 {
        self.raw
    }

    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    /// Milliseconds since the epoch, flooring finer precisions.
    pub fn as_millis(&self) -> i64 {
        match self.precision {
            TimestampPrecision::Millisecond => self.raw,
            TimestampPrecision::Microsecond => self.raw.div_euclid(1_000),
            TimestampPrecision::Nanosecond => self.raw.div_euclid(1_000_000),
        }
    }

    /// Converts to a UTC date-time. Returns `None` outside chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let per_second = self.precision.ticks_per_second();
        let secs = self.raw.div_euclid(per_second);
        let sub = self.raw.rem_euclid(per_second);
        let nanos = sub * (1_000_000_000 / per_second);
        DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => match self.precision {
                TimestampPrecision::Millisecond => {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f"))
                }
                TimestampPrecision::Microsecond => {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.6f"))
                }
                TimestampPrecision::Nanosecond => {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.9f"))
                }
            },
            None => write!(f, "{}", self.raw),
        }
    }
}

/// A dynamically-typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value (native null sentinel or null column)
    Null,

    /// BOOL
    Bool(bool),

    /// Every signed width, plus unsigned widths up to 32 bits
    BigInt(i64),

    /// BIGINT UNSIGNED
    UBigInt(u64),

    /// FLOAT and DOUBLE
    Double(f64),

    /// BINARY payload
    Bytes(Vec<u8>),

    /// NCHAR and JSON payload
    Text(String),

    /// TIMESTAMP
    Timestamp(Timestamp),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOL",
            Value::BigInt(_) => "BIGINT",
            Value::UBigInt(_) => "BIGINT UNSIGNED",
            Value::Double(_) => "DOUBLE",
            Value::Bytes(_) => "BINARY",
            Value::Text(_) => "NCHAR",
            Value::Timestamp(_) => "TIMESTAMP",
        }
    }

    /// Extracts a typed value, failing on type mismatch or lossy narrowing.
    pub fn get<T: FromValue>(&self) -> Result<T> {
        T::from_value(self)
    }
}

/// Conversion from a cell [`Value`] into a Rust type.
///
/// Integer conversions are range-checked: a value that does not fit the
/// target type is a conversion error, never a wrapped or truncated number.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch<T>(value: &Value, target: &str) -> Result<T> {
    Err(TaosError::conversion(format!(
        "cannot convert {} to {}",
        value.type_name(),
        target
    )))
}

fn out_of_range<T>(value: impl std::fmt::Display, target: &str) -> Result<T> {
    Err(TaosError::conversion(format!(
        "value {} out of range for {}",
        value, target
    )))
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    let target = stringify!($ty);
                    match value {
                        Value::BigInt(v) => <$ty>::try_from(*v).or_else(|_| out_of_range(v, target)),
                        Value::UBigInt(v) => <$ty>::try_from(*v).or_else(|_| out_of_range(v, target)),
                        Value::Bool(v) => Ok(<$ty>::from(*v)),
                        _ => mismatch(value, target),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Double(v) => Ok(*v),
            _ => mismatch(value, "f64"),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            // FLOAT cells were widened from f32, so narrowing back is exact.
            Value::Double(v) => Ok(*v as f32),
            _ => mismatch(value, "f32"),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::BigInt(v) => Ok(*v != 0),
            Value::UBigInt(v) => Ok(*v != 0),
            _ => mismatch(value, "bool"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|e| TaosError::conversion(format!("BINARY is not valid UTF-8: {}", e))),
            Value::BigInt(v) => Ok(v.to_string()),
            Value::UBigInt(v) => Ok(v.to_string()),
            Value::Double(v) => Ok(v.to_string()),
            Value::Bool(v) => Ok(v.to_string()),
            Value::Timestamp(ts) => Ok(ts.to_string()),
            Value::Null => mismatch(value, "String"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.clone().into_bytes()),
            _ => mismatch(value, "Vec<u8>"),
        }
    }
}

impl FromValue for Timestamp {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            _ => mismatch(value, "Timestamp"),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => ts
                .to_datetime()
                .ok_or_else(|| TaosError::conversion(format!("timestamp {} out of range", ts.raw))),
            _ => mismatch(value, "DateTime<Utc>"),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}
