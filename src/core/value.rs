use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{CrudError, Result};

/// A bound parameter or a column read back from a row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Uuid(_) => "UUID",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Bytes(_) => "BYTES",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Boolean(b) => Some(i64::from(*b)),
            Self::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Zero, nil or empty: the values an unassigned key field carries.
    pub fn is_empty_key(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Integer(i) => *i == 0,
            Self::Uuid(u) => u.is_nil(),
            Self::Text(s) => s.is_empty() || Uuid::parse_str(s).map(|u| u.is_nil()).unwrap_or(false),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                (a - b).abs() < f64::EPSILON
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            // drivers without a native uuid type hand them back as text
            (Self::Uuid(u), Self::Text(s)) | (Self::Text(s), Self::Uuid(u)) => {
                Uuid::parse_str(s).map(|parsed| parsed == *u).unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Converts a model field into a bindable [`Value`].
pub trait IntoValue {
    fn to_value(&self) -> Value;
}

/// Reads a model field back out of a [`Value`] returned by the driver.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T> {
    Err(CrudError::Conversion(format!(
        "expected {}, got {}",
        expected,
        value.type_name()
    )))
}

macro_rules! impl_integer_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                /// Values beyond `i64` are bound as their decimal text.
                fn to_value(&self) -> Value {
                    i64::try_from(*self)
                        .map(Value::Integer)
                        .unwrap_or_else(|_| Value::Text(self.to_string()))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self> {
                    if let Value::Text(text) = &value {
                        if let Ok(parsed) = text.trim().parse::<$ty>() {
                            return Ok(parsed);
                        }
                    }
                    let Some(raw) = value.as_i64() else {
                        return mismatch(stringify!($ty), &value);
                    };
                    <$ty>::try_from(raw).map_err(|_| {
                        CrudError::Conversion(format!(
                            "{} is out of range for {}",
                            raw,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

impl_integer_value!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl IntoValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        match value.as_f64() {
            Some(f) => Ok(f as f32),
            None => mismatch("f32", &value),
        }
    }
}

impl IntoValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value.as_f64() {
            Some(f) => Ok(f),
            None => mismatch("f64", &value),
        }
    }
}

impl IntoValue for bool {
    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            other => mismatch("bool", &other),
        }
    }
}

impl IntoValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl IntoValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Uuid(u) => Ok(u.to_string()),
            Value::Null | Value::Bytes(_) => mismatch("text", &value),
            other => Ok(other.to_string()),
        }
    }
}

impl IntoValue for char {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self> {
        let text = String::from_value(value)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(CrudError::Conversion(format!(
                "expected a single character, got '{}'",
                text
            ))),
        }
    }
}

impl IntoValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(ref s) => Uuid::parse_str(s)
                .map_err(|err| CrudError::Conversion(format!("invalid uuid '{}': {}", s, err))),
            Value::Bytes(ref bytes) => Uuid::from_slice(bytes)
                .map_err(|err| CrudError::Conversion(format!("invalid uuid bytes: {}", err))),
            other => mismatch("uuid", &other),
        }
    }
}

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

impl IntoValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            Value::Text(ref s) => TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .ok_or_else(|| CrudError::Conversion(format!("invalid timestamp '{}'", s))),
            other => mismatch("timestamp", &other),
        }
    }
}

impl IntoValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self> {
        NaiveDateTime::from_value(value).map(|naive| naive.and_utc())
    }
}

impl IntoValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Text(self.format("%Y-%m-%d").to_string())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts.date()),
            Value::Text(ref s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|err| CrudError::Conversion(format!("invalid date '{}': {}", s, err))),
            other => mismatch("date", &other),
        }
    }
}

impl IntoValue for NaiveTime {
    fn to_value(&self) -> Value {
        Value::Text(self.format("%H:%M:%S%.f").to_string())
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts.time()),
            Value::Text(ref s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map_err(|err| CrudError::Conversion(format!("invalid time '{}': {}", s, err))),
            other => mismatch("time", &other),
        }
    }
}

impl IntoValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Text(s) => Ok(s.into_bytes()),
            other => mismatch("bytes", &other),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl IntoValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: IntoValue + ?Sized> IntoValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_eq!(Value::Integer(3), Value::Float(3.0));
        assert_ne!(Value::Integer(1), Value::Integer(2));

        let id = Uuid::new_v4();
        assert_eq!(Value::Uuid(id), Value::Text(id.to_string()));
    }

    #[test]
    fn test_empty_key_sentinels() {
        assert!(Value::Null.is_empty_key());
        assert!(Value::Integer(0).is_empty_key());
        assert!(Value::Uuid(Uuid::nil()).is_empty_key());
        assert!(!Value::Integer(7).is_empty_key());
        assert!(!Value::Uuid(Uuid::new_v4()).is_empty_key());
    }

    #[test]
    fn test_integer_conversion_range() {
        assert_eq!(i16::from_value(Value::Integer(300)).unwrap(), 300);
        assert!(u8::from_value(Value::Integer(300)).is_err());
        assert!(i32::from_value(Value::Text("abc".into())).is_err());
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_wide_unsigned_values_do_not_wrap() {
        assert_eq!(u64::MAX.to_value(), Value::Text("18446744073709551615".into()));
        assert_eq!(u64::from_value(u64::MAX.to_value()).unwrap(), u64::MAX);
        assert_eq!((i64::MAX as u64).to_value(), Value::Integer(i64::MAX));
        assert_eq!(usize::MAX.to_value().as_i64(), None);
    }

    #[test]
    fn test_timestamp_from_text() {
        let ts = NaiveDateTime::from_value(Value::Text("2024-03-01 10:20:30".into())).unwrap();
        assert_eq!(ts.to_string(), "2024-03-01 10:20:30");
    }
}
