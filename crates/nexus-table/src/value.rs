//! Cell values and column types.
//!
//! This module defines the `Value` type stored in table cells and the
//! `DataType` a column declares. Writing a value of a different but
//! convertible type goes through [`Value::cast`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::Bytes;
use nexus_common::error::TableError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean type.
    Boolean,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    BigInt,
    /// 64-bit floating point.
    Double,
    /// Unlimited text.
    Text,
    /// Binary data.
    Blob,
    /// Timestamp (microseconds since epoch).
    Timestamp,
}

impl DataType {
    /// Returns true if this type is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::SmallInt | DataType::Int | DataType::BigInt)
    }

    /// Returns true if columns of this type may auto-increment.
    pub fn can_auto_increment(&self) -> bool {
        self.is_integer()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "BOOLEAN",
            DataType::SmallInt => "SMALLINT",
            DataType::Int => "INT",
            DataType::BigInt => "BIGINT",
            DataType::Double => "DOUBLE",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
            DataType::Timestamp => "TIMESTAMP",
        };
        write!(f, "{}", name)
    }
}

/// A value that cannot be converted to the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot cast {value} to {target}")]
pub struct CastError {
    /// Description of the value, as given by [`Value::describe`].
    pub value: String,
    /// The requested type.
    pub target: DataType,
}

impl CastError {
    /// Reports the failed conversion as a type mismatch on `column`.
    pub fn for_column(self, column: &str) -> TableError {
        TableError::TypeMismatch {
            column: column.to_string(),
            expected: self.target.to_string(),
            actual: self.value,
        }
    }
}

/// A cell value.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 16-bit signed integer.
    SmallInt(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 64-bit floating point.
    Double(f64),
    /// String value.
    String(String),
    /// Binary data.
    Bytes(Bytes),
    /// Timestamp (microseconds since epoch).
    Timestamp(i64),
}

impl Value {
    /// Creates a NULL value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Creates an integer value.
    pub fn int(v: i32) -> Self {
        Value::Int(v)
    }

    /// Creates a bigint value.
    pub fn bigint(v: i64) -> Self {
        Value::BigInt(v)
    }

    /// Creates a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type this value naturally belongs to, or `None` for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::SmallInt(_) => Some(DataType::SmallInt),
            Value::Int(_) => Some(DataType::Int),
            Value::BigInt(_) => Some(DataType::BigInt),
            Value::Double(_) => Some(DataType::Double),
            Value::String(_) => Some(DataType::Text),
            Value::Bytes(_) => Some(DataType::Blob),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    /// Converts this value to an i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Null | Value::Bytes(_) => None,
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::SmallInt(i) => Some(i64::from(*i)),
            Value::Int(i) => Some(i64::from(*i)),
            Value::BigInt(i) | Value::Timestamp(i) => Some(*i),
            Value::Double(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Value::String(s) => s.trim().parse().ok(),
        }
    }

    /// Converts this value to an f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Null | Value::Bytes(_) | Value::Timestamp(_) => None,
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::SmallInt(i) => Some(f64::from(*i)),
            Value::Int(i) => Some(f64::from(*i)),
            Value::BigInt(i) => Some(*i as f64),
            Value::Double(f) => Some(*f),
            Value::String(s) => s.trim().parse().ok(),
        }
    }

    /// Converts this value to a boolean.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => {
                self.to_i64().map(|i| i != 0)
            }
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Converts this value to a string.
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            Value::Null | Value::Bytes(_) => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Casts this value to the specified type.
    ///
    /// NULL casts to NULL. Integer narrowing is range checked.
    pub fn cast(&self, target: DataType) -> Result<Value, CastError> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        if self.data_type() == Some(target) {
            return Ok(self.clone());
        }

        match target {
            DataType::Boolean => self
                .to_bool()
                .map(Value::Boolean)
                .ok_or_else(|| self.cast_error(target)),
            DataType::SmallInt => self
                .to_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(Value::SmallInt)
                .ok_or_else(|| self.cast_error(target)),
            DataType::Int => self
                .to_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Int)
                .ok_or_else(|| self.cast_error(target)),
            DataType::BigInt => self
                .to_i64()
                .map(Value::BigInt)
                .ok_or_else(|| self.cast_error(target)),
            DataType::Double => self
                .to_f64()
                .map(Value::Double)
                .ok_or_else(|| self.cast_error(target)),
            DataType::Text => self
                .to_string_value()
                .map(Value::String)
                .ok_or_else(|| self.cast_error(target)),
            DataType::Blob => match self {
                Value::String(s) => Ok(Value::Bytes(Bytes::from(s.clone().into_bytes()))),
                _ => Err(self.cast_error(target)),
            },
            DataType::Timestamp => match self {
                Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) | Value::String(_) => self
                    .to_i64()
                    .map(Value::Timestamp)
                    .ok_or_else(|| self.cast_error(target)),
                _ => Err(self.cast_error(target)),
            },
        }
    }

    fn cast_error(&self, target: DataType) -> CastError {
        CastError {
            value: self.describe(),
            target,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self.data_type() {
            Some(ty) => format!("<{}> of type {}", self, ty),
            None => "NULL".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::SmallInt(a), Value::SmallInt(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits() || a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            // Cross-type integer comparisons
            (a, b) if is_integer_value(a) && is_integer_value(b) => a.to_i64() == b.to_i64(),
            _ => false,
        }
    }
}

impl Eq for Value {}

fn is_integer_value(v: &Value) -> bool {
    matches!(v, Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_))
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // NULL sorts before every non-NULL value
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,

            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (a, b) if is_integer_value(a) && is_integer_value(b) => a.to_i64().cmp(&b.to_i64()),

            // Mixed numeric comparisons via f64
            (a, b) => match (a.to_f64(), b.to_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Boolean(b) => b.hash(state),
            // Integers hash alike so that equal cross-type values collide
            Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_) => {
                1u8.hash(state);
                self.to_i64().hash(state);
            }
            Value::Double(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Timestamp(t) => {
                2u8.hash(state);
                t.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::SmallInt(i) => write!(f, "{}", i),
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(i) => write!(f, "{}", i),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => {
                write!(f, "0x")?;
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Timestamp(t) => write!(f, "{}", t),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
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

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null() {
        let v = Value::null();
        assert!(v.is_null());
        assert_eq!(v.data_type(), None);
        assert_eq!(v.cast(DataType::Int), Ok(Value::Null));
    }

    #[test]
    fn test_value_cast_numeric() {
        assert_eq!(Value::int(42).cast(DataType::BigInt), Ok(Value::BigInt(42)));
        assert_eq!(Value::bigint(7).cast(DataType::SmallInt), Ok(Value::SmallInt(7)));
        assert!(Value::bigint(i64::from(i32::MAX) + 1)
            .cast(DataType::Int)
            .is_err());
        assert_eq!(Value::Double(3.0).cast(DataType::Int), Ok(Value::Int(3)));
        assert!(Value::Double(3.5).cast(DataType::Int).is_err());
    }

    #[test]
    fn test_cast_error_becomes_type_mismatch() {
        let err = Value::bigint(1 << 40).cast(DataType::Int).unwrap_err();
        assert_eq!(err.target, DataType::Int);
        assert_eq!(
            err.clone().for_column("id"),
            TableError::TypeMismatch {
                column: "id".to_string(),
                expected: "INT".to_string(),
                actual: format!("<{}> of type BIGINT", 1_i64 << 40),
            }
        );
        assert!(err.to_string().starts_with("cannot cast <"));
    }

    #[test]
    fn test_value_cast_text() {
        assert_eq!(
            Value::int(42).cast(DataType::Text),
            Ok(Value::string("42"))
        );
        assert_eq!(Value::string(" 17 ").cast(DataType::Int), Ok(Value::Int(17)));
        assert!(Value::string("abc").cast(DataType::Int).is_err());
        assert_eq!(
            Value::string("TRUE").cast(DataType::Boolean),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn test_value_cast_blob() {
        assert_eq!(
            Value::string("ab").cast(DataType::Blob),
            Ok(Value::Bytes(Bytes::from_static(b"ab")))
        );
        assert!(Value::int(1).cast(DataType::Blob).is_err());
        assert_eq!(Value::Bytes(Bytes::from_static(&[0xde, 0xad])).to_string(), "0xdead");
    }

    #[test]
    fn test_value_cross_type_equality() {
        assert_eq!(Value::int(10), Value::bigint(10));
        assert_ne!(Value::int(10), Value::string("10"));
        assert_ne!(Value::Null, Value::int(0));
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::Null < Value::int(0));
        assert!(Value::int(10) < Value::bigint(20));
        assert!(Value::int(10) < Value::Double(10.5));
    }

    #[test]
    fn test_value_hash_matches_eq() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Value::int(1));
        assert!(set.contains(&Value::bigint(1)));
        assert!(!set.contains(&Value::bigint(2)));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::string("a"));
    }

    #[test]
    fn test_auto_increment_types() {
        assert!(DataType::Int.can_auto_increment());
        assert!(!DataType::Double.can_auto_increment());
        assert!(!DataType::Text.can_auto_increment());
    }
}
