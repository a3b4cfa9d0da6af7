//! Common types used throughout the cursor layer
//!
//! Decoded column values, rows and the argument collections callers hand to
//! `execute`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Values
// ============================================================================

/// A single decoded column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// `bool`
    Bool(bool),
    /// Any integer type
    Int(i64),
    /// `float4` / `float8`
    Float(f64),
    /// Arbitrary precision decimal kept in its text form
    Numeric(String),
    /// Character types
    Text(String),
    /// `bytea` / `varbyte`
    Bytes(Vec<u8>),
    /// `date`
    Date(NaiveDate),
    /// `timestamp` without time zone
    Timestamp(NaiveDateTime),
    /// `timestamptz`, normalized to UTC
    TimestampTz(DateTime<Utc>),
}

impl Value {
    /// Check if the value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value, if it has one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Numeric(s) | Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// String view of textual values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Numeric(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Numeric(s) | Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => {
                f.write_str("\\x")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::TimestampTz(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f%:z")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// Rows
// ============================================================================

/// One result row: column values by position
pub type Row = Vec<Value>;

// ============================================================================
// Parameters
// ============================================================================

/// Arguments bound to a statement's placeholders
///
/// `qmark`, `numeric` and `format` statements take a positional sequence,
/// `named` statements a mapping, `pyformat` either depending on the
/// placeholders used.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    /// No arguments
    #[default]
    None,
    /// Arguments for `format`, `qmark` and `numeric` placeholders
    Positional(Vec<Value>),
    /// Arguments for `named` and `pyformat` placeholders
    Named(BTreeMap<String, Value>),
}

impl Params {
    /// Build positional params from anything convertible to values
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Build named params from `(name, value)` pairs
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<BTreeMap<String, Value>> for Params {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Params::Named(map)
    }
}
