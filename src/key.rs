//! Primary key values.
//!
//! Collections index records by exact key (`Int(5)` and `Str("5")` are two
//! different entries), while association lookups compare loosely so that a
//! key assigned locally as a string still matches the number a backend sent.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Int(i64),
    Str(String),
}

impl PrimaryKey {
    /// Read a key out of an attribute value. `Null`, empty strings and
    /// non-scalar values yield `None`.
    pub fn from_value(value: &Value) -> Option<PrimaryKey> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(PrimaryKey::Int(i))
                } else {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| PrimaryKey::Int(f as i64))
                }
            }
            Value::String(s) if !s.is_empty() => Some(PrimaryKey::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PrimaryKey::Int(i) => Value::from(*i),
            PrimaryKey::Str(s) => Value::String(s.clone()),
        }
    }

    /// Coercive comparison: `Int(5)` equals `Str("5")`.
    pub fn loose_eq(&self, other: &PrimaryKey) -> bool {
        match (self, other) {
            (PrimaryKey::Int(a), PrimaryKey::Int(b)) => a == b,
            (PrimaryKey::Str(a), PrimaryKey::Str(b)) => a == b,
            (PrimaryKey::Int(i), PrimaryKey::Str(s)) | (PrimaryKey::Str(s), PrimaryKey::Int(i)) => {
                s.trim().parse::<i64>().map(|parsed| parsed == *i).unwrap_or(false)
            }
        }
    }

    /// Coercive comparison against a raw attribute value. `Null` never matches.
    pub fn loose_eq_value(&self, value: &Value) -> bool {
        PrimaryKey::from_value(value)
            .map(|other| self.loose_eq(&other))
            .unwrap_or(false)
    }
}

/// Loose comparison of two attribute values: keys compare coercively, two
/// `Null`s are equal, anything else falls back to structural equality.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (PrimaryKey::from_value(a), PrimaryKey::from_value(b)) {
        (Some(left), Some(right)) => left.loose_eq(&right),
        _ => a == b,
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int(i) => write!(f, "{}", i),
            PrimaryKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        PrimaryKey::Int(value)
    }
}

impl From<i32> for PrimaryKey {
    fn from(value: i32) -> Self {
        PrimaryKey::Int(value.into())
    }
}

impl From<u32> for PrimaryKey {
    fn from(value: u32) -> Self {
        PrimaryKey::Int(value.into())
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        PrimaryKey::Str(value.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        PrimaryKey::Str(value)
    }
}

impl From<&PrimaryKey> for PrimaryKey {
    fn from(value: &PrimaryKey) -> Self {
        value.clone()
    }
}
