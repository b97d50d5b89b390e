//! Scalar property values.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, ExpError};

/// Kind tag for a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Real,
    /// UTF-8 string.
    Text,
    /// Boolean flag.
    Bool,
}

/// A single property value.
///
/// Equality and hashing treat `Real` by its bit pattern so values can be
/// stored in hash sets; `Int(1)` and `Real(1.0)` are distinct values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 string.
    Text(String),
}

impl Value {
    /// Returns the kind of the value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Rejects reals that are NaN or infinite; every other value is storable.
    pub fn ensure_finite(&self) -> Result<(), ExpError> {
        match self {
            Value::Real(r) if !r.is_finite() => Err(ExpError::UnsupportedValueType(
                ErrorInfo::new("value.non_finite", "real value is not finite")
                    .with_context("value", r.to_string())
                    .with_hint("use a text value such as \"inf\" instead"),
            )),
            _ => Ok(()),
        }
    }

    /// Converts the value into its JSON representation.
    ///
    /// JSON has no non-finite numbers; such reals render as their display string.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Number::from_f64(*r)
                .map_or_else(|| serde_json::Value::String(r.to_string()), serde_json::Value::Number),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Real(r) => r.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r:?}"),
            Value::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = ExpError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(r) = n.as_f64() {
                    let real = Value::Real(r);
                    real.ensure_finite()?;
                    Ok(real)
                } else {
                    Err(unsupported("number", value))
                }
            }
            serde_json::Value::Null => Err(unsupported("null", value)),
            serde_json::Value::Array(_) => Err(unsupported("array", value)),
            serde_json::Value::Object(_) => Err(unsupported("object", value)),
        }
    }
}

fn unsupported(kind: &str, value: &serde_json::Value) -> ExpError {
    ExpError::UnsupportedValueType(
        ErrorInfo::new(
            "value.unsupported_kind",
            format!("{kind} is not an int, real, string or bool"),
        )
        .with_context("value", value.to_string()),
    )
}
