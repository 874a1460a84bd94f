use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dynamically typed attribute or argument value exchanged with the
/// command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// String value.
    Str(String),
    /// No value, returned by methods without a result.
    Unit,
}

impl Value {
    /// Interpret the value as an integer.
    pub fn as_int(&self, name: &str) -> Result<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(invalid(name, format!("expected integer, got {other}"))),
        }
    }

    /// Interpret the value as an integer in the i32 range.
    pub fn as_i32(&self, name: &str) -> Result<i32> {
        let v = self.as_int(name)?;
        i32::try_from(v).map_err(|_| invalid(name, format!("{v} out of range")))
    }

    /// Interpret the value as a non-negative integer in the u32 range.
    pub fn as_u32(&self, name: &str) -> Result<u32> {
        let v = self.as_int(name)?;
        u32::try_from(v).map_err(|_| invalid(name, format!("{v} out of range")))
    }

    /// Interpret the value as a boolean. Integers are truthy when non-zero.
    pub fn as_bool(&self, name: &str) -> Result<bool> {
        match self {
            Self::Bool(v) => Ok(*v),
            Self::Int(v) => Ok(*v != 0),
            other => Err(invalid(name, format!("expected boolean, got {other}"))),
        }
    }

    /// Interpret the value as a string.
    pub fn as_str(&self, name: &str) -> Result<&str> {
        match self {
            Self::Str(v) => Ok(v),
            other => Err(invalid(name, format!("expected string, got {other}"))),
        }
    }
}

/// Build an invalid-value error.
fn invalid(name: &str, reason: String) -> Error {
    Error::InvalidValue {
        name: name.into(),
        reason,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Unit => write!(f, "()"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() -> Result<()> {
        assert_eq!(Value::from(7).as_u32("w")?, 7);
        assert!(Value::from(-1).as_u32("w").is_err());
        assert!(Value::from("x").as_int("w").is_err());
        assert!(Value::Int(3).as_bool("b")?);
        assert_eq!(Value::from("hi").as_str("s")?, "hi");
        Ok(())
    }

    #[test]
    fn json_shape() -> Result<()> {
        let v: Vec<Value> = serde_json::from_str(r#"[1, true, "a", null]"#)?;
        assert_eq!(
            v,
            vec![Value::Int(1), Value::Bool(true), Value::from("a"), Value::Unit]
        );
        Ok(())
    }
}
