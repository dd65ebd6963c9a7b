//! Bound values and type coercion
//!
//! Every descriptor carries an explicit [`ValueType`]. Raw tokens are turned
//! into [`Value`]s by [`coerce`] according to that tag.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literals accepted as `true` for boolean values (compared case-insensitively)
const TRUE_LITERALS: [&str; 4] = ["true", "1", "yes", "y"];

/// Declared type of an option or argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    StrList,
}

impl ValueType {
    /// Infer a type from a default value
    pub fn infer(default: &Value) -> Self {
        match default {
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::List(_) => Self::StrList,
            Value::Null | Value::Str(_) => Self::Str,
        }
    }

    /// Type of a single element when several values are collected
    pub const fn element(self) -> Self {
        match self {
            Self::StrList => Self::Str,
            other => other,
        }
    }

    /// Whether a value fits this type (`Null` always fits)
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Int, Value::Int(_)) => true,
            (Self::Float, Value::Float(_) | Value::Int(_)) => true,
            (Self::Str, Value::Str(_)) => true,
            (_, Value::List(items)) => items.iter().all(|item| self.element().accepts(item)),
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::StrList => "string list",
        };
        f.write_str(name)
    }
}

/// A parsed, coerced value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Interpret a token as a boolean
pub fn parse_bool(raw: &str) -> bool {
    TRUE_LITERALS
        .iter()
        .any(|literal| raw.eq_ignore_ascii_case(literal))
}

/// Coerce one raw token to the given type
///
/// `name` identifies the option or argument in error messages.
pub fn coerce(raw: &str, ty: ValueType, name: &str) -> Result<Value> {
    match ty {
        ValueType::Bool => Ok(Value::Bool(parse_bool(raw))),
        ValueType::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CliError::value_parsing(name, raw, ty)),
        ValueType::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CliError::value_parsing(name, raw, ty)),
        ValueType::Str => Ok(Value::Str(raw.to_string())),
        ValueType::StrList => Ok(Value::List(vec![Value::Str(raw.to_string())])),
    }
}

/// Coerce a run of tokens into a list, element by element
pub fn coerce_many(raws: &[String], ty: ValueType, name: &str) -> Result<Value> {
    raws.iter()
        .map(|raw| coerce(raw, ty.element(), name))
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_literals() {
        for raw in ["true", "TRUE", "1", "yes", "Y", "y"] {
            assert!(parse_bool(raw), "{raw} should be true");
        }
        for raw in ["no", "NO", "0", "false", "", "nope"] {
            assert!(!parse_bool(raw), "{raw} should be false");
        }
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce("3", ValueType::Int, "steps").unwrap(), Value::Int(3));
        assert_eq!(coerce("-2.5", ValueType::Float, "ratio").unwrap(), Value::Float(-2.5));

        let err = coerce("three", ValueType::Int, "steps").unwrap_err();
        assert!(matches!(
            err,
            CliError::ValueParsing { ref name, ref value, expected: ValueType::Int }
                if name == "steps" && value == "three"
        ));
    }

    #[test]
    fn test_string_passes_through() {
        assert_eq!(
            coerce("--weird", ValueType::Str, "x").unwrap(),
            Value::from("--weird")
        );
    }

    #[test]
    fn test_coerce_many_by_element_type() {
        let raws = vec!["1".to_string(), "2".to_string()];
        assert_eq!(
            coerce_many(&raws, ValueType::Int, "n").unwrap(),
            Value::from(vec![1, 2])
        );
        assert_eq!(
            coerce_many(&raws, ValueType::StrList, "n").unwrap(),
            Value::from(vec!["1", "2"])
        );
    }

    #[test]
    fn test_infer_from_default() {
        assert_eq!(ValueType::infer(&Value::Bool(false)), ValueType::Bool);
        assert_eq!(ValueType::infer(&Value::Int(1)), ValueType::Int);
        assert_eq!(ValueType::infer(&Value::from(vec!["a"])), ValueType::StrList);
        assert_eq!(ValueType::infer(&Value::Null), ValueType::Str);
    }
}
