//! Read-only typed view over bound values

use crate::core::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Values bound for one invocation, keyed by option key or argument name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Accessor {
    values: BTreeMap<String, Value>,
}

impl Accessor {
    pub const fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether `name` is bound to something other than `Null`
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_null())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Boolean switch state; absent or non-boolean reads as `false`
    pub fn flag(&self, name: &str) -> bool {
        self.get_bool(name).unwrap_or(false)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    /// String elements of a list value; non-string elements are skipped
    pub fn get_strings(&self, name: &str) -> Vec<&str> {
        self.get_list(name)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Accessor {
        let mut values = BTreeMap::new();
        values.insert("verbose".to_string(), Value::Bool(true));
        values.insert("steps".to_string(), Value::Int(3));
        values.insert("target".to_string(), Value::from("app"));
        values.insert("files".to_string(), Value::from(vec!["a", "b"]));
        values.insert("output".to_string(), Value::Null);
        Accessor::new(values)
    }

    #[test]
    fn test_typed_reads() {
        let args = sample();
        assert!(args.flag("verbose"));
        assert!(!args.flag("missing"));
        assert_eq!(args.get_int("steps"), Some(3));
        assert_eq!(args.get_float("steps"), Some(3.0));
        assert_eq!(args.get_str("target"), Some("app"));
        assert_eq!(args.get_strings("files"), ["a", "b"]);
        assert_eq!(args.get_str("steps"), None);
    }

    #[test]
    fn test_null_is_bound_but_not_set() {
        let args = sample();
        assert!(args.contains("output"));
        assert!(!args.is_set("output"));
        assert_eq!(args.len(), 5);
    }
}
