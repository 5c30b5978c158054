//! Flat destination-key → value map produced by parsing.
//!
//! However deeply commands are nested, every level stores its values in the
//! same map: a command's own arguments under their ids, and the selected
//! child command under the level's destination key.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Parsed command-line arguments, keyed by destination.
///
/// Values keep the order in which they were collected, which is the order
/// of declaration from the root down to the selected leaf.
///
/// # Example
///
/// ```rust
/// use quickcli_dispatch::ParsedArgs;
/// use serde_json::json;
///
/// let mut args = ParsedArgs::new();
/// args.insert("action", json!("remote"));
/// args.insert("verbosity", json!(2));
///
/// assert_eq!(args.get_str("action"), Some("remote"));
/// assert_eq!(args.get_i64("verbosity"), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    values: IndexMap<String, Value>,
}

impl ParsedArgs {
    /// Creates an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one for this key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the value under `key` if it is a boolean flag.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns the value under `key` if it is an integer (e.g. a counted flag).
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Returns all string values under `key`.
    ///
    /// A single string is returned as a one-element vector.
    pub fn get_strings(&self, key: &str) -> Option<Vec<&str>> {
        match self.get(key)? {
            Value::String(s) => Some(vec![s.as_str()]),
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }

    /// Returns the child selection stored under a destination key.
    ///
    /// An absent key and an explicit `null` both count as "nothing selected".
    /// Non-string values are matched by their JSON text.
    pub fn selection(&self, dest: &str) -> Option<String> {
        match self.get(dest)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Returns true if `key` is present (even with a `null` value).
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Iterates over `(key, value)` pairs in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts the map into a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for ParsedArgs
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = ParsedArgs::new();
        for (key, value) in iter {
            args.insert(key, value);
        }
        args
    }
}

impl fmt::Display for ParsedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
