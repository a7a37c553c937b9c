//! Ordered map type for JSON objects.
//!
//! [`Map`] wraps an [`IndexMap`] so that object keys are written back out in
//! the order they were parsed or inserted. Lookup and equality do not depend
//! on order: two objects with the same keys and values compare equal.
//!
//! ## Examples
//!
//! ```rust
//! use json_twine::{Map, Value};
//!
//! let mut map = Map::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An insertion-ordered map of string keys to JSON values.
///
/// ```rust
/// use json_twine::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("first".to_string(), Value::from(1));
/// map.insert("second".to_string(), Value::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map(IndexMap<String, Value>);

impl Map {
    /// Creates an empty `Map`.
    #[must_use]
    pub fn new() -> Self {
        Map(IndexMap::new())
    }

    /// Creates an empty `Map` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Map(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the value is replaced in place
    /// (keeping its position) and the old value is returned.
    ///
    /// ```rust
    /// use json_twine::{Map, Value};
    ///
    /// let mut map = Map::new();
    /// assert!(map.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the value for `key`, inserting `Value::Null` first if the key
    /// is absent.
    ///
    /// ```rust
    /// use json_twine::{Map, Value};
    ///
    /// let mut map = Map::new();
    /// assert!(map.entry("fresh").is_null());
    /// assert!(map.contains_key("fresh"));
    /// ```
    pub fn entry(&mut self, key: &str) -> &mut Value {
        self.0.entry(key.to_string()).or_insert(Value::Null)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns the number of elements in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns a mutable iterator over the key-value pairs, in insertion order.
    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, Value> {
        self.0.iter_mut()
    }
}

impl From<HashMap<String, Value>> for Map {
    fn from(map: HashMap<String, Value>) -> Self {
        Map(map.into_iter().collect())
    }
}

impl From<Map> for HashMap<String, Value> {
    fn from(map: Map) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Map(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_order() {
        let a: Map = vec![
            ("x".to_string(), Value::from(1)),
            ("y".to_string(), Value::from(2)),
        ]
        .into_iter()
        .collect();
        let b: Map = vec![
            ("y".to_string(), Value::from(2)),
            ("x".to_string(), Value::from(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut map: Map = ["a", "b", "c"]
            .iter()
            .map(|k| (k.to_string(), Value::Null))
            .collect();
        map.remove("b");
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_entry_does_not_overwrite() {
        let mut map = Map::new();
        map.insert("k".to_string(), Value::from(7));
        assert_eq!(map.entry("k").as_i64(), Some(7));
        assert_eq!(map.len(), 1);
    }
}
