use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

const INVALID_VALUE: &str = "Value must be scalar or an array of scalars.";

/// Ordered key/value data attached to every message.
///
/// Values are scalars, null, or arrays (nested to any depth) of those.
/// Maps are objects and are rejected when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct MetaData(Map<String, Value>);

impl MetaData {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds metadata from a map, validating every value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if any value is invalid.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, DomainError> {
        if map.values().all(is_valid_value) {
            Ok(Self(map))
        } else {
            Err(DomainError::Validation(INVALID_VALUE.to_owned()))
        }
    }

    /// Sets a value, replacing any existing one under `key`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `value` is not a scalar, null, or
    /// an array of valid values.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), DomainError> {
        let value = value.into();
        if !is_valid_value(&value) {
            return Err(DomainError::Validation(INVALID_VALUE.to_owned()));
        }
        self.0.insert(key.into(), value);
        Ok(())
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Copies every entry of `other` over this metadata.
    ///
    /// Keys absent from `other` are left alone; nested arrays are replaced,
    /// not merged.
    pub fn merge(&mut self, other: &MetaData) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the plain map form.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Map<String, Value>> for MetaData {
    type Error = DomainError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_map(map)
    }
}

impl From<MetaData> for Map<String, Value> {
    fn from(meta: MetaData) -> Self {
        meta.0
    }
}

fn is_valid_value(value: &Value) -> bool {
    match value {
        Value::Object(_) => false,
        Value::Array(items) => items.iter().all(is_valid_value),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_accepts_scalars_null_and_nested_arrays() {
        let mut meta = MetaData::new();
        meta.set("user", "jsmith").unwrap();
        meta.set("attempt", 3).unwrap();
        meta.set("trusted", true).unwrap();
        meta.set("nothing", Value::Null).unwrap();
        meta.set("tags", json!(["a", ["b", ["c", 1, null]]])).unwrap();

        assert_eq!(meta.len(), 5);
        assert_eq!(meta.get("attempt"), Some(&json!(3)));
        assert!(meta.has("nothing"));
    }

    #[test]
    fn test_set_rejects_objects_at_any_depth() {
        let mut meta = MetaData::new();

        let top = meta.set("user", json!({"name": "jsmith"})).unwrap_err();
        let nested = meta.set("users", json!([["ok"], {"name": "jsmith"}])).unwrap_err();

        for err in [top, nested] {
            match err {
                DomainError::Validation(message) => assert_eq!(message, INVALID_VALUE),
                other => panic!("expected Validation, got {other:?}"),
            }
        }
        assert!(meta.is_empty());
    }

    #[test]
    fn test_merge_overwrites_present_keys_and_keeps_absent_ones() {
        let mut base = MetaData::new();
        base.set("a", 1).unwrap();
        base.set("b", json!([1, 2])).unwrap();
        let mut other = MetaData::new();
        other.set("b", json!([3])).unwrap();
        other.set("c", "new").unwrap();

        base.merge(&other);

        assert_eq!(base.get("a"), Some(&json!(1)));
        assert_eq!(base.get("b"), Some(&json!([3])));
        assert_eq!(base.get("c"), Some(&json!("new")));
        assert_eq!(base.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_keeps_insertion_order() {
        let mut meta = MetaData::new();
        meta.set("first", 1).unwrap();
        meta.set("second", 2).unwrap();
        meta.set("third", 3).unwrap();

        assert_eq!(meta.remove("first"), Some(json!(1)));
        assert_eq!(meta.remove("missing"), None);
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["second", "third"]);
    }

    #[test]
    fn test_deserialize_validates_values() {
        let ok: MetaData = serde_json::from_str(r#"{"trace":"abc","hops":[1,2]}"#).unwrap();
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"trace":"abc","hops":[1,2]}"#);

        let bad = serde_json::from_str::<MetaData>(r#"{"nested":{"x":1}}"#);
        assert!(bad.is_err());
    }
}
