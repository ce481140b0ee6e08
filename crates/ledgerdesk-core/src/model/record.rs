//! Dynamically-typed record: one row keyed by column name

use crate::errors::{ExError, ExErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of an entity table, as seen by callers
///
/// Values are plain JSON values: strings, numbers, booleans, null, or
/// nested structures for JSON-valued columns. Keys are column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from a JSON object
    ///
    /// Any other JSON shape is rejected as `InvalidInput`.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("record_from_value")
                .with_message(format!("expected a JSON object, got {}", type_name(&other)))),
        }
    }

    /// The record's primary key, if present and a string
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every field of `other` over this record
    pub fn merge(&mut self, other: &Record) {
        for (k, v) in other.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_accepts_object() {
        let record = Record::from_value(json!({"id": "p1", "name": "Widget"})).unwrap();
        assert_eq!(record.id(), Some("p1"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = Record::from_value(json!(["p1"])).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert!(err.message().contains("array"));
    }

    #[test]
    fn test_id_requires_string() {
        let record = Record::new().with("id", json!(42));
        assert_eq!(record.id(), None);
    }

    #[test]
    fn test_merge_overwrites_supplied_fields_only() {
        let mut base = Record::new()
            .with("id", json!("t1"))
            .with("value", json!(100))
            .with("status", json!("pending"));
        base.merge(&Record::new().with("status", json!("paid")));

        assert_eq!(base.get("status"), Some(&json!("paid")));
        assert_eq!(base.get("value"), Some(&json!(100)));
    }

    #[test]
    fn test_serde_is_transparent() {
        let record = Record::new().with("id", json!("c1"));
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": "c1"}));
    }
}
