use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// One row of statement output: an ordered mapping from field name to value.
///
/// Field order matches the declared output fields of the statement; the key
/// list is shared across every record of one result, so a record is one
/// `Arc` bump plus its values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    keys: Arc<Vec<String>>,
    values: Vec<JsonValue>,
}

impl Record {
    /// Build a record from a shared key list and positional values.
    ///
    /// The connection layer constructs these; `keys` and `values` must have
    /// the same length.
    pub fn new(keys: Arc<Vec<String>>, values: Vec<JsonValue>) -> Self {
        debug_assert_eq!(keys.len(), values.len(), "record key/value arity mismatch");
        Self { keys, values }
    }

    /// Field names, in declared order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Values, in declared field order.
    pub fn values(&self) -> &[JsonValue] {
        &self.values
    }

    /// Look up a value by field name.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        let idx = self.keys.iter().position(|k| k == key)?;
        self.values.get(idx)
    }

    /// Value at a positional index.
    pub fn get_index(&self, index: usize) -> Option<&JsonValue> {
        self.values.get(index)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the record carries no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(field name, value)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Convert to a `HashMap` (for convenience; field order is lost).
    pub fn as_map(&self) -> HashMap<String, JsonValue> {
        let mut map = HashMap::with_capacity(self.keys.len());
        for (key, value) in self.iter() {
            map.insert(key.to_string(), value.clone());
        }
        map
    }
}
