//! Filter tree produced by the translator

use super::operator::Operator;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// Largest integer a double represents exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Operator(Operator),
    Field(String),
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKey::Operator(op) => write!(f, "{}", op.marked()),
            FilterKey::Field(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<FilterValue>),
    Document(FilterDocument),
}

impl FilterValue {
    /// Converts parsed JSON into a filter value without further coercion.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FilterValue::Null,
            serde_json::Value::Bool(b) => FilterValue::Bool(b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(FilterValue::Number)
                .unwrap_or_else(|| FilterValue::String(n.to_string())),
            serde_json::Value::String(s) => FilterValue::String(s),
            serde_json::Value::Array(items) => {
                FilterValue::Array(items.into_iter().map(FilterValue::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut doc = FilterDocument::new();
                for (key, value) in map {
                    doc.insert(FilterKey::Field(key), FilterValue::from_json(value));
                }
                FilterValue::Document(doc)
            }
        }
    }

    /// Integral numbers small enough to be exact, as an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FilterValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER => {
                Some(*n as i64)
            }
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FilterValue::Null | FilterValue::Bool(_) | FilterValue::Number(_) | FilterValue::String(_)
        )
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<FilterDocument> for FilterValue {
    fn from(value: FilterDocument) -> Self {
        FilterValue::Document(value)
    }
}

/// Ordered mapping of filter keys to values. Insertion order is kept so the
/// rendered query follows the order of the query string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterDocument {
    entries: IndexMap<FilterKey, FilterValue>,
}

/// Top-level filter handed to the database query layer
pub type FilterExpression = FilterDocument;

impl FilterDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry; a repeated key keeps its first position and takes the new value.
    pub fn insert(&mut self, key: FilterKey, value: FilterValue) {
        self.entries.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FilterKey, &FilterValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
impl FilterDocument {
    pub fn with(mut self, key: FilterKey, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FilterValue> {
        self.entries.get(&FilterKey::Field(name.to_string()))
    }

    pub fn operator(&self, op: Operator) -> Option<&FilterValue> {
        self.entries.get(&FilterKey::Operator(op))
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterValue::Null => serializer.serialize_unit(),
            FilterValue::Bool(b) => serializer.serialize_bool(*b),
            FilterValue::Number(n) => match self.as_integer() {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            FilterValue::String(s) => serializer.serialize_str(s),
            FilterValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FilterValue::Document(doc) => doc.serialize(serializer),
        }
    }
}

impl Serialize for FilterDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}
