use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};

use super::Value;

/// A stored document: a flat map of top-level field names to values.
///
/// Nested values are reachable through dotted paths (`"address.street"`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize an entity into a document.
    ///
    /// The entity must serialize to a JSON object.
    pub fn from_entity<E: Serialize>(entity: &E) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_value(entity)?;
        match Value::from(json) {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(serde::ser::Error::custom(format!(
                "entity serialized to {} instead of an object",
                other.kind()
            ))),
        }
    }

    /// Deserialize this document back into an entity.
    pub fn to_entity<E: DeserializeOwned>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_value(serde_json::Value::from(Value::Map(self.fields.clone())))
    }

    /// Look up a value by field name or dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            match current {
                Value::Map(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Map(doc.fields)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
