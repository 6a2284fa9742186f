//! Property bags handed to `set`, `merge` and association setters.

use serde_json::{Map, Value};

use crate::key::PrimaryKey;
use crate::record::Record;

/// One value in a [`Properties`] bag.
#[derive(Debug, Clone)]
pub enum Property {
    Value(Value),
    Record(Record),
    Properties(Properties),
    List(Vec<Property>),
}

/// Something an association can point at: a live record or a bag to
/// materialize in the foreign collection.
#[derive(Debug, Clone)]
pub enum Related {
    Record(Record),
    Properties(Properties),
}

/// Insertion-ordered bag of named properties.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: Vec<(String, Property)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Property>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a property, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Property>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let index = self.entries.iter().position(|(existing, _)| existing == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Primary key carried by the bag under `field`, if any.
    pub fn key_value(&self, field: &str) -> Option<PrimaryKey> {
        match self.get(field)? {
            Property::Value(value) => PrimaryKey::from_value(value),
            Property::Record(record) => Some(record.key()),
            _ => None,
        }
    }

    /// Convert a JSON object. Any other JSON value yields `None`.
    pub fn from_json(value: Value) -> Option<Properties> {
        match value {
            Value::Object(map) => Some(Properties::from(map)),
            _ => None,
        }
    }

    /// Plain JSON view of the bag. Records collapse to their current key.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, value)| (name.clone(), value.clone().into_value()))
                .collect(),
        )
    }
}

impl IntoIterator for Properties {
    type Item = (String, Property);
    type IntoIter = std::vec::IntoIter<(String, Property)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<Map<String, Value>> for Properties {
    fn from(map: Map<String, Value>) -> Self {
        Properties {
            entries: map
                .into_iter()
                .map(|(name, value)| (name, Property::Value(value)))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Property>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (name, value) in iter {
            properties.insert(name, value);
        }
        properties
    }
}

impl Property {
    /// Collapse into a plain attribute value.
    pub fn into_value(self) -> Value {
        match self {
            Property::Value(value) => value,
            Property::Record(record) => record.key().to_value(),
            Property::Properties(properties) => properties.to_json(),
            Property::List(items) => {
                Value::Array(items.into_iter().map(Property::into_value).collect())
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Property::Value(Value::Null))
    }

    pub(crate) fn fits_to_one(&self) -> bool {
        matches!(
            self,
            Property::Value(Value::Null)
                | Property::Value(Value::Object(_))
                | Property::Record(_)
                | Property::Properties(_)
        )
    }

    pub(crate) fn fits_to_many(&self) -> bool {
        match self {
            Property::List(items) => items.iter().all(Property::fits_related),
            Property::Value(Value::Array(items)) => items.iter().all(Value::is_object),
            _ => false,
        }
    }

    fn fits_related(&self) -> bool {
        matches!(
            self,
            Property::Value(Value::Object(_)) | Property::Record(_) | Property::Properties(_)
        )
    }

    /// `Ok(None)` clears a to-one association; unfit shapes are handed back.
    pub(crate) fn into_to_one(self) -> Result<Option<Related>, Property> {
        match self {
            Property::Value(Value::Null) => Ok(None),
            other => other.into_related().map(Some),
        }
    }

    pub(crate) fn into_to_many(self) -> Result<Vec<Related>, Property> {
        match self {
            Property::List(items) => items.into_iter().map(Property::into_related).collect(),
            Property::Value(Value::Array(items)) => items
                .into_iter()
                .map(|item| Property::Value(item).into_related())
                .collect(),
            other => Err(other),
        }
    }

    fn into_related(self) -> Result<Related, Property> {
        match self {
            Property::Record(record) => Ok(Related::Record(record)),
            Property::Properties(properties) => Ok(Related::Properties(properties)),
            Property::Value(Value::Object(map)) => Ok(Related::Properties(map.into())),
            other => Err(other),
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::Value(value)
    }
}

impl From<Record> for Property {
    fn from(record: Record) -> Self {
        Property::Record(record)
    }
}

impl From<&Record> for Property {
    fn from(record: &Record) -> Self {
        Property::Record(record.clone())
    }
}

impl From<Option<Record>> for Property {
    fn from(record: Option<Record>) -> Self {
        match record {
            Some(record) => Property::Record(record),
            None => Property::Value(Value::Null),
        }
    }
}

impl From<Properties> for Property {
    fn from(properties: Properties) -> Self {
        Property::Properties(properties)
    }
}

impl From<Related> for Property {
    fn from(related: Related) -> Self {
        match related {
            Related::Record(record) => Property::Record(record),
            Related::Properties(properties) => Property::Properties(properties),
        }
    }
}

impl<T: Into<Property>> From<Vec<T>> for Property {
    fn from(items: Vec<T>) -> Self {
        Property::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<PrimaryKey> for Property {
    fn from(key: PrimaryKey) -> Self {
        Property::Value(key.to_value())
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<i32> for Property {
    fn from(value: i32) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<Record> for Related {
    fn from(record: Record) -> Self {
        Related::Record(record)
    }
}

impl From<&Record> for Related {
    fn from(record: &Record) -> Self {
        Related::Record(record.clone())
    }
}

impl From<Properties> for Related {
    fn from(properties: Properties) -> Self {
        Related::Properties(properties)
    }
}
