//! InMemoryService - document store for testing and development.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use super::PersistenceService;
use crate::error::{OrmError, Result};
use crate::key::{self, PrimaryKey};
use crate::record::Record;
use crate::schema::DEFAULT_PRIMARY_KEY;
use crate::scope::Scope;

/// In-memory document store keyed by primary key.
///
/// New documents get auto-increment integer keys. `load_many` returns every
/// document whose fields loosely match each field of the params object.
/// Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryService {
    name: String,
    primary_key: String,
    documents: Arc<RwLock<IndexMap<String, Value>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            documents: Arc::new(RwLock::new(IndexMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Field holding the document key. Defaults to `"id"`.
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    /// Seed a document. Documents without a key are assigned one.
    pub fn insert(&self, document: Value) -> Result<PrimaryKey> {
        let mut document = document;
        let key = self.ensure_key(&mut document)?;
        let mut documents = self
            .documents
            .write()
            .map_err(|_| OrmError::LockPoisoned("insert"))?;
        documents.insert(key.to_string(), document);
        Ok(key)
    }

    pub fn get(&self, key: &PrimaryKey) -> Result<Option<Value>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| OrmError::LockPoisoned("get"))?;
        Ok(documents.get(&key.to_string()).cloned())
    }

    /// Snapshot of all stored documents, in insertion order.
    pub fn documents(&self) -> Result<Vec<Value>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| OrmError::LockPoisoned("documents"))?;
        Ok(documents.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        let documents = self
            .documents
            .read()
            .map_err(|_| OrmError::LockPoisoned("len"))?;
        Ok(documents.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn ensure_key(&self, document: &mut Value) -> Result<PrimaryKey> {
        let Value::Object(fields) = document else {
            return Err(OrmError::Persistence(format!(
                "{}: documents must be JSON objects",
                self.name
            )));
        };
        if let Some(key) = fields.get(&self.primary_key).and_then(PrimaryKey::from_value) {
            if let PrimaryKey::Int(id) = key {
                self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
            }
            return Ok(key);
        }
        let key = PrimaryKey::Int(self.next_id.fetch_add(1, Ordering::SeqCst));
        fields.insert(self.primary_key.clone(), key.to_value());
        Ok(key)
    }

    fn matches(document: &Value, params: &Value) -> bool {
        match params {
            Value::Object(filters) => filters
                .iter()
                .all(|(field, expected)| key::loose_eq(&document[field.as_str()], expected)),
            _ => true,
        }
    }
}

#[async_trait(?Send)]
impl PersistenceService for InMemoryService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_many(&self, params: &Value, _scope: &Scope) -> Result<Vec<Value>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| OrmError::LockPoisoned("load_many"))?;
        Ok(documents
            .values()
            .filter(|document| Self::matches(document, params))
            .cloned()
            .collect())
    }

    async fn load_one(&self, _params: &Value, record: &Record) -> Result<Option<Value>> {
        match record.real_key() {
            Some(key) => self.get(&key),
            None => Ok(None),
        }
    }

    async fn save_one(&self, _params: &Value, record: &Record) -> Result<Value> {
        let mut document = record.own_attributes();
        if let Value::Object(fields) = &mut document {
            if record.real_key().is_none() {
                fields.remove(&self.primary_key);
            }
        }
        let key = self.insert(document)?;
        self.get(&key)?
            .ok_or_else(|| OrmError::Persistence(format!("{}: saved document vanished", self.name)))
    }

    async fn destroy_one(&self, _params: &Value, record: &Record) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| OrmError::LockPoisoned("destroy_one"))?;
        documents.shift_remove(&record.key().to_string());
        Ok(())
    }
}
