use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::PersistenceStrategy;
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::properties::Properties;
use crate::record::Record;
use crate::scope::Scope;

/// A named backend that exchanges raw JSON documents.
#[async_trait(?Send)]
pub trait PersistenceService {
    /// Identifies the service in scope and record load bookkeeping.
    fn name(&self) -> &str;

    async fn load_many(&self, params: &Value, scope: &Scope) -> Result<Vec<Value>>;

    async fn load_one(&self, params: &Value, record: &Record) -> Result<Option<Value>>;

    /// Persist the record and return the stored document, including any key
    /// the backend assigned.
    async fn save_one(&self, params: &Value, record: &Record) -> Result<Value>;

    async fn destroy_one(&self, params: &Value, record: &Record) -> Result<()>;
}

/// Strategy backed by a single [`PersistenceService`].
///
/// Loaded documents are merged into the collection (unknown fields are
/// skipped) so records already held keep their identity. Saving merges the
/// returned document onto the saved record, promoting its optimistic key.
#[derive(Clone)]
pub struct ServiceStrategy {
    service: Rc<dyn PersistenceService>,
}

impl ServiceStrategy {
    pub fn new(service: impl PersistenceService + 'static) -> Self {
        Self {
            service: Rc::new(service),
        }
    }

    pub fn shared(service: Rc<dyn PersistenceService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Rc<dyn PersistenceService> {
        &self.service
    }
}

fn document(value: Value) -> Result<Properties> {
    Properties::from_json(value)
        .ok_or_else(|| OrmError::Persistence("service returned a non-object document".into()))
}

#[async_trait(?Send)]
impl PersistenceStrategy for ServiceStrategy {
    async fn load_many(&self, params: &Value, scope: &Scope) -> Result<Vec<Record>> {
        let collection = scope.collection()?;
        let name = self.service.name().to_string();
        scope.set_loading_from(Some(name.clone()));

        let documents = match self.service.load_many(params, scope).await {
            Ok(documents) => documents,
            Err(err) => {
                scope.set_loading_from(None);
                warn!(service = name.as_str(), scope = scope.name(), error = %err, "load failed");
                return Err(err);
            }
        };

        let records = documents
            .into_iter()
            .map(document)
            .collect::<Result<Vec<_>>>()
            .and_then(|bags| collection.merge_many_lenient(bags));
        let records = match records {
            Ok(records) => records,
            Err(err) => {
                scope.set_loading_from(None);
                return Err(err);
            }
        };

        for record in &records {
            record.mark_loaded(&name);
        }
        scope.set_item_primary_keys(records.iter().map(Record::key).collect());
        scope.mark_loaded(&name);
        debug!(service = name.as_str(), scope = scope.name(), count = records.len(), "loaded");
        Ok(records)
    }

    async fn load_one(&self, params: &Value, record: &Record, scope: &Scope) -> Result<Record> {
        let name = self.service.name().to_string();
        record.set_loading_from(Some(name.clone()));
        scope.set_loading_from(Some(name.clone()));

        let fetched = self.service.load_one(params, record).await;
        let found = match fetched {
            Ok(Some(found)) => found,
            Ok(None) => {
                record.set_loading_from(None);
                scope.set_loading_from(None);
                return Err(OrmError::Persistence(format!(
                    "{} not found in {}",
                    record.key(),
                    name
                )));
            }
            Err(err) => {
                record.set_loading_from(None);
                scope.set_loading_from(None);
                warn!(
                    service = name.as_str(),
                    key = %record.key(),
                    error = %err,
                    "load one failed"
                );
                return Err(err);
            }
        };

        record.merge_properties_lenient(document(found)?)?;
        record.mark_loaded(&name);
        scope.add_key(record.key());
        scope.mark_loaded(&name);
        Ok(record.clone())
    }

    async fn save_one(&self, params: &Value, record: &Record, scope: &Scope) -> Result<Record> {
        let was_new = record.is_new();
        let previous_key: PrimaryKey = record.key();

        let saved = self.service.save_one(params, record).await.map_err(|err| {
            warn!(service = self.service.name(), key = %previous_key, error = %err, "save failed");
            err
        })?;
        record.merge_properties_lenient(document(saved)?)?;

        if was_new {
            let key = record.key();
            if !scope.replace_key(&previous_key, key.clone()) {
                scope.add_key(key);
            }
        }
        Ok(record.clone())
    }

    async fn destroy_one(&self, params: &Value, record: &Record, scope: &Scope) -> Result<()> {
        self.service.destroy_one(params, record).await.map_err(|err| {
            warn!(
                service = self.service.name(),
                key = %record.key(),
                error = %err,
                "destroy failed"
            );
            err
        })?;
        let key = record.key();
        scope.remove_key(&key);
        if let Ok(collection) = scope.collection() {
            collection.unset(key);
        }
        Ok(())
    }
}
