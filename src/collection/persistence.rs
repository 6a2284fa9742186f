use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use super::Collection;
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::persistence::PersistenceStrategy;
use crate::properties::Properties;
use crate::record::Record;

/// What `load_one` should load: a live record or just its key.
#[derive(Debug, Clone)]
pub enum LoadTarget {
    Record(Record),
    Key(PrimaryKey),
}

impl From<Record> for LoadTarget {
    fn from(record: Record) -> Self {
        LoadTarget::Record(record)
    }
}

impl From<&Record> for LoadTarget {
    fn from(record: &Record) -> Self {
        LoadTarget::Record(record.clone())
    }
}

impl From<PrimaryKey> for LoadTarget {
    fn from(key: PrimaryKey) -> Self {
        LoadTarget::Key(key)
    }
}

impl From<i64> for LoadTarget {
    fn from(key: i64) -> Self {
        LoadTarget::Key(key.into())
    }
}

impl From<i32> for LoadTarget {
    fn from(key: i32) -> Self {
        LoadTarget::Key(key.into())
    }
}

impl From<&str> for LoadTarget {
    fn from(key: &str) -> Self {
        LoadTarget::Key(key.into())
    }
}

impl Collection {
    pub fn set_persistence_strategy(&self, strategy: impl PersistenceStrategy + 'static) {
        self.set_shared_persistence_strategy(Rc::new(strategy));
    }

    /// Share one strategy between several collections.
    pub fn set_shared_persistence_strategy(&self, strategy: Rc<dyn PersistenceStrategy>) {
        *self.inner.strategy.borrow_mut() = Some(strategy);
    }

    pub fn clear_persistence_strategy(&self) {
        self.inner.strategy.borrow_mut().take();
    }

    pub fn persistence_strategy(&self) -> Result<Rc<dyn PersistenceStrategy>> {
        self.inner
            .strategy
            .borrow()
            .clone()
            .ok_or_else(|| OrmError::NoPersistenceStrategy {
                record_type: self.record_type().name().to_string(),
            })
    }

    /// Load the named scope. The strategy decides which records land in the
    /// collection and writes the scope's key list.
    pub async fn load(&self, params: Value, scope_name: &str) -> Result<Vec<Record>> {
        let strategy = self.persistence_strategy()?;
        let scope = self.provide_scope(scope_name, Some(params.clone()));
        debug!(record_type = self.record_type().name(), scope = scope_name, "load");
        strategy.load_many(&params, &scope).await
    }

    /// Load one record. A bare key reuses the record indexed under it, or
    /// creates a stub holding only that key.
    pub async fn load_one(
        &self,
        target: impl Into<LoadTarget>,
        params: Value,
        scope_name: &str,
    ) -> Result<Record> {
        let strategy = self.persistence_strategy()?;
        let scope = self.provide_scope(scope_name, None);
        let record = match target.into() {
            LoadTarget::Record(record) => record,
            LoadTarget::Key(key) => match self.get_loose(&key) {
                Some(record) => record,
                None => self.set(
                    Properties::new().with(self.record_type().primary_key(), key),
                )?,
            },
        };
        debug!(record_type = self.record_type().name(), key = %record.key(), "load one");
        strategy.load_one(&params, &record, &scope).await
    }

    pub async fn save_one(
        &self,
        record: &Record,
        params: Value,
        scope_name: &str,
    ) -> Result<Record> {
        let strategy = self.persistence_strategy()?;
        let scope = self.provide_scope(scope_name, None);
        debug!(record_type = self.record_type().name(), key = %record.key(), "save one");
        strategy.save_one(&params, record, &scope).await
    }

    pub async fn destroy_one(
        &self,
        record: &Record,
        params: Value,
        scope_name: &str,
    ) -> Result<()> {
        let strategy = self.persistence_strategy()?;
        let scope = self.provide_scope(scope_name, None);
        debug!(record_type = self.record_type().name(), key = %record.key(), "destroy one");
        strategy.destroy_one(&params, record, &scope).await
    }
}
