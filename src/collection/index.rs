use serde_json::Value;
use tracing::debug;

use super::{Collection, CollectionEvent};
use crate::error::{OrmError, Result};
use crate::key::{self, PrimaryKey};
use crate::properties::{Properties, Related};
use crate::record::Record;

impl Collection {
    /// Create a record from a property bag; an existing record passes through.
    ///
    /// Undeclared keys fail with `UndeclaredProperty` and leave nothing behind.
    pub fn set(&self, item: impl Into<Related>) -> Result<Record> {
        self.materialize(item.into(), false, true)
    }

    /// Like [`set`](Self::set), skipping undeclared keys.
    pub fn set_lenient(&self, item: impl Into<Related>) -> Result<Record> {
        self.materialize(item.into(), false, false)
    }

    /// `set` every item, preserving order.
    pub fn set_many<I, T>(&self, items: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Related>,
    {
        items.into_iter().map(|item| self.set(item)).collect()
    }

    pub fn set_many_lenient<I, T>(&self, items: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Related>,
    {
        items.into_iter().map(|item| self.set_lenient(item)).collect()
    }

    /// Update the record already indexed under the bag's primary key, or
    /// `set` a new one.
    pub fn merge(&self, item: impl Into<Related>) -> Result<Record> {
        self.materialize(item.into(), true, true)
    }

    pub fn merge_lenient(&self, item: impl Into<Related>) -> Result<Record> {
        self.materialize(item.into(), true, false)
    }

    pub fn merge_many<I, T>(&self, items: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Related>,
    {
        items.into_iter().map(|item| self.merge(item)).collect()
    }

    pub fn merge_many_lenient<I, T>(&self, items: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Related>,
    {
        items.into_iter().map(|item| self.merge_lenient(item)).collect()
    }

    pub(crate) fn materialize(&self, item: Related, merge: bool, strict: bool) -> Result<Record> {
        let properties = match item {
            Related::Record(record) => return Ok(record),
            Related::Properties(properties) => properties,
        };

        if merge {
            let existing = properties
                .key_value(self.record_type().primary_key())
                .and_then(|key| self.get_loose(&key));
            if let Some(existing) = existing {
                existing.merge_with(properties, strict)?;
                return Ok(existing);
            }
        }
        self.create(properties, strict)
    }

    fn create(&self, properties: Properties, strict: bool) -> Result<Record> {
        let record = Record::new(self.record_type(), &self.downgrade())?;
        if let Err(err) = record.merge_with(properties, strict) {
            self.unset(record.key());
            return Err(err);
        }
        Ok(record)
    }

    /// Index a record under its current key.
    ///
    /// Fails with `InvalidOwner` for a record that belongs to another collection.
    pub fn set_record(&self, record: &Record) -> Result<()> {
        let owned = record
            .collection()
            .map(|owner| owner.ptr_eq(self))
            .unwrap_or(false);
        if !owned {
            return Err(OrmError::InvalidOwner {
                record_type: self.record_type().name().to_string(),
            });
        }

        let key = record.key();
        self.inner
            .records
            .borrow_mut()
            .insert(key.clone(), record.clone());
        self.notify_change(CollectionEvent::SET, Some(&key), None);
        Ok(())
    }

    pub fn get(&self, key: impl Into<PrimaryKey>) -> Option<Record> {
        self.inner.records.borrow().get(&key.into()).cloned()
    }

    /// Exact lookup, falling back to a coercive key comparison.
    pub fn get_loose(&self, key: &PrimaryKey) -> Option<Record> {
        let records = self.inner.records.borrow();
        records.get(key).cloned().or_else(|| {
            records
                .iter()
                .find(|(candidate, _)| candidate.loose_eq(key))
                .map(|(_, record)| record.clone())
        })
    }

    pub fn has(&self, key: impl Into<PrimaryKey>) -> bool {
        self.inner.records.borrow().contains_key(&key.into())
    }

    /// One lookup per key, `None` for missing keys.
    pub fn get_many<I, K>(&self, keys: I) -> Vec<Option<Record>>
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        let records = self.inner.records.borrow();
        keys.into_iter()
            .map(|key| records.get(&key.into()).cloned())
            .collect()
    }

    pub fn size(&self) -> usize {
        self.inner.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Indexed keys in insertion order.
    pub fn keys(&self) -> Vec<PrimaryKey> {
        self.inner.records.borrow().keys().cloned().collect()
    }

    pub fn items(&self) -> Vec<Record> {
        self.inner.records.borrow().values().cloned().collect()
    }

    /// Records whose `field` loosely equals `value`, in insertion order.
    pub fn where_equal(&self, field: &str, value: impl Into<Value>) -> Vec<Record> {
        let value = value.into();
        self.items()
            .into_iter()
            .filter(|record| key::loose_eq(&record.attr(field), &value))
            .collect()
    }

    /// Remove one record from the index. Associations pointing at it are left dangling.
    pub fn unset(&self, key: impl Into<PrimaryKey>) -> Option<Record> {
        let key = key.into();
        let removed = self.inner.records.borrow_mut().shift_remove(&key);
        if removed.is_some() {
            self.notify_change(CollectionEvent::UNSET, Some(&key), None);
        }
        removed
    }

    /// Remove every present key, ignoring missing ones. Returns how many were removed.
    pub fn unset_many<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: Into<PrimaryKey>,
    {
        keys.into_iter()
            .map(|key| self.unset(key))
            .filter(Option::is_some)
            .count()
    }

    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.inner.records.borrow_mut());
        drop(removed);
        self.notify_change(CollectionEvent::CLEAR, None, None);
    }

    /// Re-index `record` after its key moved from `old` to `new`.
    ///
    /// Only moves the entry under `old` when it holds this very record. A
    /// record that was displaced earlier is indexed afresh under `new`.
    pub(crate) fn rekey_record(
        &self,
        record: &Record,
        old: &PrimaryKey,
        new: &PrimaryKey,
    ) -> Result<()> {
        let indexed_here = self
            .inner
            .records
            .borrow()
            .get(old)
            .map(|current| current.ptr_eq(record))
            .unwrap_or(false);
        if indexed_here {
            self.update_record_primary_key(old, new);
            Ok(())
        } else {
            self.set_record(record)
        }
    }

    /// Move the record indexed under `old` to `new`, keeping its position.
    ///
    /// A missing `old` key is a silent no-op. A record already indexed under
    /// `new` is displaced from the index.
    pub fn update_record_primary_key(&self, old: &PrimaryKey, new: &PrimaryKey) -> bool {
        if old == new {
            return false;
        }
        {
            let mut records = self.inner.records.borrow_mut();
            let Some((mut position, _, record)) = records.shift_remove_full(old) else {
                return false;
            };
            if let Some(displaced) = records.get_index_of(new) {
                records.shift_remove_index(displaced);
                if displaced < position {
                    position -= 1;
                }
            }
            let position = position.min(records.len());
            records.shift_insert(position, new.clone(), record);
        }

        debug!(
            record_type = self.record_type().name(),
            old = %old,
            new = %new,
            "re-indexed record"
        );
        self.notify_change(CollectionEvent::REKEY, Some(new), Some(old));
        true
    }
}
