use serde_json::Value;
use tracing::debug;

use super::Record;
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::observer::Subscription;
use crate::properties::Property;

/// A record's current key moved from `old` to `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange {
    pub old: PrimaryKey,
    pub new: PrimaryKey,
}

impl Record {
    /// Assign a plain attribute.
    ///
    /// Assigning the primary-key field re-indexes the record and cascades the
    /// new key to associated records. Assigning a to-one foreign key re-targets
    /// that association. Association fields themselves go through the same
    /// path as a single-property merge.
    pub fn set_attr(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.inner.record_type.has_property(name) || self.is_foreign_key(name) {
            self.merge_with_one(name, Property::Value(value.into()), true)
        } else {
            Err(OrmError::UndeclaredProperty {
                record_type: self.inner.record_type.name().to_string(),
                property: name.to_string(),
            })
        }
    }

    /// Observe changes of this record's current key.
    pub fn subscribe_key_changes<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&KeyChange) + 'static,
    {
        self.inner.key_changes.subscribe(callback)
    }

    /// Unchecked write; the only place attribute storage is mutated.
    pub(crate) fn write_attribute(&self, name: &str, value: Value) -> Result<()> {
        if self.inner.record_type.is_primary_key(name) {
            return self.assign_primary_key(value);
        }

        self.inner
            .state
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value);

        let retarget: Vec<usize> = self
            .inner
            .to_one
            .iter()
            .enumerate()
            .filter(|(_, wiring)| wiring.foreign_key == name)
            .map(|(index, _)| index)
            .collect();
        for index in retarget {
            self.track_foreign(index);
        }
        Ok(())
    }

    fn assign_primary_key(&self, value: Value) -> Result<()> {
        let real_key = self.parse_key(&value)?;
        let stored = real_key.as_ref().map(PrimaryKey::to_value).unwrap_or(Value::Null);

        let old = self.key();
        {
            let mut state = self.inner.state.borrow_mut();
            state.real_key = real_key;
            state
                .attributes
                .insert(self.inner.record_type.primary_key().to_string(), stored);
        }
        let new = self.key();
        if old == new {
            return Ok(());
        }

        debug!(
            record_type = self.inner.record_type.name(),
            old = %old,
            new = %new,
            "primary key changed"
        );

        if let Some(collection) = self.collection() {
            collection.rekey_record(self, &old, &new)?;
        }

        // to-many members follow their parent
        for wiring in &self.inner.to_many {
            let Some(foreign) = wiring.foreign.upgrade() else {
                continue;
            };
            for member in foreign.where_equal(&wiring.foreign_key, old.to_value()) {
                member.write_attribute(&wiring.foreign_key, new.to_value())?;
            }
        }

        self.inner.key_changes.notify(&KeyChange { old, new });
        Ok(())
    }

    /// `Null` and `""` clear the real key.
    fn parse_key(&self, value: &Value) -> Result<Option<PrimaryKey>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            other => PrimaryKey::from_value(other)
                .map(Some)
                .ok_or_else(|| OrmError::InvalidKeyValue {
                    record_type: self.inner.record_type.name().to_string(),
                    value: other.to_string(),
                }),
        }
    }
}
