use std::rc::Rc;

use serde_json::Value;
use tracing::{trace, warn};

use super::{Record, Tracked, Wiring};
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::properties::Related;

use super::identity::KeyChange;

impl Record {
    /// Resolve a to-one association by its foreign key.
    ///
    /// Always a fresh lookup; `None` for a cleared or dangling foreign key and
    /// for names that are not to-one associations.
    pub fn one(&self, name: &str) -> Option<Record> {
        let index = self.to_one_index(name)?;
        let target = self.resolve_one(&self.inner.to_one[index])?;

        let tracked = self
            .inner
            .tracking
            .borrow()
            .get(index)
            .and_then(Option::as_ref)
            .map(|tracked| tracked.target.ptr_eq(&Rc::downgrade(&target.inner)))
            .unwrap_or(false);
        if !tracked {
            self.track_foreign(index);
        }
        Some(target)
    }

    /// Point a to-one association at a record, at a bag that is materialized
    /// in the foreign collection first, or at nothing.
    pub fn assign_one(&self, name: &str, value: Option<impl Into<Related>>) -> Result<()> {
        self.assign_one_with(name, value.map(Into::into), true)
    }

    pub(super) fn assign_one_with(
        &self,
        name: &str,
        value: Option<Related>,
        strict: bool,
    ) -> Result<()> {
        let index = self.to_one_index(name).ok_or_else(|| self.not_to_one(name))?;
        let wiring = &self.inner.to_one[index];

        let foreign_key = match value {
            None => Value::Null,
            Some(related) => {
                let foreign = wiring.foreign.upgrade().ok_or_else(|| {
                    OrmError::InvalidAssociationTarget {
                        record_type: self.inner.record_type.name().to_string(),
                        association: name.to_string(),
                    }
                })?;
                foreign
                    .materialize(related, wiring.merge_on_assign, strict)?
                    .key()
                    .to_value()
            }
        };
        self.write_attribute(&wiring.foreign_key, foreign_key)
    }

    fn to_one_index(&self, name: &str) -> Option<usize> {
        self.inner.to_one.iter().position(|wiring| wiring.name == name)
    }

    fn not_to_one(&self, name: &str) -> OrmError {
        if self.inner.record_type.has_property(name) {
            self.invalid_value(name)
        } else {
            OrmError::UndeclaredProperty {
                record_type: self.inner.record_type.name().to_string(),
                property: name.to_string(),
            }
        }
    }

    fn resolve_one(&self, wiring: &Wiring) -> Option<Record> {
        let foreign = wiring.foreign.upgrade()?;
        let key = PrimaryKey::from_value(&self.attr(&wiring.foreign_key))?;
        foreign.get_loose(&key)
    }

    /// Replace the key-change subscription of one to-one association with one
    /// on the record its foreign key currently resolves to.
    pub(super) fn track_foreign(&self, index: usize) {
        let previous = self
            .inner
            .tracking
            .borrow_mut()
            .get_mut(index)
            .and_then(Option::take);
        drop(previous);

        let Some(wiring) = self.inner.to_one.get(index) else {
            return;
        };
        let Some(target) = self.resolve_one(wiring) else {
            return;
        };

        trace!(
            record_type = self.inner.record_type.name(),
            association = wiring.name.as_str(),
            target = %target.key(),
            "tracking foreign key"
        );

        let me = Rc::downgrade(&self.inner);
        let subscription = target.subscribe_key_changes(move |change| {
            if let Some(inner) = me.upgrade() {
                Record { inner }.follow_foreign_key(index, change);
            }
        });

        if let Some(slot) = self.inner.tracking.borrow_mut().get_mut(index) {
            *slot = Some(Tracked {
                target: Rc::downgrade(&target.inner),
                _subscription: subscription,
            });
        }
    }

    fn follow_foreign_key(&self, index: usize, change: &KeyChange) {
        let Some(wiring) = self.inner.to_one.get(index) else {
            return;
        };
        if let Err(err) = self.write_attribute(&wiring.foreign_key, change.new.to_value()) {
            warn!(
                record_type = self.inner.record_type.name(),
                association = wiring.name.as_str(),
                error = %err,
                "failed to follow foreign key change"
            );
        }
    }
}
