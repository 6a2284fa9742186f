use serde_json::Value;
use tracing::debug;

use super::{Record, ToManyList};
use crate::collection::Collection;
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::properties::Related;

impl Record {
    /// Current members of a to-many association, in foreign collection order.
    pub fn many(&self, name: &str) -> Result<ToManyList> {
        let index = self.to_many_index(name)?;
        Ok(ToManyList::new(self.clone(), index, self.members(index)))
    }

    /// Replace the members of a to-many association.
    ///
    /// Current members missing from `items` are detached (foreign key cleared),
    /// every item is attached. Nothing is removed from the foreign collection.
    pub fn assign_many<I, T>(&self, name: &str, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Related>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.assign_many_with(name, items, true)
    }

    pub(super) fn assign_many_with(
        &self,
        name: &str,
        items: Vec<Related>,
        strict: bool,
    ) -> Result<()> {
        let index = self.to_many_index(name)?;
        let foreign = self.foreign_of(index)?;
        let foreign_pk = foreign.record_type().primary_key().to_string();

        let keep: Vec<PrimaryKey> = items
            .iter()
            .filter_map(|item| match item {
                Related::Record(record) => Some(record.key()),
                Related::Properties(properties) => properties.key_value(&foreign_pk),
            })
            .collect();

        for member in self.members(index) {
            let member_key = member.key();
            if !keep.iter().any(|key| key.loose_eq(&member_key)) {
                self.detach_member(index, &member)?;
            }
        }

        debug!(
            record_type = self.inner.record_type.name(),
            association = name,
            count = items.len(),
            "replacing to-many members"
        );
        for item in items {
            self.attach_member_with(index, item, strict)?;
        }
        Ok(())
    }

    fn to_many_index(&self, name: &str) -> Result<usize> {
        self.inner
            .to_many
            .iter()
            .position(|wiring| wiring.name == name)
            .ok_or_else(|| {
                if self.inner.record_type.has_property(name) {
                    self.invalid_value(name)
                } else {
                    OrmError::UndeclaredProperty {
                        record_type: self.inner.record_type.name().to_string(),
                        property: name.to_string(),
                    }
                }
            })
    }

    fn foreign_of(&self, index: usize) -> Result<Collection> {
        let wiring = &self.inner.to_many[index];
        wiring
            .foreign
            .upgrade()
            .ok_or_else(|| OrmError::InvalidAssociationTarget {
                record_type: self.inner.record_type.name().to_string(),
                association: wiring.name.clone(),
            })
    }

    pub(super) fn members(&self, index: usize) -> Vec<Record> {
        let Some(wiring) = self.inner.to_many.get(index) else {
            return Vec::new();
        };
        match wiring.foreign.upgrade() {
            Some(foreign) => foreign.where_equal(&wiring.foreign_key, self.key().to_value()),
            None => Vec::new(),
        }
    }

    pub(super) fn to_many_name(&self, index: usize) -> &str {
        self.inner
            .to_many
            .get(index)
            .map(|wiring| wiring.name.as_str())
            .unwrap_or_default()
    }

    /// Materialize an item in the foreign collection and point its foreign key here.
    pub(super) fn attach_member_with(
        &self,
        index: usize,
        item: Related,
        strict: bool,
    ) -> Result<Record> {
        let foreign = self.foreign_of(index)?;
        let wiring = &self.inner.to_many[index];
        let member = foreign.materialize(item, wiring.merge_on_assign, strict)?;
        member.write_attribute(&wiring.foreign_key, self.key().to_value())?;
        Ok(member)
    }

    pub(super) fn detach_member(&self, index: usize, member: &Record) -> Result<()> {
        match self.inner.to_many.get(index) {
            Some(wiring) => member.write_attribute(&wiring.foreign_key, Value::Null),
            None => Ok(()),
        }
    }
}
