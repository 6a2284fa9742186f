use std::slice;

use super::Record;
use crate::error::{OrmError, Result};
use crate::properties::Related;

/// Snapshot of a to-many association whose edits are association edits.
///
/// Adding an element attaches it to the owner (materializing bags in the
/// foreign collection), removing one detaches it. The snapshot is kept in step
/// with its own edits; call [`refresh`](Self::refresh) to pick up changes made
/// elsewhere.
#[derive(Debug, Clone)]
pub struct ToManyList {
    owner: Record,
    index: usize,
    items: Vec<Record>,
}

impl ToManyList {
    pub(super) fn new(owner: Record, index: usize, items: Vec<Record>) -> Self {
        Self {
            owner,
            index,
            items,
        }
    }

    pub fn name(&self) -> &str {
        self.owner.to_many_name(self.index)
    }

    pub fn owner(&self) -> &Record {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.items.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Record> {
        self.items.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.items
    }

    /// Attach one element at the end. Returns the canonical record.
    ///
    /// A record that is already a member keeps its place.
    pub fn push(&mut self, item: impl Into<Related>) -> Result<Record> {
        let record = self.owner.attach_member_with(self.index, item.into(), true)?;
        if !self.contains(&record) {
            self.items.push(record.clone());
        }
        Ok(record)
    }

    pub fn extend<I, T>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Related>,
    {
        for item in items {
            self.push(item)?;
        }
        Ok(())
    }

    /// Detach `remove` elements starting at `start`, then attach `insert` in
    /// their place. Out-of-range bounds are clamped. Returns the detached records.
    pub fn splice<I, T>(&mut self, start: usize, remove: usize, insert: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Related>,
    {
        let start = start.min(self.items.len());
        let end = start.saturating_add(remove).min(self.items.len());

        let removed: Vec<Record> = self.items.drain(start..end).collect();
        for record in &removed {
            self.owner.detach_member(self.index, record)?;
        }

        let mut position = start;
        for item in insert {
            let record = self.owner.attach_member_with(self.index, item.into(), true)?;
            if !self.contains(&record) {
                self.items.insert(position, record);
                position += 1;
            }
        }
        Ok(removed)
    }

    /// Detach the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Record> {
        if index >= self.items.len() {
            return Err(self.out_of_bounds(index));
        }
        let record = self.items.remove(index);
        self.owner.detach_member(self.index, &record)?;
        Ok(record)
    }

    /// Detach the element at `index` and attach `value` in its place.
    ///
    /// `None` only detaches. Replacing at `len()` appends. Returns the element
    /// previously at `index`.
    pub fn replace(
        &mut self,
        index: usize,
        value: Option<impl Into<Related>>,
    ) -> Result<Option<Record>> {
        let len = self.items.len();
        if index > len {
            return Err(self.out_of_bounds(index));
        }

        let previous = if index < len {
            let previous = self.items.remove(index);
            self.owner.detach_member(self.index, &previous)?;
            Some(previous)
        } else {
            None
        };

        if let Some(value) = value {
            let record = self.owner.attach_member_with(self.index, value.into(), true)?;
            if !self.contains(&record) {
                self.items.insert(index, record);
            }
        }
        Ok(previous)
    }

    /// Detach every element.
    pub fn clear(&mut self) -> Result<()> {
        for record in std::mem::take(&mut self.items) {
            self.owner.detach_member(self.index, &record)?;
        }
        Ok(())
    }

    /// Re-read membership from the foreign collection.
    pub fn refresh(&mut self) {
        self.items = self.owner.members(self.index);
    }

    fn contains(&self, record: &Record) -> bool {
        self.items.iter().any(|member| member.ptr_eq(record))
    }

    fn out_of_bounds(&self, index: usize) -> OrmError {
        OrmError::IndexOutOfBounds {
            association: self.name().to_string(),
            index,
            len: self.items.len(),
        }
    }
}

impl<'a> IntoIterator for &'a ToManyList {
    type Item = &'a Record;
    type IntoIter = slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
