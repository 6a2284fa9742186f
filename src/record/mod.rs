//! Records - entity instances with dual identity and virtual associations.
//!
//! A record always belongs to exactly one [`Collection`]. Its key is the real
//! key once one is known and the optimistic key until then. Associations are
//! never stored as references: to-one fields resolve through the foreign-key
//! attribute, to-many fields scan the foreign collection for members whose
//! foreign key equals this record's key.

mod identity;
mod list;
mod merge;
mod persistence;
mod populate;
mod to_many;
mod to_one;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::SystemTime;

use indexmap::IndexMap;
use serde_json::Value;

use crate::collection::{Collection, WeakCollection};
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::observer::{Observers, Subscription};
use crate::schema::RecordType;

pub use identity::KeyChange;
pub use list::ToManyList;

#[derive(Clone)]
pub struct Record {
    inner: Rc<RecordInner>,
}

struct RecordInner {
    record_type: Rc<RecordType>,
    collection: WeakCollection,
    optimistic_key: String,
    state: RefCell<RecordState>,
    key_changes: Observers<KeyChange>,
    to_one: Vec<Wiring>,
    to_many: Vec<Wiring>,
    /// One slot per to-one association, parallel to `to_one`.
    tracking: RefCell<Vec<Option<Tracked>>>,
}

struct RecordState {
    real_key: Option<PrimaryKey>,
    attributes: IndexMap<String, Value>,
    loading_from: Option<String>,
    last_loaded_from: Option<String>,
    last_loaded_at: Option<SystemTime>,
}

/// Resolved association wiring for one record.
struct Wiring {
    name: String,
    foreign: WeakCollection,
    foreign_key: String,
    merge_on_assign: bool,
}

/// Live key-change subscription on the record a to-one association points at.
struct Tracked {
    target: Weak<RecordInner>,
    _subscription: Subscription,
}

impl Record {
    /// Construct a record of `record_type` and register it in `collection`
    /// under its optimistic key.
    ///
    /// Fails with `InvalidOwner` when the collection is gone or stores another
    /// type, and with `InvalidAssociationTarget` when an association's foreign
    /// collection cannot be resolved.
    pub fn new(record_type: &Rc<RecordType>, collection: &WeakCollection) -> Result<Record> {
        let owner = collection
            .upgrade()
            .filter(|owner| owner.record_type().name() == record_type.name())
            .ok_or_else(|| OrmError::InvalidOwner {
                record_type: record_type.name().to_string(),
            })?;

        let to_one = record_type
            .to_one_associations()
            .iter()
            .map(|(name, descriptor)| {
                let foreign = resolve_foreign(record_type, name, descriptor.foreign_collection())?;
                let foreign_key = descriptor
                    .foreign_key_attribute()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}_{}", name, foreign.record_type().primary_key()));
                Ok(Wiring {
                    name: name.clone(),
                    foreign: foreign.downgrade(),
                    foreign_key,
                    merge_on_assign: descriptor.merges_on_assign(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let to_many = record_type
            .to_many_associations()
            .iter()
            .map(|(name, descriptor)| {
                let foreign = resolve_foreign(record_type, name, descriptor.foreign_collection())?;
                let foreign_key = descriptor
                    .foreign_key_attribute()
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        format!(
                            "{}_{}",
                            record_type.name().to_lowercase(),
                            record_type.primary_key()
                        )
                    });
                Ok(Wiring {
                    name: name.clone(),
                    foreign: foreign.downgrade(),
                    foreign_key,
                    merge_on_assign: descriptor.merges_on_assign(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut attributes: IndexMap<String, Value> = record_type
            .own_attribute_names()
            .iter()
            .map(|name| (name.clone(), Value::Null))
            .collect();
        for wiring in &to_one {
            attributes.entry(wiring.foreign_key.clone()).or_insert(Value::Null);
        }

        let record = Record {
            inner: Rc::new(RecordInner {
                record_type: Rc::clone(record_type),
                collection: collection.clone(),
                optimistic_key: crate::identity::next_optimistic_key(),
                state: RefCell::new(RecordState {
                    real_key: None,
                    attributes,
                    loading_from: None,
                    last_loaded_from: None,
                    last_loaded_at: None,
                }),
                key_changes: Observers::new(),
                tracking: RefCell::new(to_one.iter().map(|_| None).collect()),
                to_one,
                to_many,
            }),
        };

        owner.set_record(&record)?;
        Ok(record)
    }

    /// The key collections index this record by.
    pub fn key(&self) -> PrimaryKey {
        self.inner
            .state
            .borrow()
            .real_key
            .clone()
            .unwrap_or_else(|| PrimaryKey::Str(self.inner.optimistic_key.clone()))
    }

    pub fn real_key(&self) -> Option<PrimaryKey> {
        self.inner.state.borrow().real_key.clone()
    }

    pub fn optimistic_key(&self) -> &str {
        &self.inner.optimistic_key
    }

    /// True until a real key has been assigned.
    pub fn is_new(&self) -> bool {
        self.inner.state.borrow().real_key.is_none()
    }

    pub fn record_type(&self) -> &Rc<RecordType> {
        &self.inner.record_type
    }

    pub fn collection(&self) -> Option<Collection> {
        self.inner.collection.upgrade()
    }

    /// Current value of an attribute (`Null` when unset or undeclared).
    pub fn attr(&self, name: &str) -> Value {
        self.inner
            .state
            .borrow()
            .attributes
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.inner.record_type.has_property(name)
    }

    pub fn property_names(&self) -> &[String] {
        self.inner.record_type.property_names()
    }

    pub fn to_one_names(&self) -> Vec<&str> {
        self.inner.to_one.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn to_many_names(&self) -> Vec<&str> {
        self.inner.to_many.iter().map(|w| w.name.as_str()).collect()
    }

    /// Foreign-key attribute backing the named association.
    pub fn foreign_key_of(&self, association: &str) -> Option<&str> {
        self.inner
            .to_one
            .iter()
            .chain(self.inner.to_many.iter())
            .find(|w| w.name == association)
            .map(|w| w.foreign_key.as_str())
    }

    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn owner_error(&self) -> OrmError {
        OrmError::InvalidOwner {
            record_type: self.inner.record_type.name().to_string(),
        }
    }

    fn is_foreign_key(&self, name: &str) -> bool {
        self.inner.to_one.iter().any(|w| w.foreign_key == name)
    }
}

fn resolve_foreign(
    record_type: &RecordType,
    association: &str,
    foreign: Option<Collection>,
) -> Result<Collection> {
    foreign.ok_or_else(|| OrmError::InvalidAssociationTarget {
        record_type: record_type.name().to_string(),
        association: association.to_string(),
    })
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Record");
        debug.field("type", &self.inner.record_type.name());
        match self.inner.state.try_borrow() {
            Ok(state) => debug
                .field("key", &state.real_key)
                .field("optimistic_key", &self.inner.optimistic_key)
                .field("attributes", &state.attributes),
            Err(_) => debug.field("optimistic_key", &self.inner.optimistic_key),
        };
        debug.finish()
    }
}
