//! Collections - the indexed store of every live record of one type.
//!
//! A collection owns its records and scopes. Records, scopes and the
//! association wiring of other types only hold [`WeakCollection`]s, so a
//! dropped collection never keeps anything alive.
//!
//! ## Example
//!
//! ```ignore
//! use recollect::{Collection, Properties, RecordType};
//!
//! let bands = Collection::new(RecordType::builder("Band").attribute("name").build());
//! let genesis = bands.set(Properties::new().with("name", "Genesis"))?;
//! genesis.set_attr("id", 123)?;
//! assert!(bands.get(123).is_some());
//! ```

mod events;
mod index;
mod persistence;
mod scopes;
mod slot;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::key::PrimaryKey;
use crate::persistence::PersistenceStrategy;
use crate::record::Record;
use crate::schema::{RecordDefinition, RecordType};
use crate::scope::Scope;

pub use events::CollectionEvent;
pub use persistence::LoadTarget;
pub use slot::CollectionSlot;

pub const DEFAULT_SCOPE: &str = "default";

#[derive(Clone)]
pub struct Collection {
    inner: Rc<CollectionInner>,
}

/// Non-owning reference to a [`Collection`].
#[derive(Clone, Default)]
pub struct WeakCollection {
    inner: Weak<CollectionInner>,
}

struct CollectionInner {
    record_type: Rc<RecordType>,
    records: RefCell<IndexMap<PrimaryKey, Record>>,
    scopes: RefCell<IndexMap<String, Scope>>,
    strategy: RefCell<Option<Rc<dyn PersistenceStrategy>>>,
    #[cfg(feature = "emitter")]
    emitter: RefCell<event_emitter_rs::EventEmitter>,
}

impl Collection {
    pub fn new(record_type: Rc<RecordType>) -> Self {
        Collection {
            inner: Rc::new(CollectionInner {
                record_type,
                records: RefCell::new(IndexMap::new()),
                scopes: RefCell::new(IndexMap::new()),
                strategy: RefCell::new(None),
                #[cfg(feature = "emitter")]
                emitter: RefCell::new(event_emitter_rs::EventEmitter::new()),
            }),
        }
    }

    /// Collection for a type declared with `#[derive(RecordType)]`.
    pub fn of<T: RecordDefinition>() -> Self {
        Collection::new(T::record_type())
    }

    pub fn record_type(&self) -> &Rc<RecordType> {
        &self.inner.record_type
    }

    pub fn downgrade(&self) -> WeakCollection {
        WeakCollection {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl WeakCollection {
    /// A reference that never upgrades.
    pub fn new() -> Self {
        WeakCollection::default()
    }

    pub fn upgrade(&self) -> Option<Collection> {
        self.inner.upgrade().map(|inner| Collection { inner })
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("record_type", &self.inner.record_type.name())
            .field("size", &self.size())
            .field("scopes", &self.inner.scopes.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Debug for WeakCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCollection")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
