//! In-memory object-relational mapping for client applications.
//!
//! Records live in [`Collection`]s indexed by their current key. Every record
//! starts with an optimistic key and may be promoted to a real key later; the
//! collection re-indexes it and every association pointing at it follows.
//! Associations are resolved through foreign-key lookups, never stored
//! references. [`Scope`]s are named key lists filled by a
//! [`PersistenceStrategy`].

extern crate self as recollect;

mod collection;
mod error;
mod identity;
mod key;
mod observer;
mod persistence;
mod properties;
mod record;
mod schema;
mod scope;

pub use collection::{
    Collection, CollectionEvent, CollectionSlot, LoadTarget, WeakCollection, DEFAULT_SCOPE,
};
pub use error::{OrmError, Result};
pub use identity::{is_optimistic_key, next_optimistic_key, OPTIMISTIC_PREFIX};
pub use key::{loose_eq, PrimaryKey};
pub use observer::{Observers, Subscription};
pub use persistence::{InMemoryService, PersistenceService, PersistenceStrategy, ServiceStrategy};
pub use properties::{Properties, Property, Related};
pub use record::{KeyChange, Record, ToManyList};
pub use schema::{
    AssociationDescriptor, CollectionAccessor, PropertyKind, RecordDefinition, RecordType,
    RecordTypeBuilder, DEFAULT_PRIMARY_KEY,
};
pub use scope::Scope;

// Derive macro shares its name with the RecordType descriptor (macro namespace).
pub use recollect_macros::RecordType;
