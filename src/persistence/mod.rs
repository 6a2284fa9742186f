//! Persistence delegation.
//!
//! Collections never perform I/O themselves. They hand `load`, `save` and
//! `destroy` to a [`PersistenceStrategy`]. [`ServiceStrategy`] is a ready-made
//! strategy that moves raw documents between one [`PersistenceService`] and
//! the collection; [`InMemoryService`] is a document store for tests and demos.

mod in_memory;
mod service;
mod strategy;

pub use in_memory::InMemoryService;
pub use service::{PersistenceService, ServiceStrategy};
pub use strategy::PersistenceStrategy;
