//! Static record type declarations.
//!
//! A [`RecordType`] is built once per concrete type, either by hand through
//! [`RecordType::builder`] or with `#[derive(RecordType)]`, and is then
//! shared by every record and collection of that type.
//!
//! ```ignore
//! let album = RecordType::builder("Album")
//!     .attributes(["name", "band_id"])
//!     .to_one("band", AssociationDescriptor::new(bands.accessor()).foreign_key("band_id"))
//!     .to_many("tracks", AssociationDescriptor::new(tracks.accessor()))
//!     .build();
//! ```

mod association;
mod record_type;

pub use association::{AssociationDescriptor, CollectionAccessor};
pub use record_type::{
    PropertyKind, RecordDefinition, RecordType, RecordTypeBuilder, DEFAULT_PRIMARY_KEY,
};
