use std::fmt;

/// Errors raised by collections, records, scopes and persistence delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrmError {
    /// A record was constructed against a collection that is gone or holds another type.
    InvalidOwner { record_type: String },
    /// An association's foreign collection accessor did not yield a live collection.
    InvalidAssociationTarget {
        record_type: String,
        association: String,
    },
    /// A strict merge was given a key that is neither an attribute nor an association.
    UndeclaredProperty {
        record_type: String,
        property: String,
    },
    /// An association was assigned a value of the wrong shape.
    InvalidAssociationValue {
        record_type: String,
        association: String,
    },
    /// A load/save/destroy was attempted before a strategy was assigned.
    NoPersistenceStrategy { record_type: String },
    /// A primary-key field was assigned something that cannot be a key.
    InvalidKeyValue { record_type: String, value: String },
    /// A to-many list was indexed past its end.
    IndexOutOfBounds {
        association: String,
        index: usize,
        len: usize,
    },
    /// A scope outlived its collection.
    DetachedScope { scope: String },
    /// Failure reported by a persistence collaborator.
    Persistence(String),
    LockPoisoned(&'static str),
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::InvalidOwner { record_type } => write!(
                f,
                "a valid collection is required to create a {} record",
                record_type
            ),
            OrmError::InvalidAssociationTarget {
                record_type,
                association,
            } => write!(
                f,
                "foreign collection not valid for association {} on {}",
                association, record_type
            ),
            OrmError::UndeclaredProperty {
                record_type,
                property,
            } => write!(
                f,
                "{} is not a declared property of {}",
                property, record_type
            ),
            OrmError::InvalidAssociationValue {
                record_type,
                association,
            } => write!(
                f,
                "invalid value assigned to association {} on {}",
                association, record_type
            ),
            OrmError::NoPersistenceStrategy { record_type } => write!(
                f,
                "no persistence strategy assigned to the {} collection",
                record_type
            ),
            OrmError::InvalidKeyValue { record_type, value } => {
                write!(f, "{} is not a valid primary key for {}", value, record_type)
            }
            OrmError::IndexOutOfBounds {
                association,
                index,
                len,
            } => write!(
                f,
                "index {} out of bounds for association {} (len {})",
                index, association, len
            ),
            OrmError::DetachedScope { scope } => {
                write!(f, "scope {} is no longer attached to a collection", scope)
            }
            OrmError::Persistence(message) => write!(f, "persistence error: {}", message),
            OrmError::LockPoisoned(operation) => {
                write!(f, "lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for OrmError {}

pub type Result<T> = std::result::Result<T, OrmError>;
