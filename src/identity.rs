//! Identity Allocator: temporary keys for records that have no durable id yet.

use uuid::Uuid;

pub const OPTIMISTIC_PREFIX: &str = "optimistic_";

/// Allocate a fresh optimistic key, unique for the life of the process.
pub fn next_optimistic_key() -> String {
    format!("{}{}", OPTIMISTIC_PREFIX, Uuid::new_v4().simple())
}

pub fn is_optimistic_key(key: &str) -> bool {
    key.starts_with(OPTIMISTIC_PREFIX)
}
