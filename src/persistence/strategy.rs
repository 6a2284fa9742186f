use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::record::Record;
use crate::scope::Scope;

/// The contract a collection delegates persistence to.
///
/// Implementations own the I/O and any retry, timeout or cancellation policy.
/// They are expected to write loaded records into `scope.collection()` and to
/// maintain the scope's key list.
#[async_trait(?Send)]
pub trait PersistenceStrategy {
    async fn load_many(&self, params: &Value, scope: &Scope) -> Result<Vec<Record>>;

    async fn load_one(&self, params: &Value, record: &Record, scope: &Scope) -> Result<Record>;

    async fn save_one(&self, params: &Value, record: &Record, scope: &Scope) -> Result<Record>;

    async fn destroy_one(&self, params: &Value, record: &Record, scope: &Scope) -> Result<()>;
}
