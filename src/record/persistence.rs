use std::time::SystemTime;

use serde_json::Value;

use super::Record;
use crate::collection::{Collection, DEFAULT_SCOPE};
use crate::error::Result;

/// Load bookkeeping and persistence shortcuts through the owning collection.
impl Record {
    /// Name of the service currently loading this record.
    pub fn loading_from(&self) -> Option<String> {
        self.inner.state.borrow().loading_from.clone()
    }

    pub fn set_loading_from(&self, service: Option<String>) {
        self.inner.state.borrow_mut().loading_from = service;
    }

    pub fn last_loaded_from(&self) -> Option<String> {
        self.inner.state.borrow().last_loaded_from.clone()
    }

    pub fn last_loaded_at(&self) -> Option<SystemTime> {
        self.inner.state.borrow().last_loaded_at
    }

    /// Record a completed load from `service`.
    pub fn mark_loaded(&self, service: &str) {
        let mut state = self.inner.state.borrow_mut();
        state.loading_from = None;
        state.last_loaded_from = Some(service.to_string());
        state.last_loaded_at = Some(SystemTime::now());
    }

    pub async fn load(&self, params: Value) -> Result<Record> {
        self.owner()?.load_one(self, params, DEFAULT_SCOPE).await
    }

    pub async fn save(&self, params: Value) -> Result<Record> {
        self.owner()?.save_one(self, params, DEFAULT_SCOPE).await
    }

    pub async fn destroy(&self, params: Value) -> Result<()> {
        self.owner()?.destroy_one(self, params, DEFAULT_SCOPE).await
    }

    fn owner(&self) -> Result<Collection> {
        self.collection().ok_or_else(|| self.owner_error())
    }
}
