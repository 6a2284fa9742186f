//! Change notifications for collection indexes.
//!
//! With the `emitter` feature, every index mutation is published through the
//! collection's `EventEmitter` as a JSON-encoded [`CollectionEvent`]. Listeners
//! run asynchronously on emitter threads, so they observe events after the
//! mutation has completed.

use serde::{Deserialize, Serialize};

use super::Collection;
use crate::key::PrimaryKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEvent {
    /// `"set"`, `"unset"`, `"rekey"` or `"clear"`.
    pub kind: String,
    pub record_type: String,
    pub key: Option<String>,
    pub previous_key: Option<String>,
}

impl CollectionEvent {
    pub const SET: &'static str = "set";
    pub const UNSET: &'static str = "unset";
    pub const REKEY: &'static str = "rekey";
    pub const CLEAR: &'static str = "clear";
}

impl Collection {
    pub(crate) fn notify_change(
        &self,
        kind: &str,
        key: Option<&PrimaryKey>,
        previous_key: Option<&PrimaryKey>,
    ) {
        #[cfg(feature = "emitter")]
        {
            let event = CollectionEvent {
                kind: kind.to_string(),
                record_type: self.record_type().name().to_string(),
                key: key.map(PrimaryKey::to_string),
                previous_key: previous_key.map(PrimaryKey::to_string),
            };
            match serde_json::to_string(&event) {
                Ok(payload) => {
                    self.inner.emitter.borrow_mut().emit(kind, payload);
                }
                Err(err) => tracing::warn!(error = %err, "failed to encode collection event"),
            }
        }
        #[cfg(not(feature = "emitter"))]
        {
            let _ = (kind, key, previous_key);
        }
    }

    /// Listen for one kind of index change (see [`CollectionEvent`]).
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&self, kind: &str, listener: F)
    where
        F: Fn(CollectionEvent) + Send + Sync + 'static,
    {
        self.inner
            .emitter
            .borrow_mut()
            .on(kind, move |payload: String| {
                match serde_json::from_str::<CollectionEvent>(&payload) {
                    Ok(event) => listener(event),
                    Err(err) => tracing::warn!(error = %err, "undecodable collection event"),
                }
            });
    }
}
