//! Scopes - named, ordered key lists over one collection.
//!
//! A scope never holds records, only keys. [`Scope::items`] resolves them
//! against the collection and skips keys that are not indexed (any more).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::SystemTime;

use serde_json::Value;

use crate::collection::{Collection, WeakCollection};
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::record::Record;

#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    collection: WeakCollection,
    name: String,
    state: RefCell<ScopeState>,
}

#[derive(Default)]
struct ScopeState {
    item_primary_keys: Vec<PrimaryKey>,
    params: Value,
    loading_from: Option<String>,
    last_loaded_from: Option<String>,
    last_loaded_at: Option<SystemTime>,
}

impl Scope {
    /// A scope over `collection`. It is not registered; see
    /// [`Collection::provide_scope`] and [`Collection::register_scope`].
    pub fn new(collection: &Collection, name: impl Into<String>, params: Value) -> Self {
        Scope {
            inner: Rc::new(ScopeInner {
                collection: collection.downgrade(),
                name: name.into(),
                state: RefCell::new(ScopeState {
                    params,
                    ..ScopeState::default()
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn collection(&self) -> Result<Collection> {
        self.inner
            .collection
            .upgrade()
            .ok_or_else(|| OrmError::DetachedScope {
                scope: self.inner.name.clone(),
            })
    }

    /// Parameters of the last load (or as last assigned).
    pub fn params(&self) -> Value {
        self.inner.state.borrow().params.clone()
    }

    pub fn set_params(&self, params: Value) {
        self.inner.state.borrow_mut().params = params;
    }

    /// Load through the collection's persistence strategy. `None` reuses the
    /// current params.
    pub async fn load(&self, params: Option<Value>) -> Result<Vec<Record>> {
        let collection = self.collection()?;
        let params = params.unwrap_or_else(|| self.params());
        collection.register_scope(self.clone());
        collection.load(params, self.name()).await
    }

    pub fn item_primary_keys(&self) -> Vec<PrimaryKey> {
        self.inner.state.borrow().item_primary_keys.clone()
    }

    pub fn set_item_primary_keys(&self, keys: Vec<PrimaryKey>) {
        self.inner.state.borrow_mut().item_primary_keys = keys;
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().item_primary_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loose membership test.
    pub fn has_key(&self, key: &PrimaryKey) -> bool {
        self.inner
            .state
            .borrow()
            .item_primary_keys
            .iter()
            .any(|existing| existing.loose_eq(key))
    }

    /// Append a key unless already present. Returns whether it was added.
    pub fn add_key(&self, key: PrimaryKey) -> bool {
        if self.has_key(&key) {
            return false;
        }
        self.inner.state.borrow_mut().item_primary_keys.push(key);
        true
    }

    /// Swap `old` for `new` in place, e.g. after an optimistic key was promoted.
    pub fn replace_key(&self, old: &PrimaryKey, new: PrimaryKey) -> bool {
        let mut state = self.inner.state.borrow_mut();
        match state
            .item_primary_keys
            .iter()
            .position(|existing| existing.loose_eq(old))
        {
            Some(position) => {
                state.item_primary_keys[position] = new;
                true
            }
            None => false,
        }
    }

    pub fn remove_key(&self, key: &PrimaryKey) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let before = state.item_primary_keys.len();
        state.item_primary_keys.retain(|existing| !existing.loose_eq(key));
        state.item_primary_keys.len() != before
    }

    /// Records for the listed keys, in list order. Unknown keys are skipped.
    pub fn items(&self) -> Vec<Record> {
        let Ok(collection) = self.collection() else {
            return Vec::new();
        };
        self.item_primary_keys()
            .iter()
            .filter_map(|key| collection.get_loose(key))
            .collect()
    }

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

    pub fn mark_loaded(&self, service: &str) {
        let mut state = self.inner.state.borrow_mut();
        state.loading_from = None;
        state.last_loaded_from = Some(service.to_string());
        state.last_loaded_at = Some(SystemTime::now());
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Scope")
            .field("name", &self.inner.name)
            .field("params", &state.params)
            .field("item_primary_keys", &state.item_primary_keys)
            .field("last_loaded_from", &state.last_loaded_from)
            .finish()
    }
}
