use serde_json::Value;

use super::{Collection, DEFAULT_SCOPE};
use crate::scope::Scope;

impl Collection {
    /// The scope registered under `name`, created on first use. Given params
    /// replace the scope's current ones.
    pub fn provide_scope(&self, name: &str, params: Option<Value>) -> Scope {
        let existing = self.inner.scopes.borrow().get(name).cloned();
        let scope = match existing {
            Some(scope) => scope,
            None => {
                let scope = Scope::new(self, name, Value::Null);
                self.inner
                    .scopes
                    .borrow_mut()
                    .insert(name.to_string(), scope.clone());
                scope
            }
        };
        if let Some(params) = params {
            scope.set_params(params);
        }
        scope
    }

    pub fn default_scope(&self) -> Scope {
        self.provide_scope(DEFAULT_SCOPE, None)
    }

    pub fn scope(&self, name: &str) -> Option<Scope> {
        self.inner.scopes.borrow().get(name).cloned()
    }

    /// Register an independently constructed scope, replacing any scope of the same name.
    pub fn register_scope(&self, scope: Scope) {
        self.inner
            .scopes
            .borrow_mut()
            .insert(scope.name().to_string(), scope);
    }

    pub fn remove_scope(&self, name: &str) -> Option<Scope> {
        self.inner.scopes.borrow_mut().shift_remove(name)
    }

    pub fn scope_names(&self) -> Vec<String> {
        self.inner.scopes.borrow().keys().cloned().collect()
    }
}
