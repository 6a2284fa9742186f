//! Synchronous publish/subscribe used for identity tracking.
//!
//! Callbacks run on the notifying call stack. A callback may subscribe or
//! dispose subscriptions (including its own) while a notification is in
//! flight; callbacks disposed mid-flight are not invoked.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct ObserverList<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

impl<T> ObserverList<T> {
    fn contains(&self, id: u64) -> bool {
        self.callbacks.iter().any(|(other, _)| *other == id)
    }
}

pub struct Observers<T> {
    list: Rc<RefCell<ObserverList<T>>>,
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            list: Rc::new(RefCell::new(ObserverList {
                next_id: 1,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Register a callback. It stays registered until the returned
    /// [`Subscription`] is disposed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = {
            let mut list = self.list.borrow_mut();
            let id = list.next_id;
            list.next_id += 1;
            list.callbacks.push((id, Rc::new(callback)));
            id
        };

        let weak: Weak<RefCell<ObserverList<T>>> = Rc::downgrade(&self.list);
        Subscription {
            dispose: Some(Box::new(move || {
                if let Some(list) = weak.upgrade() {
                    list.borrow_mut().callbacks.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    pub fn notify(&self, event: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = self
            .list
            .borrow()
            .callbacks
            .iter()
            .map(|(id, callback)| (*id, Rc::clone(callback)))
            .collect();

        for (id, callback) in snapshot {
            if self.list.borrow().contains(id) {
                callback(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.list.borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a registered callback. Dropping it unsubscribes.
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A subscription that is not attached to anything.
    pub fn empty() -> Self {
        Subscription { dispose: None }
    }

    pub fn dispose(mut self) {
        self.run_dispose();
    }

    fn run_dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}
