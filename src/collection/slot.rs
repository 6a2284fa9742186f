use std::cell::RefCell;
use std::rc::Rc;

use super::{Collection, WeakCollection};

/// Late-bound collection reference for association accessors.
///
/// Lets mutually associated types be declared before their collections exist:
/// hand `slot.accessor()` to the descriptor, then `bind` once the collection is
/// built. The slot holds the collection weakly.
#[derive(Clone, Default)]
pub struct CollectionSlot {
    cell: Rc<RefCell<WeakCollection>>,
}

impl CollectionSlot {
    pub fn new() -> Self {
        CollectionSlot::default()
    }

    pub fn bind(&self, collection: &Collection) {
        *self.cell.borrow_mut() = collection.downgrade();
    }

    pub fn get(&self) -> Option<Collection> {
        self.cell.borrow().upgrade()
    }

    pub fn accessor(&self) -> impl Fn() -> Option<Collection> + 'static {
        let slot = self.clone();
        move || slot.get()
    }
}
