use std::fmt;
use std::rc::Rc;

use crate::collection::Collection;

/// Lazily resolves the foreign collection of an association.
pub type CollectionAccessor = Rc<dyn Fn() -> Option<Collection>>;

/// Declaration of a to-one or to-many association field.
#[derive(Clone)]
pub struct AssociationDescriptor {
    foreign_collection: CollectionAccessor,
    foreign_key: Option<String>,
    merge_on_assign: bool,
}

impl AssociationDescriptor {
    pub fn new<F>(foreign_collection: F) -> Self
    where
        F: Fn() -> Option<Collection> + 'static,
    {
        Self {
            foreign_collection: Rc::new(foreign_collection),
            foreign_key: None,
            merge_on_assign: false,
        }
    }

    /// Name of the foreign-key attribute. When omitted, to-one associations
    /// use `{field}_{foreign primary key}` and to-many associations use
    /// `{lowercase own type}_{own primary key}`.
    pub fn foreign_key(mut self, attribute: impl Into<String>) -> Self {
        self.foreign_key = Some(attribute.into());
        self
    }

    /// Materialize assigned bags with `merge` rather than `set`, so a bag
    /// carrying a known key updates the existing record in place.
    pub fn merge_on_assign(mut self, merge: bool) -> Self {
        self.merge_on_assign = merge;
        self
    }

    pub fn foreign_collection(&self) -> Option<Collection> {
        (self.foreign_collection)()
    }

    pub fn foreign_key_attribute(&self) -> Option<&str> {
        self.foreign_key.as_deref()
    }

    pub fn merges_on_assign(&self) -> bool {
        self.merge_on_assign
    }
}

impl fmt::Debug for AssociationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociationDescriptor")
            .field("foreign_key", &self.foreign_key)
            .field("merge_on_assign", &self.merge_on_assign)
            .finish_non_exhaustive()
    }
}
