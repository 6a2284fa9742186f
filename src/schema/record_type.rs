use std::collections::HashMap;
use std::rc::Rc;

use super::AssociationDescriptor;

pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// What a declared property name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Attribute,
    ToOne,
    ToMany,
}

/// Immutable description of one concrete record type.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    primary_key: String,
    own_attributes: Vec<String>,
    to_one: Vec<(String, AssociationDescriptor)>,
    to_many: Vec<(String, AssociationDescriptor)>,
    property_names: Vec<String>,
    kinds: HashMap<String, PropertyKind>,
}

/// Types that carry their own declaration, usually via `#[derive(RecordType)]`.
pub trait RecordDefinition {
    fn record_type() -> Rc<RecordType>;
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            own_attributes: Vec::new(),
            to_one: Vec::new(),
            to_many: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn own_attribute_names(&self) -> &[String] {
        &self.own_attributes
    }

    pub fn to_one_associations(&self) -> &[(String, AssociationDescriptor)] {
        &self.to_one
    }

    pub fn to_many_associations(&self) -> &[(String, AssociationDescriptor)] {
        &self.to_many
    }

    pub fn to_one_names(&self) -> Vec<&str> {
        self.to_one.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn to_many_names(&self) -> Vec<&str> {
        self.to_many.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Own attributes, then to-one names, then to-many names.
    pub fn property_names(&self) -> &[String] {
        &self.property_names
    }

    pub fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        self.kinds.get(name).copied()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key == name
    }
}

pub struct RecordTypeBuilder {
    name: String,
    primary_key: String,
    own_attributes: Vec<String>,
    to_one: Vec<(String, AssociationDescriptor)>,
    to_many: Vec<(String, AssociationDescriptor)>,
}

impl RecordTypeBuilder {
    /// Defaults to `"id"`. The field is always declared as an own attribute.
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.own_attributes.contains(&name) {
            self.own_attributes.push(name);
        }
        self
    }

    pub fn attributes<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |builder, name| builder.attribute(name))
    }

    pub fn to_one(mut self, name: impl Into<String>, descriptor: AssociationDescriptor) -> Self {
        upsert(&mut self.to_one, name.into(), descriptor);
        self
    }

    pub fn to_many(mut self, name: impl Into<String>, descriptor: AssociationDescriptor) -> Self {
        upsert(&mut self.to_many, name.into(), descriptor);
        self
    }

    pub fn build(self) -> Rc<RecordType> {
        let mut own_attributes = self.own_attributes;
        if !own_attributes.contains(&self.primary_key) {
            own_attributes.insert(0, self.primary_key.clone());
        }

        let mut property_names = Vec::new();
        let mut kinds = HashMap::new();
        let declared = own_attributes
            .iter()
            .map(|name| (name, PropertyKind::Attribute))
            .chain(self.to_one.iter().map(|(name, _)| (name, PropertyKind::ToOne)))
            .chain(self.to_many.iter().map(|(name, _)| (name, PropertyKind::ToMany)));
        for (name, kind) in declared {
            if kinds.insert(name.clone(), kind).is_none() {
                property_names.push(name.clone());
            }
        }

        Rc::new(RecordType {
            name: self.name,
            primary_key: self.primary_key,
            own_attributes,
            to_one: self.to_one,
            to_many: self.to_many,
            property_names,
            kinds,
        })
    }
}

fn upsert(
    associations: &mut Vec<(String, AssociationDescriptor)>,
    name: String,
    descriptor: AssociationDescriptor,
) {
    match associations.iter_mut().find(|(existing, _)| *existing == name) {
        Some((_, slot)) => *slot = descriptor,
        None => associations.push((name, descriptor)),
    }
}
