use serde_json::Value;

use std::rc::Rc;

use super::Record;
use crate::error::{OrmError, Result};
use crate::key::PrimaryKey;
use crate::properties::{Properties, Property};
use crate::schema::{PropertyKind, RecordType};

/// Where a validated property gets written.
#[derive(Clone, Copy)]
enum Target {
    Attribute,
    ToOne,
    ToMany,
}

impl Record {
    /// Assign every key of the bag. Undeclared keys fail with `UndeclaredProperty`.
    pub fn merge_properties(&self, properties: Properties) -> Result<()> {
        self.merge_with(properties, true)
    }

    /// Like [`merge_properties`](Self::merge_properties), but undeclared keys
    /// are skipped.
    pub fn merge_properties_lenient(&self, properties: Properties) -> Result<()> {
        self.merge_with(properties, false)
    }

    /// Assign every declared property. Absent attributes and to-one
    /// associations are cleared; absent to-many associations and the primary
    /// key are left alone. Undeclared keys are skipped.
    pub fn hydrate_with(&self, properties: Properties) -> Result<()> {
        let mut properties = properties;
        let record_type = Rc::clone(&self.inner.record_type);
        for name in record_type.property_names() {
            if properties.contains(name) || record_type.is_primary_key(name) {
                continue;
            }
            match record_type.property_kind(name) {
                Some(PropertyKind::Attribute) | Some(PropertyKind::ToOne) => {
                    properties.insert(name.clone(), Value::Null);
                }
                _ => {}
            }
        }
        self.merge_with(properties, false)
    }

    /// Validates the whole bag, nested association bags included, before
    /// writing anything. The primary key is written last.
    pub(crate) fn merge_with(&self, properties: Properties, strict: bool) -> Result<()> {
        let mut plan = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            if let Some(target) = self.validate(&name, &value, strict)? {
                plan.push((name, value, target));
            }
        }
        let record_type = Rc::clone(&self.inner.record_type);
        plan.sort_by_key(|(name, _, _)| record_type.is_primary_key(name));

        for (name, value, target) in plan {
            self.assign(&name, value, target, strict)?;
        }
        Ok(())
    }

    pub(super) fn merge_with_one(&self, name: &str, value: Property, strict: bool) -> Result<()> {
        match self.validate(name, &value, strict)? {
            Some(target) => self.assign(name, value, target, strict),
            None => Ok(()),
        }
    }

    /// `Ok(None)` means the key is undeclared and skipped.
    fn validate(&self, name: &str, value: &Property, strict: bool) -> Result<Option<Target>> {
        let record_type = &self.inner.record_type;
        let target = classify(record_type, self.is_foreign_key(name), name, value, strict)?;

        let wiring = match target {
            Some(Target::ToOne) => self.inner.to_one.iter().find(|w| w.name == name),
            Some(Target::ToMany) => self.inner.to_many.iter().find(|w| w.name == name),
            _ => None,
        };
        if let Some(wiring) = wiring {
            let foreign = wiring.foreign.upgrade().ok_or_else(|| {
                OrmError::InvalidAssociationTarget {
                    record_type: record_type.name().to_string(),
                    association: name.to_string(),
                }
            })?;
            validate_related(foreign.record_type(), value, strict)?;
        }
        Ok(target)
    }

    fn assign(&self, name: &str, value: Property, target: Target, strict: bool) -> Result<()> {
        match target {
            Target::Attribute => self.write_attribute(name, value.into_value()),
            Target::ToOne => {
                let related = value.into_to_one().map_err(|_| self.invalid_value(name))?;
                self.assign_one_with(name, related, strict)
            }
            Target::ToMany => {
                let related = value.into_to_many().map_err(|_| self.invalid_value(name))?;
                self.assign_many_with(name, related, strict)
            }
        }
    }

    pub(super) fn invalid_value(&self, association: &str) -> OrmError {
        invalid_value(&self.inner.record_type, association)
    }
}

fn invalid_value(record_type: &RecordType, association: &str) -> OrmError {
    OrmError::InvalidAssociationValue {
        record_type: record_type.name().to_string(),
        association: association.to_string(),
    }
}

/// Decide where one property of a `record_type` bag goes and check its shape.
fn classify(
    record_type: &RecordType,
    is_foreign_key: bool,
    name: &str,
    value: &Property,
    strict: bool,
) -> Result<Option<Target>> {
    let target = match record_type.property_kind(name) {
        Some(PropertyKind::Attribute) => Target::Attribute,
        Some(PropertyKind::ToOne) => Target::ToOne,
        Some(PropertyKind::ToMany) => Target::ToMany,
        None if is_foreign_key => Target::Attribute,
        None if strict => {
            return Err(OrmError::UndeclaredProperty {
                record_type: record_type.name().to_string(),
                property: name.to_string(),
            })
        }
        None => return Ok(None),
    };

    let fits = match target {
        Target::Attribute if record_type.is_primary_key(name) => match value {
            Property::Value(raw) => is_key_value(raw),
            Property::Record(_) => true,
            _ => false,
        },
        Target::Attribute => true,
        Target::ToOne => value.fits_to_one(),
        Target::ToMany => value.fits_to_many(),
    };
    if fits {
        return Ok(Some(target));
    }

    Err(match target {
        Target::Attribute => OrmError::InvalidKeyValue {
            record_type: record_type.name().to_string(),
            value: value.clone().into_value().to_string(),
        },
        _ => invalid_value(record_type, name),
    })
}

/// `Null` and `""` clear a key, anything else must convert to one.
fn is_key_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) if s.is_empty() => true,
        other => PrimaryKey::from_value(other).is_some(),
    }
}

/// Validate the bags an association value would materialize in the foreign
/// collection of type `record_type`.
fn validate_related(record_type: &RecordType, value: &Property, strict: bool) -> Result<()> {
    match value {
        Property::Properties(properties) => validate_bag(record_type, properties, strict),
        Property::Value(Value::Object(map)) => {
            validate_bag(record_type, &Properties::from(map.clone()), strict)
        }
        Property::Value(Value::Array(items)) => items.iter().try_for_each(|item| {
            validate_related(record_type, &Property::Value(item.clone()), strict)
        }),
        Property::List(items) => items
            .iter()
            .try_for_each(|item| validate_related(record_type, item, strict)),
        _ => Ok(()),
    }
}

fn validate_bag(record_type: &RecordType, properties: &Properties, strict: bool) -> Result<()> {
    let foreign_keys = to_one_foreign_keys(record_type)?;
    for (name, value) in properties.iter() {
        let is_foreign_key = foreign_keys.iter().any(|key| key == name);
        let nested = match classify(record_type, is_foreign_key, name, value, strict)? {
            Some(Target::ToOne) => record_type.to_one_associations(),
            Some(Target::ToMany) => record_type.to_many_associations(),
            _ => continue,
        };
        let Some((_, descriptor)) = nested.iter().find(|(association, _)| association == name)
        else {
            continue;
        };
        let foreign = descriptor
            .foreign_collection()
            .ok_or_else(|| OrmError::InvalidAssociationTarget {
                record_type: record_type.name().to_string(),
                association: name.to_string(),
            })?;
        validate_related(foreign.record_type(), value, strict)?;
    }
    Ok(())
}

/// Foreign-key attribute names of every to-one association, defaults resolved.
fn to_one_foreign_keys(record_type: &RecordType) -> Result<Vec<String>> {
    record_type
        .to_one_associations()
        .iter()
        .map(|(name, descriptor)| match descriptor.foreign_key_attribute() {
            Some(attribute) => Ok(attribute.to_string()),
            None => descriptor
                .foreign_collection()
                .map(|foreign| format!("{}_{}", name, foreign.record_type().primary_key()))
                .ok_or_else(|| OrmError::InvalidAssociationTarget {
                    record_type: record_type.name().to_string(),
                    association: name.clone(),
                }),
        })
        .collect()
}
