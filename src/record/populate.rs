use serde_json::{Map, Value};

use super::Record;
use crate::schema::PropertyKind;

impl Record {
    /// JSON object of every own attribute.
    pub fn own_attributes(&self) -> Value {
        let state = self.inner.state.borrow();
        let object: Map<String, Value> = self
            .inner
            .record_type
            .own_attribute_names()
            .iter()
            .map(|name| {
                let value = state.attributes.get(name).cloned().unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect();
        Value::Object(object)
    }

    /// Fill a JSON graph with this record's values.
    ///
    /// The result always carries the own attributes. Each association named in
    /// `graph` is added too: `{"band": true}` embeds the band's own attributes
    /// and `{"band": {"albums": true}}` recurses. A dangling to-one becomes
    /// `null`, a to-many becomes an array.
    pub fn populate(&self, graph: &Value) -> Value {
        let mut object = match self.own_attributes() {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        let Value::Object(wanted) = graph else {
            return Value::Object(object);
        };

        for (name, nested) in wanted {
            match self.inner.record_type.property_kind(name) {
                Some(PropertyKind::ToOne) => {
                    let value = self
                        .one(name)
                        .map(|record| record.populate(nested))
                        .unwrap_or(Value::Null);
                    object.insert(name.clone(), value);
                }
                Some(PropertyKind::ToMany) => {
                    let members: Vec<Value> = self
                        .many(name)
                        .map(|list| list.iter().map(|record| record.populate(nested)).collect())
                        .unwrap_or_default();
                    object.insert(name.clone(), Value::Array(members));
                }
                _ => {}
            }
        }
        Value::Object(object)
    }
}
