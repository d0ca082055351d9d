//! Moves values between an entity and its bound [`Record`].

use indexmap::IndexMap;

use crate::{selector::read_property, Entity, Error, Record, Value};

/// The read-only view of a bound record's fields, keyed by property name.
pub type FieldMap = IndexMap<String, Value>;

/// Copies every mapped property of `entity` into `record`.
///
/// Nothing is written unless every property encodes successfully.
pub fn serialize_into<E: Entity>(entity: &E, record: &mut Record) -> Result<(), Error> {
    let mut values = Vec::new();
    for property in E::properties() {
        values.push((property.name, read_property(entity, property.name)?));
    }

    for (name, value) in values {
        record.set(name, value);
    }
    Ok(())
}

/// Builds the field map of `record`.
///
/// Schema fields the record does not carry read as `Null`; anything neither
/// in the schema nor in the record is absent from the map.
pub fn materialize(record: &Record, schema: &[String]) -> FieldMap {
    let mut fields = FieldMap::with_capacity(schema.len() + record.fields().len());

    for field in schema {
        let value = match field.as_str() {
            "id" => record.id().map_or(Value::Null, Value::Int),
            _ => record.get(field).cloned().unwrap_or(Value::Null),
        };
        fields.insert(field.clone(), value);
    }

    if let Some(id) = record.id() {
        fields.insert("id".to_string(), Value::Int(id));
    }

    for (field, value) in record.fields() {
        fields.insert(field.clone(), value.clone());
    }

    fields
}
