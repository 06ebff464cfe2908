//! Whole-record marshaling through a schema.

use std::collections::BTreeMap;

use dynamodel_model::{AttributeValue, Item};

use crate::error::{MapperError, MapperResult};
use crate::marshal::value::{Value, from_wire, from_wire_inferred, to_wire, to_wire_as};
use crate::schema::TableSchema;

/// A native record: logical field name to value.
pub type Record = BTreeMap<String, Value>;

/// Marshal a record to a wire item.
///
/// Declared fields are written under their wire names and checked against
/// their declared kinds. A field that is absent or null is written as `NULL`
/// when nullable, rejected when required, and omitted otherwise. Fields the
/// schema does not declare are written under their own names; such a name
/// may not equal a declared wire name.
pub fn marshal_record(schema: &TableSchema, record: &Record) -> MapperResult<Item> {
    let mut item = Item::with_capacity(record.len());

    for field in schema.fields() {
        match record.get(field.name()) {
            Some(value) if !value.is_null() => {
                item.insert(
                    field.attribute_name().to_owned(),
                    to_wire_as(value, field.kind())?,
                );
            }
            _ if field.is_nullable() => {
                item.insert(field.attribute_name().to_owned(), AttributeValue::Null);
            }
            _ if field.is_required() => {
                return Err(MapperError::MissingAttribute {
                    field: field.name().to_owned(),
                });
            }
            _ => {}
        }
    }

    for (name, value) in record {
        if schema.field(name).is_some() {
            continue;
        }
        if let Some(field) = schema.field_by_attribute(name) {
            return Err(name_collision(schema, name, field.name()));
        }
        item.insert(name.clone(), to_wire(value)?);
    }

    Ok(item)
}

/// Unmarshal a wire item to a record.
///
/// Required fields are not enforced here, since projected reads return
/// partial items. `NULL` is accepted for any declared field. An undeclared
/// attribute named like a declared logical field is rejected.
pub fn unmarshal_item(schema: &TableSchema, item: &Item) -> MapperResult<Record> {
    item.iter()
        .map(|(attribute, value)| match schema.field_by_attribute(attribute) {
            Some(field) => {
                let native = match value {
                    AttributeValue::Null => Value::Null,
                    _ => from_wire(value, field.kind())?,
                };
                Ok((field.name().to_owned(), native))
            }
            None => match schema.field(attribute) {
                Some(field) => Err(name_collision(schema, attribute, field.attribute_name())),
                None => Ok((attribute.clone(), from_wire_inferred(value)?)),
            },
        })
        .collect()
}

fn name_collision(schema: &TableSchema, name: &str, declared: &str) -> MapperError {
    MapperError::SchemaConflict {
        table: schema.table_name().to_owned(),
        message: format!("undeclared attribute {name} collides with declared field {declared}"),
    }
}
