//! Compiles operation intents into transport-ready request descriptors.
//!
//! Each operation kind has an intent type that collects what the caller
//! wants. Compiling is pure: it marshals keys and records, compiles every
//! expression of the request through one [`ExpressionBuilder`], applies the
//! configured limits and returns a [`RequestDescriptor`]. No transport is
//! involved, so every error here is raised before anything is sent.

pub mod batch;
pub mod item;
pub mod query;
pub mod transact;

pub use batch::{BatchGet, BatchWrite};
pub use item::{DeleteItem, GetItem, PutItem, UpdateItem};
pub use query::{Query, Scan};
pub use transact::{ConditionCheck, TransactWrite};

use dynamodel_model::{AttributeValue, Item, RequestDescriptor};

use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::expression::ExpressionBuilder;
use crate::marshal::{from_wire, to_wire_as};
use crate::schema::TableSchema;

/// An operation intent that compiles to one request descriptor.
pub trait Intent {
    /// Compile against the given limits and defaults.
    fn compile(&self, config: &MapperConfig) -> MapperResult<RequestDescriptor>;
}

/// Compiles intents under one [`MapperConfig`].
#[derive(Debug, Clone, Default)]
pub struct OperationCompiler {
    config: MapperConfig,
}

impl OperationCompiler {
    /// Create a compiler with the given configuration.
    #[must_use]
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Compile an intent.
    pub fn compile<I: Intent>(&self, intent: &I) -> MapperResult<RequestDescriptor> {
        let descriptor = intent.compile(&self.config)?;
        tracing::debug!(
            operation = %descriptor.operation,
            table = %descriptor.table_name,
            members = descriptor.requests.len(),
            names = descriptor.expression_attribute_names.len(),
            values = descriptor.expression_attribute_values.len(),
            "compiled request"
        );
        Ok(descriptor)
    }
}

/// Move the builder's placeholders onto the descriptor.
pub(crate) fn attach_placeholders(descriptor: &mut RequestDescriptor, builder: ExpressionBuilder<'_>) {
    let (names, values) = builder.finish().into_parts();
    descriptor.expression_attribute_names = names;
    descriptor.expression_attribute_values = values;
}

/// Check that `key` holds exactly the table's key attributes with their
/// declared kinds, and return it in canonical wire form.
///
/// Numeric key values are re-rendered, so `1.0` and `1` yield the same key.
pub(crate) fn canonical_key(schema: &TableSchema, key: &Item) -> MapperResult<Item> {
    let partition = schema.partition_key();
    let sort = schema.sort_key();
    let mut canonical = Item::with_capacity(key.len());
    for field in std::iter::once(partition).chain(sort) {
        let Some(value) = key.get(field.attribute_name()) else {
            return Err(MapperError::MissingKeyAttribute {
                table: schema.table_name().to_owned(),
                attribute: field.name().to_owned(),
            });
        };
        let native = from_wire(value, field.kind())?;
        canonical.insert(
            field.attribute_name().to_owned(),
            to_wire_as(&native, field.kind())?,
        );
    }
    if let Some(extra) = key.keys().find(|name| !canonical.contains_key(name.as_str())) {
        return Err(MapperError::SchemaConflict {
            table: schema.table_name().to_owned(),
            message: format!("key contains non-key attribute {extra}"),
        });
    }
    Ok(canonical)
}

/// Identity of one item across tables: table name plus key pairs sorted by
/// attribute name.
pub(crate) type KeyIdentity = (String, Vec<(String, AttributeValue)>);

pub(crate) fn key_identity(table: &str, key: &Item) -> KeyIdentity {
    let mut pairs: Vec<_> = key.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    (table.to_owned(), pairs)
}

/// Reject update actions that would modify a primary key attribute.
pub(crate) fn reject_key_updates(
    schema: &TableSchema,
    actions: &[crate::expression::UpdateAction],
) -> MapperResult<()> {
    let keys = schema.key_fields(None)?;
    match actions.iter().find(|a| keys.contains(a.path().root())) {
        Some(action) => Err(MapperError::invalid_expression(format!(
            "cannot update key attribute {}",
            action.path().root()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use crate::marshal::{AttributeKind, Record, Value};
    use crate::schema::{FieldSpec, IndexSpec, TableSchema};

    /// `userId` (String) partition key, `createdAt` (Number) sort key.
    pub fn events() -> Arc<TableSchema> {
        TableSchema::builder("events")
            .field("userId", AttributeKind::String)
            .field("createdAt", AttributeKind::Number)
            .field_spec(FieldSpec::new("status", AttributeKind::String).optional())
            .field_spec(FieldSpec::new("retryCount", AttributeKind::Integer).optional())
            .field_spec(FieldSpec::new("tags", AttributeKind::StringSet).optional())
            .partition_key("userId")
            .sort_key("createdAt")
            .index(IndexSpec::new("byStatus", "status").with_sort_key("createdAt"))
            .register()
            .unwrap()
    }

    /// `id` (String) partition key only.
    pub fn users() -> Arc<TableSchema> {
        TableSchema::builder("users")
            .field("id", AttributeKind::String)
            .field_spec(FieldSpec::new("name", AttributeKind::String).optional())
            .partition_key("id")
            .register()
            .unwrap()
    }

    pub fn event(user: &str, at: i64) -> Record {
        Record::from([
            ("userId".to_owned(), Value::from(user)),
            ("createdAt".to_owned(), Value::from(at)),
        ])
    }
}
