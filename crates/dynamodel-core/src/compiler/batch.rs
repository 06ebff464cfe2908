//! Batch get and batch write intents.
//!
//! A batch compiles to one envelope descriptor whose `requests` hold one
//! member descriptor per item, in caller order. Each member owns its own
//! placeholder table. Limits are checked before any member is compiled.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dynamodel_model::{Item, OperationKind, RequestDescriptor};

use crate::compiler::item::{DeleteItem, GetItem, PutItem, resolve_consistent_read};
use crate::compiler::{Intent, KeyIdentity, attach_placeholders, key_identity};
use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::expression::{ExpressionBuilder, Path};
use crate::marshal::Record;
use crate::schema::TableSchema;

/// Read many items, possibly from several tables.
#[derive(Debug, Clone, Default)]
pub struct BatchGet {
    gets: Vec<GetItem>,
    consistent_read: Option<bool>,
}

impl BatchGet {
    /// An empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the item with `key`.
    #[must_use]
    pub fn get(mut self, schema: Arc<TableSchema>, key: Item) -> Self {
        self.gets.push(GetItem::new(schema, key));
        self
    }

    /// Read the item with `key`, returning only `projection`.
    #[must_use]
    pub fn get_projected(
        mut self,
        schema: Arc<TableSchema>,
        key: Item,
        projection: impl IntoIterator<Item = Path>,
    ) -> Self {
        self.gets.push(GetItem::new(schema, key).projection(projection));
        self
    }

    /// Request strongly consistent reads.
    #[must_use]
    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = Some(consistent);
        self
    }

    /// Number of keys requested.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gets.len()
    }

    /// Returns `true` if no key was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gets.is_empty()
    }

    /// Schemas of the tables read, keyed by table name.
    #[must_use]
    pub fn schemas(&self) -> HashMap<String, Arc<TableSchema>> {
        self.gets
            .iter()
            .map(|g| (g.schema().table_name().to_owned(), Arc::clone(g.schema())))
            .collect()
    }
}

impl Intent for BatchGet {
    fn compile(&self, config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        check_size(
            OperationKind::BatchGetItem,
            self.gets.len(),
            config.max_batch_get_items,
        )?;

        let mut seen = HashSet::new();
        let mut envelope = RequestDescriptor::new(OperationKind::BatchGetItem, "");
        for get in &self.gets {
            let table = get.schema().table_name();
            if !seen.insert(key_identity(table, &get.target_key()?)) {
                return Err(MapperError::ConflictingBatchOperation {
                    table: table.to_owned(),
                    message: "key requested more than once".to_owned(),
                });
            }
            let mut builder = ExpressionBuilder::with_schema(get.schema());
            let mut member = get.descriptor(&mut builder)?;
            attach_placeholders(&mut member, builder);
            envelope.requests.push(member);
        }
        envelope.consistent_read = resolve_consistent_read(self.consistent_read, config);
        Ok(envelope)
    }
}

/// One member of a [`BatchWrite`].
#[derive(Debug, Clone)]
enum WriteMember {
    Put(PutItem),
    Delete(DeleteItem),
}

impl WriteMember {
    fn schema(&self) -> &Arc<TableSchema> {
        match self {
            Self::Put(put) => put.schema(),
            Self::Delete(delete) => delete.schema(),
        }
    }
}

/// Put and delete many items, possibly in several tables.
///
/// Batch writes carry no conditions. Every key may appear once: a put and a
/// delete on the same key, or two writes of the same kind, are rejected.
#[derive(Debug, Clone, Default)]
pub struct BatchWrite {
    members: Vec<WriteMember>,
}

impl BatchWrite {
    /// An empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `record`.
    #[must_use]
    pub fn put(mut self, schema: Arc<TableSchema>, record: Record) -> Self {
        self.members.push(WriteMember::Put(PutItem::new(schema, record)));
        self
    }

    /// Delete the item with `key`.
    #[must_use]
    pub fn delete(mut self, schema: Arc<TableSchema>, key: Item) -> Self {
        self.members.push(WriteMember::Delete(DeleteItem::new(schema, key)));
        self
    }

    /// Number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no write was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Schemas of the tables written, keyed by table name.
    #[must_use]
    pub fn schemas(&self) -> HashMap<String, Arc<TableSchema>> {
        self.members
            .iter()
            .map(|m| (m.schema().table_name().to_owned(), Arc::clone(m.schema())))
            .collect()
    }
}

impl Intent for BatchWrite {
    fn compile(&self, config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        check_size(
            OperationKind::BatchWriteItem,
            self.members.len(),
            config.max_batch_write_items,
        )?;

        let mut seen: HashMap<KeyIdentity, OperationKind> = HashMap::new();
        let mut envelope = RequestDescriptor::new(OperationKind::BatchWriteItem, "");
        for member in &self.members {
            let schema = member.schema();
            let mut builder = ExpressionBuilder::with_schema(schema);
            let (kind, key, mut descriptor) = match member {
                WriteMember::Put(put) => (
                    OperationKind::PutItem,
                    put.target_key()?,
                    put.descriptor(&mut builder)?,
                ),
                WriteMember::Delete(delete) => (
                    OperationKind::DeleteItem,
                    delete.target_key()?,
                    delete.descriptor(&mut builder)?,
                ),
            };
            if let Some(previous) = seen.insert(key_identity(schema.table_name(), &key), kind) {
                let message = if previous == kind {
                    format!("{kind} issued twice for the same key")
                } else {
                    "put and delete target the same key".to_owned()
                };
                return Err(MapperError::ConflictingBatchOperation {
                    table: schema.table_name().to_owned(),
                    message,
                });
            }
            attach_placeholders(&mut descriptor, builder);
            envelope.requests.push(descriptor);
        }
        Ok(envelope)
    }
}

/// Reject empty batches and batches over `limit`.
pub(crate) fn check_size(operation: OperationKind, count: usize, limit: usize) -> MapperResult<()> {
    if count == 0 {
        return Err(MapperError::invalid_expression(format!(
            "{operation} requires at least one item"
        )));
    }
    if count > limit {
        return Err(MapperError::BatchTooLarge {
            operation,
            limit,
            count,
        });
    }
    Ok(())
}
