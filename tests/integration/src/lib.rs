//! Integration tests for the dynamodel mapper.
//!
//! The tests drive [`Mapper`] end to end against [`MemoryTransport`], a small
//! in-process store that understands the descriptors the compiler emits.
//! It covers keys, pagination, batches and the simple update and condition
//! forms used here; it is not a general expression evaluator.
//!
//! Run them with:
//! ```text
//! cargo test -p dynamodel-integration
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Once};

use anyhow::{Context, bail};
use dynamodel_core::{
    AttributeKind, FieldSpec, IndexSpec, Mapper, TableSchema, Transport, TransportFuture,
};
use dynamodel_model::{
    AttributeValue, Item, OperationKind, RawResponse, RequestDescriptor, WriteRequest,
};
use parking_lot::Mutex;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

#[derive(Debug, Default)]
struct TableData {
    key_attributes: Vec<String>,
    items: Vec<Item>,
}

impl TableData {
    fn key_of(&self, item: &Item) -> Item {
        self.key_attributes
            .iter()
            .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    fn position(&self, key: &Item) -> Option<usize> {
        self.items.iter().position(|item| &self.key_of(item) == key)
    }

    fn upsert(&mut self, item: Item) {
        let key = self.key_of(&item);
        match self.position(&key) {
            Some(i) => self.items[i] = item,
            None => self.items.push(item),
        }
    }

    fn remove(&mut self, key: &Item) {
        if let Some(i) = self.position(key) {
            self.items.remove(i);
        }
    }

    /// One page of `items` starting after `start`.
    fn page(&self, items: Vec<Item>, start: Option<&Item>, limit: Option<u32>) -> RawResponse {
        let skip = start
            .and_then(|key| items.iter().position(|item| &self.key_of(item) == key))
            .map_or(0, |i| i + 1);
        let remaining: Vec<Item> = items.into_iter().skip(skip).collect();
        let take = limit.map_or(remaining.len(), |l| {
            usize::try_from(l).map_or(remaining.len(), |l| l.min(remaining.len()))
        });
        let page: Vec<Item> = remaining[..take].to_vec();
        let last_evaluated_key = (take < remaining.len())
            .then(|| page.last().map(|item| self.key_of(item)))
            .flatten();
        let count = u32::try_from(page.len()).unwrap_or(u32::MAX);
        RawResponse {
            items: page,
            last_evaluated_key,
            count,
            scanned_count: count,
            ..RawResponse::default()
        }
    }
}

/// An in-memory store speaking the request descriptor protocol.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    tables: Mutex<HashMap<String, TableData>>,
    sent: Mutex<Vec<RequestDescriptor>>,
    batch_write_capacity: Mutex<Option<usize>>,
}

impl MemoryTransport {
    /// Create a store with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table keyed by the given wire attribute names.
    #[must_use]
    pub fn with_table(self, name: &str, key_attributes: &[&str]) -> Self {
        self.tables.lock().insert(
            name.to_owned(),
            TableData {
                key_attributes: key_attributes.iter().map(|s| (*s).to_owned()).collect(),
                items: Vec::new(),
            },
        );
        self
    }

    /// Process at most `capacity` writes per batch and report the rest as
    /// unprocessed.
    pub fn limit_batch_writes(&self, capacity: usize) {
        *self.batch_write_capacity.lock() = Some(capacity);
    }

    /// Every request received, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<RequestDescriptor> {
        self.sent.lock().clone()
    }

    /// Items currently stored in `table`.
    #[must_use]
    pub fn items(&self, table: &str) -> Vec<Item> {
        self.tables
            .lock()
            .get(table)
            .map(|t| t.items.clone())
            .unwrap_or_default()
    }

    fn handle(&self, request: &RequestDescriptor) -> anyhow::Result<RawResponse> {
        let mut tables = self.tables.lock();
        match request.operation {
            OperationKind::BatchGetItem => {
                let mut response = RawResponse::default();
                for member in &request.requests {
                    let table = table_mut(&mut tables, &member.table_name)?;
                    let key = member.key.as_ref().context("missing key")?;
                    if let Some(i) = table.position(key) {
                        response
                            .responses
                            .entry(member.table_name.clone())
                            .or_default()
                            .push(table.items[i].clone());
                    }
                }
                Ok(response)
            }
            OperationKind::BatchWriteItem => {
                let capacity = (*self.batch_write_capacity.lock()).unwrap_or(usize::MAX);
                let mut response = RawResponse::default();
                for (i, member) in request.requests.iter().enumerate() {
                    if i >= capacity {
                        let write = match (&member.item, &member.key) {
                            (Some(item), _) => WriteRequest::put(item.clone()),
                            (None, Some(key)) => WriteRequest::delete(key.clone()),
                            (None, None) => bail!("batch member without item or key"),
                        };
                        response
                            .unprocessed_items
                            .entry(member.table_name.clone())
                            .or_default()
                            .push(write);
                        continue;
                    }
                    apply_single(&mut tables, member)?;
                }
                Ok(response)
            }
            OperationKind::TransactWriteItems => {
                for member in &request.requests {
                    check_condition(&mut tables, member)?;
                }
                for member in &request.requests {
                    if member.operation != OperationKind::ConditionCheck {
                        apply_single(&mut tables, member)?;
                    }
                }
                Ok(RawResponse::default())
            }
            _ => {
                check_condition(&mut tables, request)?;
                apply_single(&mut tables, request)
            }
        }
    }
}

impl Transport for MemoryTransport {
    fn execute(&self, request: RequestDescriptor) -> TransportFuture {
        let result = self.handle(&request);
        self.sent.lock().push(request);
        Box::pin(async move { result })
    }
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, TableData>,
    name: &str,
) -> anyhow::Result<&'a mut TableData> {
    tables
        .get_mut(name)
        .with_context(|| format!("ResourceNotFoundException: table {name}"))
}

fn name(request: &RequestDescriptor, placeholder: &str) -> anyhow::Result<String> {
    request
        .expression_attribute_names
        .get(placeholder)
        .cloned()
        .with_context(|| format!("unknown name placeholder {placeholder}"))
}

fn value(request: &RequestDescriptor, placeholder: &str) -> anyhow::Result<AttributeValue> {
    request
        .expression_attribute_values
        .get(placeholder)
        .cloned()
        .with_context(|| format!("unknown value placeholder {placeholder}"))
}

/// Evaluate the leading `attribute_exists`/`attribute_not_exists` of a
/// condition. Other condition forms are accepted as true.
fn check_condition(
    tables: &mut HashMap<String, TableData>,
    request: &RequestDescriptor,
) -> anyhow::Result<()> {
    let Some(condition) = request.condition_expression.as_deref() else {
        return Ok(());
    };
    let table = table_mut(tables, &request.table_name)?;
    let key = match (&request.key, &request.item) {
        (Some(key), _) => key.clone(),
        (None, Some(item)) => table.key_of(item),
        (None, None) => bail!("conditional request without key"),
    };
    let exists = table.position(&key).is_some();
    if (condition.starts_with("attribute_not_exists(") && exists)
        || (condition.starts_with("attribute_exists(") && !exists)
    {
        bail!("ConditionalCheckFailedException: {condition}");
    }
    Ok(())
}

fn apply_single(
    tables: &mut HashMap<String, TableData>,
    request: &RequestDescriptor,
) -> anyhow::Result<RawResponse> {
    let table = table_mut(tables, &request.table_name)?;
    match request.operation {
        OperationKind::PutItem => {
            table.upsert(request.item.clone().context("put without item")?);
            Ok(RawResponse::default())
        }
        OperationKind::DeleteItem => {
            table.remove(request.key.as_ref().context("delete without key")?);
            Ok(RawResponse::default())
        }
        OperationKind::GetItem => {
            let key = request.key.as_ref().context("get without key")?;
            Ok(RawResponse {
                item: table.position(key).map(|i| table.items[i].clone()),
                ..RawResponse::default()
            })
        }
        OperationKind::UpdateItem => {
            let key = request.key.clone().context("update without key")?;
            let mut item = table
                .position(&key)
                .map_or_else(|| key.clone(), |i| table.items[i].clone());
            let expression = request.update_expression.as_deref().unwrap_or_default();
            let Some(assignments) = expression.strip_prefix("SET ") else {
                bail!("unsupported update expression: {expression}");
            };
            for assignment in assignments.split(", ") {
                let Some((path, operand)) = assignment.split_once(" = ") else {
                    bail!("unsupported assignment: {assignment}");
                };
                item.insert(name(request, path)?, value(request, operand)?);
            }
            table.upsert(item);
            Ok(RawResponse::default())
        }
        OperationKind::Query => {
            // The partition key equality is always the first key condition.
            let partition = name(request, "#n0")?;
            let expected = value(request, ":v0")?;
            let mut matching: Vec<Item> = table
                .items
                .iter()
                .filter(|item| item.get(&partition) == Some(&expected))
                .cloned()
                .collect();
            if request.scan_index_forward == Some(false) {
                matching.reverse();
            }
            Ok(table.page(matching, request.exclusive_start_key.as_ref(), request.limit))
        }
        OperationKind::Scan => Ok(table.page(
            table.items.clone(),
            request.exclusive_start_key.as_ref(),
            request.limit,
        )),
        other => bail!("unsupported operation {other}"),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// `users`: `id` partition key, optional `name` and `email`.
#[must_use]
pub fn users_schema() -> Arc<TableSchema> {
    TableSchema::builder("users")
        .field("id", AttributeKind::String)
        .field_spec(FieldSpec::new("name", AttributeKind::String).optional())
        .field_spec(FieldSpec::new("email", AttributeKind::String).optional().nullable())
        .partition_key("id")
        .register()
        .unwrap_or_else(|e| panic!("users schema: {e}"))
}

/// `events`: `userId`/`createdAt` composite key, `byStatus` index.
#[must_use]
pub fn events_schema() -> Arc<TableSchema> {
    TableSchema::builder("events")
        .field("userId", AttributeKind::String)
        .field("createdAt", AttributeKind::Integer)
        .field_spec(FieldSpec::new("status", AttributeKind::String).optional())
        .field_spec(FieldSpec::new("tags", AttributeKind::StringSet).optional())
        .partition_key("userId")
        .sort_key("createdAt")
        .index(IndexSpec::new("byStatus", "status").with_sort_key("createdAt"))
        .register()
        .unwrap_or_else(|e| panic!("events schema: {e}"))
}

/// A mapper over a store holding the `users` and `events` tables.
#[must_use]
pub fn mapper() -> Mapper<Arc<MemoryTransport>> {
    init_tracing();
    let store = MemoryTransport::new()
        .with_table("users", &["id"])
        .with_table("events", &["userId", "createdAt"]);
    Mapper::new(Arc::new(store))
}

mod test_batch;
mod test_item;
mod test_query;
