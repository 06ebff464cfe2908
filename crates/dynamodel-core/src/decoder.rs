//! Converts raw responses back into native records.
//!
//! Not finding an item is an outcome, not an error. Partial batch failures are
//! returned as data next to the decoded records and never dropped.

use std::collections::HashMap;
use std::sync::Arc;

use dynamodel_model::{Item, RawResponse, WriteRequest};
use serde::de::DeserializeOwned;

use crate::cursor::{self, PageCursor};
use crate::error::{MapperError, MapperResult};
use crate::marshal::{Record, from_record};
use crate::schema::TableSchema;

/// One page of a query or scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T = Record> {
    /// Decoded items, in store order.
    pub records: Vec<T>,
    /// Cursor for the next page, `None` on the last page.
    pub next_cursor: Option<PageCursor>,
    /// Items returned after filtering.
    pub count: u32,
    /// Items evaluated before filtering.
    pub scanned_count: u32,
}

impl<T> Page<T> {
    /// Returns `true` if more pages remain.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Result of a batch get.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchGetResult<T = Record> {
    /// Decoded items per table.
    pub records: HashMap<String, Vec<T>>,
    /// Keys the store did not process, per table.
    pub unprocessed_keys: HashMap<String, Vec<Item>>,
}

impl<T> BatchGetResult<T> {
    /// Returns `true` if every key was processed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unprocessed_keys.values().all(Vec::is_empty)
    }
}

/// Result of a batch write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteResult {
    /// Writes the store did not process, per table, ready to resubmit.
    pub unprocessed_items: HashMap<String, Vec<WriteRequest>>,
}

impl BatchWriteResult {
    /// Returns `true` if every write was processed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unprocessed_items.values().all(Vec::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Single item
// ---------------------------------------------------------------------------

/// Decode a get response. `Ok(None)` when the item does not exist.
pub fn decode_item(schema: &TableSchema, response: &RawResponse) -> MapperResult<Option<Record>> {
    response
        .item
        .as_ref()
        .map(|item| schema.unmarshal(item))
        .transpose()
}

/// Decode a get response into `T`.
pub fn decode_item_as<T: DeserializeOwned>(
    schema: &TableSchema,
    response: &RawResponse,
) -> MapperResult<Option<T>> {
    decode_item(schema, response)?.map(from_record).transpose()
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Decode a query or scan response.
pub fn decode_page(schema: &TableSchema, response: &RawResponse) -> MapperResult<Page> {
    let records = response
        .items
        .iter()
        .map(|item| schema.unmarshal(item))
        .collect::<MapperResult<Vec<_>>>()?;
    let next_cursor = match &response.last_evaluated_key {
        Some(key) if !key.is_empty() => Some(cursor::encode(key)?),
        _ => None,
    };
    Ok(Page {
        records,
        next_cursor,
        count: response.count,
        scanned_count: response.scanned_count,
    })
}

/// Decode a query or scan response into `T`.
pub fn decode_page_as<T: DeserializeOwned>(
    schema: &TableSchema,
    response: &RawResponse,
) -> MapperResult<Page<T>> {
    let page = decode_page(schema, response)?;
    Ok(Page {
        records: page
            .records
            .into_iter()
            .map(from_record)
            .collect::<MapperResult<_>>()?,
        next_cursor: page.next_cursor,
        count: page.count,
        scanned_count: page.scanned_count,
    })
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// Decode a batch get response using the schema of each table read.
///
/// # Errors
///
/// Returns [`MapperError::SchemaConflict`] if the response holds items for a
/// table with no schema in `schemas`.
pub fn decode_batch_get(
    schemas: &HashMap<String, Arc<TableSchema>>,
    response: &RawResponse,
) -> MapperResult<BatchGetResult> {
    let mut records = HashMap::with_capacity(response.responses.len());
    for (table, items) in &response.responses {
        let schema = schemas
            .get(table)
            .ok_or_else(|| MapperError::SchemaConflict {
                table: table.clone(),
                message: "response holds items for a table that was not requested".to_owned(),
            })?;
        let decoded = items
            .iter()
            .map(|item| schema.unmarshal(item))
            .collect::<MapperResult<Vec<_>>>()?;
        records.insert(table.clone(), decoded);
    }

    let unprocessed = count_nested(&response.unprocessed_keys);
    if unprocessed > 0 {
        tracing::warn!(unprocessed, "batch get left keys unprocessed");
    }
    Ok(BatchGetResult {
        records,
        unprocessed_keys: response.unprocessed_keys.clone(),
    })
}

/// Decode a batch get response into `T` for every table.
pub fn decode_batch_get_as<T: DeserializeOwned>(
    schemas: &HashMap<String, Arc<TableSchema>>,
    response: &RawResponse,
) -> MapperResult<BatchGetResult<T>> {
    let result = decode_batch_get(schemas, response)?;
    let records = result
        .records
        .into_iter()
        .map(|(table, records)| {
            let typed = records
                .into_iter()
                .map(from_record)
                .collect::<MapperResult<Vec<T>>>()?;
            Ok((table, typed))
        })
        .collect::<MapperResult<_>>()?;
    Ok(BatchGetResult {
        records,
        unprocessed_keys: result.unprocessed_keys,
    })
}

/// Decode a batch write or transaction response.
#[must_use]
pub fn decode_batch_write(response: &RawResponse) -> BatchWriteResult {
    let unprocessed = count_nested(&response.unprocessed_items);
    if unprocessed > 0 {
        tracing::warn!(unprocessed, "batch write left items unprocessed");
    }
    BatchWriteResult {
        unprocessed_items: response.unprocessed_items.clone(),
    }
}

fn count_nested<T>(map: &HashMap<String, Vec<T>>) -> usize {
    map.values().map(Vec::len).sum()
}
