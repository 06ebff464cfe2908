//! Async facade tying compile, transport and decode together.

use std::sync::Arc;

use dynamodel_model::{RawResponse, RequestDescriptor};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::compiler::{
    BatchGet, BatchWrite, DeleteItem, GetItem, Intent, OperationCompiler, PutItem, Query, Scan,
    TransactWrite, UpdateItem,
};
use crate::config::MapperConfig;
use crate::decoder::{self, BatchGetResult, BatchWriteResult, Page};
use crate::error::{MapperError, MapperResult};
use crate::marshal::{Record, from_record, to_record};
use crate::schema::TableSchema;
use crate::transport::Transport;

/// Executes intents through a [`Transport`].
///
/// Every call compiles first, so compile errors surface before the transport
/// sees anything. Transport failures are wrapped in
/// [`MapperError::Transport`] and never retried.
#[derive(Debug)]
pub struct Mapper<T> {
    transport: T,
    compiler: OperationCompiler,
}

impl<T: Transport> Mapper<T> {
    /// A mapper with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, MapperConfig::default())
    }

    /// A mapper with the given configuration.
    pub fn with_config(transport: T, config: MapperConfig) -> Self {
        Self {
            transport,
            compiler: OperationCompiler::new(config),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        self.compiler.config()
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Single items
    // -----------------------------------------------------------------------

    /// Fetch one item. `Ok(None)` when it does not exist.
    pub async fn get(&self, intent: &GetItem) -> MapperResult<Option<Record>> {
        let response = self.send(intent).await?;
        decoder::decode_item(intent.schema(), &response)
    }

    /// Fetch one item into `V`.
    pub async fn get_as<V: DeserializeOwned>(&self, intent: &GetItem) -> MapperResult<Option<V>> {
        let response = self.send(intent).await?;
        decoder::decode_item_as(intent.schema(), &response)
    }

    /// Write a record.
    pub async fn put(&self, intent: &PutItem) -> MapperResult<()> {
        self.send(intent).await.map(drop)
    }

    /// Serialize `value` and write it unconditionally.
    pub async fn save<V: Serialize>(
        &self,
        schema: &Arc<TableSchema>,
        value: &V,
    ) -> MapperResult<()> {
        let record = to_record(schema, value)?;
        self.put(&PutItem::new(Arc::clone(schema), record)).await
    }

    /// Update an item in place.
    pub async fn update(&self, intent: &UpdateItem) -> MapperResult<()> {
        self.send(intent).await.map(drop)
    }

    /// Delete an item.
    pub async fn delete(&self, intent: &DeleteItem) -> MapperResult<()> {
        self.send(intent).await.map(drop)
    }

    // -----------------------------------------------------------------------
    // Queries and scans
    // -----------------------------------------------------------------------

    /// Fetch one page of a query.
    pub async fn query(&self, intent: &Query) -> MapperResult<Page> {
        let response = self.send(intent).await?;
        decoder::decode_page(intent.schema(), &response)
    }

    /// Fetch one page of a query into `V`.
    pub async fn query_as<V: DeserializeOwned>(&self, intent: &Query) -> MapperResult<Page<V>> {
        let response = self.send(intent).await?;
        decoder::decode_page_as(intent.schema(), &response)
    }

    /// Follow cursors until the query is exhausted.
    pub async fn query_all(&self, intent: &Query) -> MapperResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut current = intent.clone();
        loop {
            let page = self.query(&current).await?;
            records.extend(page.records);
            match page.next_cursor {
                Some(cursor) => current = intent.with_cursor(Some(cursor)),
                None => break,
            }
        }
        tracing::debug!(
            table = %intent.schema().table_name(),
            records = records.len(),
            "query exhausted"
        );
        Ok(records)
    }

    /// Fetch one page of a scan.
    pub async fn scan(&self, intent: &Scan) -> MapperResult<Page> {
        let response = self.send(intent).await?;
        decoder::decode_page(intent.schema(), &response)
    }

    /// Fetch one page of a scan into `V`.
    pub async fn scan_as<V: DeserializeOwned>(&self, intent: &Scan) -> MapperResult<Page<V>> {
        let response = self.send(intent).await?;
        decoder::decode_page_as(intent.schema(), &response)
    }

    /// Follow cursors until the scan is exhausted.
    pub async fn scan_all(&self, intent: &Scan) -> MapperResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut current = intent.clone();
        loop {
            let page = self.scan(&current).await?;
            records.extend(page.records);
            match page.next_cursor {
                Some(cursor) => current = intent.with_cursor(Some(cursor)),
                None => break,
            }
        }
        tracing::debug!(
            table = %intent.schema().table_name(),
            records = records.len(),
            "scan exhausted"
        );
        Ok(records)
    }

    /// Like [`Mapper::query_all`], deserializing each record into `V`.
    pub async fn query_all_as<V: DeserializeOwned>(&self, intent: &Query) -> MapperResult<Vec<V>> {
        self.query_all(intent)
            .await?
            .into_iter()
            .map(from_record)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Batches and transactions
    // -----------------------------------------------------------------------

    /// Read many items. Unprocessed keys are returned, not retried.
    pub async fn batch_get(&self, intent: &BatchGet) -> MapperResult<BatchGetResult> {
        let response = self.send(intent).await?;
        decoder::decode_batch_get(&intent.schemas(), &response)
    }

    /// Read many items into `V`.
    pub async fn batch_get_as<V: DeserializeOwned>(
        &self,
        intent: &BatchGet,
    ) -> MapperResult<BatchGetResult<V>> {
        let response = self.send(intent).await?;
        decoder::decode_batch_get_as(&intent.schemas(), &response)
    }

    /// Write many items. Unprocessed writes are returned, not retried.
    pub async fn batch_write(&self, intent: &BatchWrite) -> MapperResult<BatchWriteResult> {
        let response = self.send(intent).await?;
        Ok(decoder::decode_batch_write(&response))
    }

    /// Run a transaction.
    pub async fn transact(&self, intent: &TransactWrite) -> MapperResult<BatchWriteResult> {
        let response = self.send(intent).await?;
        Ok(decoder::decode_batch_write(&response))
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Compile an intent without sending it.
    pub fn compile<I: Intent>(&self, intent: &I) -> MapperResult<RequestDescriptor> {
        self.compiler.compile(intent)
    }

    async fn send<I: Intent>(&self, intent: &I) -> MapperResult<RawResponse> {
        let request = self.compiler.compile(intent)?;
        let operation = request.operation;
        self.transport.execute(request).await.map_err(|e| {
            tracing::debug!(%operation, error = %e, "transport failed");
            MapperError::Transport(e)
        })
    }
}
