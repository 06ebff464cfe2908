//! Single-item intents: get, put, update and delete.

use std::sync::Arc;

use dynamodel_model::{Item, OperationKind, RequestDescriptor};

use crate::compiler::{Intent, attach_placeholders, canonical_key, reject_key_updates};
use crate::config::MapperConfig;
use crate::error::MapperResult;
use crate::expression::{Condition, ExpressionBuilder, Path, UpdateAction};
use crate::marshal::Record;
use crate::schema::TableSchema;

/// Read one item by primary key.
#[derive(Debug, Clone)]
pub struct GetItem {
    schema: Arc<TableSchema>,
    key: Item,
    projection: Vec<Path>,
    consistent_read: Option<bool>,
}

impl GetItem {
    /// Read the item with `key` (see [`TableSchema::key`]).
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, key: Item) -> Self {
        Self {
            schema,
            key,
            projection: Vec::new(),
            consistent_read: None,
        }
    }

    /// Return only these attributes.
    #[must_use]
    pub fn projection(mut self, paths: impl IntoIterator<Item = Path>) -> Self {
        self.projection = paths.into_iter().collect();
        self
    }

    /// Request a strongly consistent read.
    #[must_use]
    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = Some(consistent);
        self
    }

    /// Schema of the target table.
    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Key of the requested item.
    #[must_use]
    pub fn key(&self) -> &Item {
        &self.key
    }

    /// The key in canonical wire form.
    pub(crate) fn target_key(&self) -> MapperResult<Item> {
        canonical_key(&self.schema, &self.key)
    }

    pub(crate) fn descriptor(
        &self,
        builder: &mut ExpressionBuilder<'_>,
    ) -> MapperResult<RequestDescriptor> {
        let key = canonical_key(&self.schema, &self.key)?;
        let mut descriptor =
            RequestDescriptor::new(OperationKind::GetItem, self.schema.table_name());
        descriptor.key = Some(key);
        if !self.projection.is_empty() {
            descriptor.projection_expression = Some(builder.projection(&self.projection)?);
        }
        Ok(descriptor)
    }
}

impl Intent for GetItem {
    fn compile(&self, config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        let mut builder = ExpressionBuilder::with_schema(&self.schema);
        let mut descriptor = self.descriptor(&mut builder)?;
        descriptor.consistent_read = resolve_consistent_read(self.consistent_read, config);
        attach_placeholders(&mut descriptor, builder);
        Ok(descriptor)
    }
}

/// Write a full record, replacing any existing item with the same key.
#[derive(Debug, Clone)]
pub struct PutItem {
    schema: Arc<TableSchema>,
    record: Record,
    condition: Option<Condition>,
}

impl PutItem {
    /// Put `record`.
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, record: Record) -> Self {
        Self {
            schema,
            record,
            condition: None,
        }
    }

    /// Only write if `condition` holds on the existing item.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Schema of the target table.
    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// The record written.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Marshaled primary key of the record.
    pub(crate) fn target_key(&self) -> MapperResult<Item> {
        Ok(self.schema.resolve_key_attributes(&self.record)?.into_item())
    }

    pub(crate) fn descriptor(
        &self,
        builder: &mut ExpressionBuilder<'_>,
    ) -> MapperResult<RequestDescriptor> {
        self.schema.resolve_key_attributes(&self.record)?;
        let mut descriptor =
            RequestDescriptor::new(OperationKind::PutItem, self.schema.table_name());
        descriptor.item = Some(self.schema.marshal(&self.record)?);
        if let Some(condition) = &self.condition {
            descriptor.condition_expression = Some(builder.condition(condition)?);
        }
        Ok(descriptor)
    }
}

impl Intent for PutItem {
    fn compile(&self, _config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        let mut builder = ExpressionBuilder::with_schema(&self.schema);
        let mut descriptor = self.descriptor(&mut builder)?;
        attach_placeholders(&mut descriptor, builder);
        Ok(descriptor)
    }
}

/// Modify attributes of one item in place.
#[derive(Debug, Clone)]
pub struct UpdateItem {
    schema: Arc<TableSchema>,
    key: Item,
    actions: Vec<UpdateAction>,
    condition: Option<Condition>,
}

impl UpdateItem {
    /// Update the item with `key`.
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, key: Item) -> Self {
        Self {
            schema,
            key,
            actions: Vec::new(),
            condition: None,
        }
    }

    /// Add one action.
    #[must_use]
    pub fn action(mut self, action: UpdateAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions.
    #[must_use]
    pub fn actions(mut self, actions: impl IntoIterator<Item = UpdateAction>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Only update if `condition` holds.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Schema of the target table.
    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Key of the updated item.
    #[must_use]
    pub fn key(&self) -> &Item {
        &self.key
    }

    /// The key in canonical wire form.
    pub(crate) fn target_key(&self) -> MapperResult<Item> {
        canonical_key(&self.schema, &self.key)
    }

    pub(crate) fn descriptor(
        &self,
        builder: &mut ExpressionBuilder<'_>,
    ) -> MapperResult<RequestDescriptor> {
        let key = canonical_key(&self.schema, &self.key)?;
        reject_key_updates(&self.schema, &self.actions)?;
        let mut descriptor =
            RequestDescriptor::new(OperationKind::UpdateItem, self.schema.table_name());
        descriptor.key = Some(key);
        descriptor.update_expression = Some(builder.update(&self.actions)?);
        if let Some(condition) = &self.condition {
            descriptor.condition_expression = Some(builder.condition(condition)?);
        }
        Ok(descriptor)
    }
}

impl Intent for UpdateItem {
    fn compile(&self, _config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        let mut builder = ExpressionBuilder::with_schema(&self.schema);
        let mut descriptor = self.descriptor(&mut builder)?;
        attach_placeholders(&mut descriptor, builder);
        Ok(descriptor)
    }
}

/// Delete one item by primary key.
#[derive(Debug, Clone)]
pub struct DeleteItem {
    schema: Arc<TableSchema>,
    key: Item,
    condition: Option<Condition>,
}

impl DeleteItem {
    /// Delete the item with `key`.
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, key: Item) -> Self {
        Self {
            schema,
            key,
            condition: None,
        }
    }

    /// Only delete if `condition` holds.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Schema of the target table.
    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Key of the deleted item.
    #[must_use]
    pub fn key(&self) -> &Item {
        &self.key
    }

    /// The key in canonical wire form.
    pub(crate) fn target_key(&self) -> MapperResult<Item> {
        canonical_key(&self.schema, &self.key)
    }

    pub(crate) fn descriptor(
        &self,
        builder: &mut ExpressionBuilder<'_>,
    ) -> MapperResult<RequestDescriptor> {
        let key = canonical_key(&self.schema, &self.key)?;
        let mut descriptor =
            RequestDescriptor::new(OperationKind::DeleteItem, self.schema.table_name());
        descriptor.key = Some(key);
        if let Some(condition) = &self.condition {
            descriptor.condition_expression = Some(builder.condition(condition)?);
        }
        Ok(descriptor)
    }
}

impl Intent for DeleteItem {
    fn compile(&self, _config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        let mut builder = ExpressionBuilder::with_schema(&self.schema);
        let mut descriptor = self.descriptor(&mut builder)?;
        attach_placeholders(&mut descriptor, builder);
        Ok(descriptor)
    }
}

/// Explicit flag wins; otherwise only a `true` default is sent.
pub(crate) fn resolve_consistent_read(flag: Option<bool>, config: &MapperConfig) -> Option<bool> {
    flag.or(config.default_consistent_read.then_some(true))
}
