//! Query and scan intents.
//!
//! A query's condition is split into a key condition and a filter. Only
//! top-level conjuncts can belong to the key condition: exactly one
//! partition-key equality and at most one sort-key test. Every other
//! conjunct becomes part of the filter, and must not touch the key fields.

use std::sync::Arc;

use dynamodel_model::{OperationKind, RequestDescriptor};

use crate::compiler::Intent;
use crate::compiler::attach_placeholders;
use crate::compiler::item::resolve_consistent_read;
use crate::config::MapperConfig;
use crate::cursor::PageCursor;
use crate::error::{MapperError, MapperResult};
use crate::expression::{CompareOp, Condition, ExpressionBuilder, Path};
use crate::marshal::Value;
use crate::schema::{KeyFields, TableSchema};

/// Read the items of one partition, optionally narrowed by sort key.
#[derive(Debug, Clone)]
pub struct Query {
    schema: Arc<TableSchema>,
    condition: Condition,
    filter: Option<Condition>,
    index: Option<String>,
    cursor: Option<PageCursor>,
    limit: Option<u32>,
    projection: Vec<Path>,
    scan_index_forward: Option<bool>,
    consistent_read: Option<bool>,
}

impl Query {
    /// Query with a combined condition. Key conditions are extracted from
    /// its top-level conjuncts and the rest is applied as a filter.
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, condition: Condition) -> Self {
        Self {
            schema,
            condition,
            filter: None,
            index: None,
            cursor: None,
            limit: None,
            projection: Vec::new(),
            scan_index_forward: None,
            consistent_read: None,
        }
    }

    /// Query every item of the partition holding `value`.
    ///
    /// The partition key of the table is used. Call [`Query::index`] before
    /// adding conditions when the index has a different partition key.
    #[must_use]
    pub fn partition(schema: Arc<TableSchema>, value: impl Into<Value>) -> Self {
        let field = schema.partition_key().name().to_owned();
        Self::new(schema, Path::new(field).equals(value))
    }

    /// Narrow by sort key.
    #[must_use]
    pub fn sort_key(mut self, condition: Condition) -> Self {
        self.condition = self.condition & condition;
        self
    }

    /// Filter applied after key matching. It is ANDed with any non-key part
    /// of the main condition.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Query a secondary index instead of the table.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Resume after the page that returned `cursor`.
    #[must_use]
    pub fn cursor(mut self, cursor: PageCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Evaluate at most `limit` items.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Return only these attributes.
    #[must_use]
    pub fn projection(mut self, paths: impl IntoIterator<Item = Path>) -> Self {
        self.projection = paths.into_iter().collect();
        self
    }

    /// Traverse the sort key in descending order.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.scan_index_forward = Some(false);
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

    /// Continue with the page after `cursor`, or stop at `None`.
    pub(crate) fn with_cursor(&self, cursor: Option<PageCursor>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

impl Intent for Query {
    fn compile(&self, config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        let keys = self.schema.key_fields(self.index.as_deref())?;
        let (key_condition, rest) = split_key_condition(&self.condition, &keys)?;
        let filter = Condition::all(rest.into_iter().chain(self.filter.clone()));

        let mut builder = ExpressionBuilder::with_schema(&self.schema);
        let mut descriptor = RequestDescriptor::new(OperationKind::Query, self.schema.table_name());
        descriptor.index_name.clone_from(&self.index);
        descriptor.key_condition_expression = Some(builder.condition(&key_condition)?);
        descriptor.filter_expression = builder.filter(&filter)?;
        if !self.projection.is_empty() {
            descriptor.projection_expression = Some(builder.projection(&self.projection)?);
        }
        descriptor.exclusive_start_key = self.cursor.as_ref().map(PageCursor::key).transpose()?;
        descriptor.limit = self.limit;
        descriptor.scan_index_forward = self.scan_index_forward;
        descriptor.consistent_read = resolve_consistent_read(self.consistent_read, config);
        attach_placeholders(&mut descriptor, builder);
        Ok(descriptor)
    }
}

/// Read every item of a table or index.
#[derive(Debug, Clone)]
pub struct Scan {
    schema: Arc<TableSchema>,
    filter: Option<Condition>,
    index: Option<String>,
    cursor: Option<PageCursor>,
    limit: Option<u32>,
    projection: Vec<Path>,
    consistent_read: Option<bool>,
}

impl Scan {
    /// Scan the whole table.
    #[must_use]
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            filter: None,
            index: None,
            cursor: None,
            limit: None,
            projection: Vec::new(),
            consistent_read: None,
        }
    }

    /// Keep only items matching `condition`.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Scan a secondary index instead of the table.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Resume after the page that returned `cursor`.
    #[must_use]
    pub fn cursor(mut self, cursor: PageCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Evaluate at most `limit` items.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
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

    pub(crate) fn with_cursor(&self, cursor: Option<PageCursor>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }
}

impl Intent for Scan {
    fn compile(&self, config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        if let Some(index) = &self.index {
            self.schema.index(index)?;
        }
        let mut builder = ExpressionBuilder::with_schema(&self.schema);
        let mut descriptor = RequestDescriptor::new(OperationKind::Scan, self.schema.table_name());
        descriptor.index_name.clone_from(&self.index);
        if let Some(filter) = &self.filter {
            descriptor.filter_expression = builder.filter(filter)?;
        }
        if !self.projection.is_empty() {
            descriptor.projection_expression = Some(builder.projection(&self.projection)?);
        }
        descriptor.exclusive_start_key = self.cursor.as_ref().map(PageCursor::key).transpose()?;
        descriptor.limit = self.limit;
        descriptor.consistent_read = resolve_consistent_read(self.consistent_read, config);
        attach_placeholders(&mut descriptor, builder);
        Ok(descriptor)
    }
}

// ---------------------------------------------------------------------------
// Key condition extraction
// ---------------------------------------------------------------------------

/// Split `condition` into the key condition and the remaining conjuncts.
fn split_key_condition(
    condition: &Condition,
    keys: &KeyFields<'_>,
) -> MapperResult<(Condition, Vec<Condition>)> {
    let partition_name = keys.partition.name();
    let sort_name = keys.sort.map(|s| s.name());

    let mut partition = None;
    let mut sort = None;
    let mut rest = Vec::new();

    for conjunct in conjuncts(condition) {
        let top_level_root = conjunct
            .path()
            .filter(|p| p.is_top_level())
            .map(Path::root);

        if top_level_root == Some(partition_name)
            && matches!(conjunct, Condition::Compare { op: CompareOp::Eq, .. })
        {
            if partition.replace(conjunct.clone()).is_some() {
                return Err(MapperError::unsupported_key_condition(format!(
                    "more than one condition on partition key {partition_name}"
                )));
            }
        } else if let Some(name) = top_level_root.filter(|root| Some(*root) == sort_name) {
            if !is_sort_key_operator(conjunct) {
                return Err(MapperError::unsupported_key_condition(format!(
                    "operator not allowed on sort key {name}"
                )));
            }
            if sort.replace(conjunct.clone()).is_some() {
                return Err(MapperError::unsupported_key_condition(format!(
                    "more than one condition on sort key {name}"
                )));
            }
        } else if conjunct.references(partition_name)
            || sort_name.is_some_and(|name| conjunct.references(name))
        {
            return Err(MapperError::unsupported_key_condition(
                "key attributes may only be tested by top-level key conditions",
            ));
        } else {
            rest.push(conjunct.clone());
        }
    }

    let Some(partition) = partition else {
        return Err(MapperError::unsupported_key_condition(format!(
            "query requires an equality condition on partition key {partition_name}"
        )));
    };
    let key_condition = match sort {
        Some(sort) => partition & sort,
        None => partition,
    };
    Ok((key_condition, rest))
}

/// Top-level conjuncts of a condition, with nested `And`s flattened and
/// empty subtrees dropped.
fn conjuncts(condition: &Condition) -> Vec<&Condition> {
    match condition {
        Condition::And(children) => children.iter().flat_map(conjuncts).collect(),
        c if c.is_empty() => Vec::new(),
        c => vec![c],
    }
}

fn is_sort_key_operator(condition: &Condition) -> bool {
    match condition {
        Condition::Compare { op, .. } => !matches!(op, CompareOp::Ne),
        Condition::Between { .. } | Condition::BeginsWith { .. } => true,
        _ => false,
    }
}
