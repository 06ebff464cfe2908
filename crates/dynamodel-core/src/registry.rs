//! Process-wide collection of registered schemas.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{MapperError, MapperResult};
use crate::schema::{TableSchema, TableSchemaBuilder};

/// Registered schemas keyed by table name.
///
/// Safe to share between threads; lookups hand out `Arc` clones.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, Arc<TableSchema>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `builder` and add the resulting schema.
    pub fn register(&self, builder: TableSchemaBuilder) -> MapperResult<Arc<TableSchema>> {
        self.insert(builder.register()?)
    }

    /// Add an already validated schema. A table can be registered once.
    pub fn insert(&self, schema: Arc<TableSchema>) -> MapperResult<Arc<TableSchema>> {
        match self.schemas.entry(schema.table_name().to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(MapperError::SchemaConflict {
                table: e.key().clone(),
                message: "a schema is already registered for this table".to_owned(),
            }),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(Arc::clone(&schema));
                Ok(schema)
            }
        }
    }

    /// Get the schema for `table`.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.schemas.get(table).map(|r| Arc::clone(r.value()))
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schema is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered table names, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }
}
