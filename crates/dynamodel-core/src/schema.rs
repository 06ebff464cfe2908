//! Table schemas: fields, primary key and secondary indexes.
//!
//! A schema is assembled with [`TableSchema::builder`] and validated once by
//! [`TableSchemaBuilder::register`]. Every structural problem is reported
//! there as [`MapperError::SchemaConflict`]; a registered schema is immutable
//! and shared behind an [`Arc`].

use std::collections::HashSet;
use std::sync::Arc;

use dynamodel_model::{AttributeValue, Item};

use crate::error::{MapperError, MapperResult};
use crate::marshal::record::{self, Record};
use crate::marshal::value::{AttributeKind, Value, to_wire_as};

// ---------------------------------------------------------------------------
// Field and index declarations
// ---------------------------------------------------------------------------

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    attribute_name: String,
    kind: AttributeKind,
    required: bool,
    nullable: bool,
}

impl FieldSpec {
    /// A required, non-nullable field stored under its own name.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        let name = name.into();
        Self {
            attribute_name: name.clone(),
            name,
            kind,
            required: true,
            nullable: false,
        }
    }

    /// Store the field under a different wire attribute name.
    #[must_use]
    pub fn with_attribute_name(mut self, attribute_name: impl Into<String>) -> Self {
        self.attribute_name = attribute_name.into();
        self
    }

    /// Allow the field to be absent from a record.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marshal an absent or null value as an explicit `NULL`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Logical field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire attribute name.
    #[must_use]
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// Declared kind.
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Whether the field must be present when writing.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether a missing value is written as `NULL`.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// A secondary index declaration. Key fields are logical field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    name: String,
    partition_key: String,
    sort_key: Option<String>,
}

impl IndexSpec {
    /// An index keyed by `partition_key` only.
    pub fn new(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    /// Add a sort key to the index.
    #[must_use]
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Partition key field.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Sort key field, if any.
    #[must_use]
    pub fn sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }
}

/// The key fields of a table or one of its indexes.
#[derive(Debug, Clone, Copy)]
pub struct KeyFields<'a> {
    /// Partition key field.
    pub partition: &'a FieldSpec,
    /// Sort key field, if the key is composite.
    pub sort: Option<&'a FieldSpec>,
}

impl KeyFields<'_> {
    /// Returns `true` if `field` is one of these key fields.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.partition.name() == field || self.sort.is_some_and(|s| s.name() == field)
    }
}

/// A marshaled primary key. Attribute names are wire names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    /// Partition key attribute and value.
    pub partition: (String, AttributeValue),
    /// Sort key attribute and value.
    pub sort: Option<(String, AttributeValue)>,
}

impl PrimaryKey {
    /// Convert to a key item.
    #[must_use]
    pub fn into_item(self) -> Item {
        let mut item = Item::with_capacity(2);
        item.insert(self.partition.0, self.partition.1);
        if let Some((name, value)) = self.sort {
            item.insert(name, value);
        }
        item
    }
}

// ---------------------------------------------------------------------------
// TableSchema
// ---------------------------------------------------------------------------

/// Validated description of a record type and the table holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table_name: String,
    fields: Vec<FieldSpec>,
    partition_key: usize,
    sort_key: Option<usize>,
    indexes: Vec<IndexSpec>,
}

impl TableSchema {
    /// Start declaring a schema for `table_name`.
    pub fn builder(table_name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            table_name: table_name.into(),
            fields: Vec::new(),
            partition_key: None,
            sort_key: None,
            indexes: Vec::new(),
        }
    }

    /// Table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Declared fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Declared secondary indexes.
    #[must_use]
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// Look up a field by logical name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by wire attribute name.
    #[must_use]
    pub fn field_by_attribute(&self, attribute_name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.attribute_name == attribute_name)
    }

    /// Declared kind of a logical field.
    #[must_use]
    pub fn declared_kind(&self, name: &str) -> Option<AttributeKind> {
        self.field(name).map(FieldSpec::kind)
    }

    /// Wire name for a logical name. Undeclared names map to themselves.
    #[must_use]
    pub fn attribute_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.field(name).map_or(name, FieldSpec::attribute_name)
    }

    /// Partition key field of the table.
    #[must_use]
    pub fn partition_key(&self) -> &FieldSpec {
        &self.fields[self.partition_key]
    }

    /// Sort key field of the table.
    #[must_use]
    pub fn sort_key(&self) -> Option<&FieldSpec> {
        self.sort_key.map(|i| &self.fields[i])
    }

    /// Look up a secondary index.
    pub fn index(&self, name: &str) -> MapperResult<&IndexSpec> {
        self.indexes
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| MapperError::IndexNotFound {
                table: self.table_name.clone(),
                index: name.to_owned(),
            })
    }

    /// Key fields of the table, or of `index` when given.
    pub fn key_fields(&self, index: Option<&str>) -> MapperResult<KeyFields<'_>> {
        let Some(index) = index else {
            return Ok(KeyFields {
                partition: self.partition_key(),
                sort: self.sort_key(),
            });
        };
        let spec = self.index(index)?;
        // Index key fields were checked at registration.
        let lookup = |name: &str| {
            self.field(name).ok_or_else(|| MapperError::SchemaConflict {
                table: self.table_name.clone(),
                message: format!("index {index} references unknown field {name}"),
            })
        };
        Ok(KeyFields {
            partition: lookup(&spec.partition_key)?,
            sort: spec.sort_key.as_deref().map(lookup).transpose()?,
        })
    }

    /// Extract and marshal the primary key from a record.
    pub fn resolve_key_attributes(&self, record: &Record) -> MapperResult<PrimaryKey> {
        let extract = |field: &FieldSpec| -> MapperResult<(String, AttributeValue)> {
            match record.get(field.name()) {
                Some(value) if !value.is_null() => Ok((
                    field.attribute_name.clone(),
                    to_wire_as(value, field.kind)?,
                )),
                _ => Err(self.missing_key(field)),
            }
        };
        Ok(PrimaryKey {
            partition: extract(self.partition_key())?,
            sort: self.sort_key().map(extract).transpose()?,
        })
    }

    /// Build a key item from raw key values.
    ///
    /// A composite schema requires `sort`; a partition-only schema rejects it.
    pub fn key(&self, partition: impl Into<Value>, sort: Option<Value>) -> MapperResult<Item> {
        let pk = self.partition_key();
        let partition = (pk.attribute_name.clone(), to_wire_as(&partition.into(), pk.kind)?);
        let sort = match (self.sort_key(), sort) {
            (Some(sk), Some(value)) => Some((sk.attribute_name.clone(), to_wire_as(&value, sk.kind)?)),
            (Some(sk), None) => return Err(self.missing_key(sk)),
            (None, Some(_)) => {
                return Err(MapperError::SchemaConflict {
                    table: self.table_name.clone(),
                    message: "table has no sort key but a sort key value was given".to_owned(),
                });
            }
            (None, None) => None,
        };
        Ok(PrimaryKey { partition, sort }.into_item())
    }

    /// Marshal a full record to a wire item.
    pub fn marshal(&self, record: &Record) -> MapperResult<Item> {
        record::marshal_record(self, record)
    }

    /// Unmarshal a wire item to a record.
    pub fn unmarshal(&self, item: &Item) -> MapperResult<Record> {
        record::unmarshal_item(self, item)
    }

    fn missing_key(&self, field: &FieldSpec) -> MapperError {
        MapperError::MissingKeyAttribute {
            table: self.table_name.clone(),
            attribute: field.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects declarations for a [`TableSchema`].
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    table_name: String,
    fields: Vec<FieldSpec>,
    partition_key: Option<String>,
    sort_key: Option<String>,
    indexes: Vec<IndexSpec>,
}

impl TableSchemaBuilder {
    /// Declare a required field stored under its own name.
    #[must_use]
    pub fn field(self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.field_spec(FieldSpec::new(name, kind))
    }

    /// Declare a field with full options.
    #[must_use]
    pub fn field_spec(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Name the partition key field.
    #[must_use]
    pub fn partition_key(mut self, name: impl Into<String>) -> Self {
        self.partition_key = Some(name.into());
        self
    }

    /// Name the sort key field.
    #[must_use]
    pub fn sort_key(mut self, name: impl Into<String>) -> Self {
        self.sort_key = Some(name.into());
        self
    }

    /// Declare a secondary index.
    #[must_use]
    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Validate the declarations and freeze them into a schema.
    pub fn register(self) -> MapperResult<Arc<TableSchema>> {
        let conflict = |message: String| MapperError::SchemaConflict {
            table: self.table_name.clone(),
            message,
        };

        if self.table_name.is_empty() {
            return Err(conflict("table name must not be empty".to_owned()));
        }
        if self.fields.is_empty() {
            return Err(conflict("schema declares no fields".to_owned()));
        }

        let mut names = HashSet::new();
        let mut attribute_names = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.attribute_name.is_empty() {
                return Err(conflict("field names must not be empty".to_owned()));
            }
            if !names.insert(field.name.as_str()) {
                return Err(conflict(format!("field {} is declared twice", field.name)));
            }
            if !attribute_names.insert(field.attribute_name.as_str()) {
                return Err(conflict(format!(
                    "attribute name {} is used by more than one field",
                    field.attribute_name
                )));
            }
        }

        let key_field = |role: &str, name: &str| -> MapperResult<usize> {
            let position = self
                .fields
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| conflict(format!("{role} {name} is not a declared field")))?;
            let field = &self.fields[position];
            if !field.kind.is_key_scalar() {
                return Err(conflict(format!(
                    "{role} {name} must be a String, Number or Binary field, not {}",
                    field.kind
                )));
            }
            Ok(position)
        };

        let Some(partition_name) = self.partition_key.as_deref() else {
            return Err(conflict("no partition key declared".to_owned()));
        };
        let partition_key = key_field("partition key", partition_name)?;
        let sort_key = self
            .sort_key
            .as_deref()
            .map(|name| key_field("sort key", name))
            .transpose()?;
        if sort_key == Some(partition_key) {
            return Err(conflict("sort key must differ from the partition key".to_owned()));
        }
        for position in std::iter::once(partition_key).chain(sort_key) {
            if !self.fields[position].required {
                return Err(conflict(format!(
                    "key field {} must be required",
                    self.fields[position].name
                )));
            }
        }

        let mut index_names = HashSet::new();
        for index in &self.indexes {
            if !index_names.insert(index.name.as_str()) {
                return Err(conflict(format!("index {} is declared twice", index.name)));
            }
            let role = format!("partition key of index {}", index.name);
            let pk = key_field(&role, &index.partition_key)?;
            if let Some(sk) = index.sort_key.as_deref() {
                let role = format!("sort key of index {}", index.name);
                if key_field(&role, sk)? == pk {
                    return Err(conflict(format!(
                        "index {} uses the same field as partition and sort key",
                        index.name
                    )));
                }
            }
        }

        tracing::info!(
            table = %self.table_name,
            fields = self.fields.len(),
            indexes = self.indexes.len(),
            "registered table schema"
        );

        Ok(Arc::new(TableSchema {
            table_name: self.table_name,
            fields: self.fields,
            partition_key,
            sort_key,
            indexes: self.indexes,
        }))
    }
}
