//! Object mapping for a DynamoDB-style key-value store.
//!
//! The core compiles typed intents into transport-ready request descriptors
//! and decodes raw responses back into records. It performs no I/O of its
//! own; the [`Mapper`] facade hands compiled requests to a caller-supplied
//! [`Transport`].
//!
//! - [`marshal`]: native values and records to and from wire attributes.
//! - [`schema`] and [`registry`]: table schemas, validated at registration.
//! - [`expression`]: condition, update and projection compilation.
//! - [`compiler`]: per-operation intents.
//! - [`cursor`]: opaque pagination tokens.
//! - [`decoder`]: response decoding.

pub mod compiler;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod expression;
pub mod mapper;
pub mod marshal;
pub mod registry;
pub mod schema;
pub mod transport;

pub use compiler::{
    BatchGet, BatchWrite, ConditionCheck, DeleteItem, GetItem, Intent, OperationCompiler, PutItem,
    Query, Scan, TransactWrite, UpdateItem,
};
pub use config::MapperConfig;
pub use cursor::PageCursor;
pub use decoder::{BatchGetResult, BatchWriteResult, Page};
pub use error::{MapperError, MapperResult};
pub use expression::{Condition, Path, UpdateAction};
pub use mapper::Mapper;
pub use marshal::{AttributeKind, Number, Record, Value};
pub use registry::SchemaRegistry;
pub use schema::{FieldSpec, IndexSpec, TableSchema};
pub use transport::{Transport, TransportFuture};
