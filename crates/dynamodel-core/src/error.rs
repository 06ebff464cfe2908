//! Error type shared by every stage of the mapper.

use dynamodel_model::OperationKind;

/// Errors raised while registering schemas, marshaling values, compiling
/// requests, decoding responses or calling the transport.
///
/// Only [`MapperError::Transport`] originates outside the core. Nothing here
/// is retried by the core.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// A schema failed validation at registration time.
    #[error("schema conflict on table {table}: {message}")]
    SchemaConflict {
        /// Table the schema describes.
        table: String,
        /// What is wrong.
        message: String,
    },

    /// A value's shape does not match the declared or required kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The expected kind.
        expected: String,
        /// The kind actually seen.
        found: String,
    },

    /// A number cannot be represented without truncation.
    #[error("precision loss: {value} cannot be represented as {target}")]
    PrecisionLoss {
        /// The offending number text.
        value: String,
        /// The target representation.
        target: String,
    },

    /// A required field is absent from a record.
    #[error("missing required attribute '{field}'")]
    MissingAttribute {
        /// Logical field name.
        field: String,
    },

    /// A key attribute needed by a key-based operation is absent.
    #[error("missing key attribute '{attribute}' for table {table}")]
    MissingKeyAttribute {
        /// Table being addressed.
        table: String,
        /// Logical name of the key field.
        attribute: String,
    },

    /// A named secondary index is not declared on the schema.
    #[error("index '{index}' not found on table {table}")]
    IndexNotFound {
        /// Table being addressed.
        table: String,
        /// The index name asked for.
        index: String,
    },

    /// An expression cannot be compiled.
    #[error("invalid expression: {message}")]
    InvalidExpression {
        /// What is wrong.
        message: String,
    },

    /// A query key condition uses a shape the store cannot evaluate.
    #[error("unsupported key condition: {message}")]
    UnsupportedKeyCondition {
        /// What is wrong.
        message: String,
    },

    /// A batch write targets the same key more than once.
    #[error("conflicting batch operation on table {table}: {message}")]
    ConflictingBatchOperation {
        /// Table holding the conflicting key.
        table: String,
        /// What conflicts.
        message: String,
    },

    /// Two members of one transaction target the same key.
    #[error("transaction targets the same key on table {table} more than once")]
    DuplicateTransactionKey {
        /// Table holding the duplicated key.
        table: String,
    },

    /// A batch or transaction exceeds the configured item limit.
    #[error("{operation} accepts at most {limit} items, got {count}")]
    BatchTooLarge {
        /// The multi-item operation.
        operation: OperationKind,
        /// Configured limit.
        limit: usize,
        /// Items supplied.
        count: usize,
    },

    /// A pagination token could not be decoded.
    #[error("invalid cursor: {message}")]
    InvalidCursor {
        /// What is wrong.
        message: String,
    },

    /// Bridging a native record through serde failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport collaborator failed.
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

impl MapperError {
    /// Shorthand for [`MapperError::TypeMismatch`].
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Shorthand for [`MapperError::PrecisionLoss`].
    #[must_use]
    pub fn precision_loss(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self::PrecisionLoss {
            value: value.into(),
            target: target.into(),
        }
    }

    /// Shorthand for [`MapperError::InvalidExpression`].
    #[must_use]
    pub fn invalid_expression(message: impl Into<String>) -> Self {
        Self::InvalidExpression {
            message: message.into(),
        }
    }

    /// Shorthand for [`MapperError::UnsupportedKeyCondition`].
    #[must_use]
    pub fn unsupported_key_condition(message: impl Into<String>) -> Self {
        Self::UnsupportedKeyCondition {
            message: message.into(),
        }
    }

    /// Shorthand for [`MapperError::InvalidCursor`].
    #[must_use]
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Returns the taxonomy name of this error (e.g. `"TypeMismatch"`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaConflict { .. } => "SchemaConflict",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::PrecisionLoss { .. } => "PrecisionLoss",
            Self::MissingAttribute { .. } => "MissingAttribute",
            Self::MissingKeyAttribute { .. } => "MissingKeyAttribute",
            Self::IndexNotFound { .. } => "IndexNotFound",
            Self::InvalidExpression { .. } => "InvalidExpression",
            Self::UnsupportedKeyCondition { .. } => "UnsupportedKeyCondition",
            Self::ConflictingBatchOperation { .. } => "ConflictingBatchOperation",
            Self::DuplicateTransactionKey { .. } => "DuplicateTransactionKey",
            Self::BatchTooLarge { .. } => "BatchTooLarge",
            Self::InvalidCursor { .. } => "InvalidCursor",
            Self::Serialization(_) => "Serialization",
            Self::Transport(_) => "Transport",
        }
    }
}

/// Convenience result type for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;
