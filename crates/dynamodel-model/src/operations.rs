//! Operation kinds carried by a request descriptor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every operation the compiler can emit.
///
/// `ConditionCheck` only appears nested inside a `TransactWriteItems`
/// descriptor; `PutItem`, `DeleteItem` and `GetItem` also appear nested inside
/// batch descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Get an item by primary key.
    GetItem,
    /// Put (insert or replace) an item.
    PutItem,
    /// Update an item in place.
    UpdateItem,
    /// Delete an item by primary key.
    DeleteItem,
    /// Query items by key condition.
    Query,
    /// Scan a table or index.
    Scan,
    /// Get many items across tables.
    BatchGetItem,
    /// Put/delete many items across tables.
    BatchWriteItem,
    /// All-or-nothing write of several operations.
    TransactWriteItems,
    /// Condition-only member of a transaction.
    ConditionCheck,
}

impl OperationKind {
    /// Returns the store's operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetItem => "GetItem",
            Self::PutItem => "PutItem",
            Self::UpdateItem => "UpdateItem",
            Self::DeleteItem => "DeleteItem",
            Self::Query => "Query",
            Self::Scan => "Scan",
            Self::BatchGetItem => "BatchGetItem",
            Self::BatchWriteItem => "BatchWriteItem",
            Self::TransactWriteItems => "TransactWriteItems",
            Self::ConditionCheck => "ConditionCheck",
        }
    }

    /// Parse an operation name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GetItem" => Some(Self::GetItem),
            "PutItem" => Some(Self::PutItem),
            "UpdateItem" => Some(Self::UpdateItem),
            "DeleteItem" => Some(Self::DeleteItem),
            "Query" => Some(Self::Query),
            "Scan" => Some(Self::Scan),
            "BatchGetItem" => Some(Self::BatchGetItem),
            "BatchWriteItem" => Some(Self::BatchWriteItem),
            "TransactWriteItems" => Some(Self::TransactWriteItems),
            "ConditionCheck" => Some(Self::ConditionCheck),
            _ => None,
        }
    }

    /// Returns `true` for operations whose descriptor nests per-item requests.
    #[must_use]
    pub fn is_multi_item(&self) -> bool {
        matches!(
            self,
            Self::BatchGetItem | Self::BatchWriteItem | Self::TransactWriteItems
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_roundtrip_operation_names() {
        for op in [
            OperationKind::GetItem,
            OperationKind::Query,
            OperationKind::TransactWriteItems,
            OperationKind::ConditionCheck,
        ] {
            assert_eq!(OperationKind::from_name(op.as_str()), Some(op));
        }
        assert_eq!(OperationKind::from_name("CreateTable"), None);
    }
}
