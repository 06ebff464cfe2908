//! The raw response a transport hands back, before decoding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;

/// A single write inside a batch: exactly one of put or delete is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRequest {
    /// Put the contained item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_request: Option<PutRequest>,
    /// Delete the item with the contained key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_request: Option<DeleteRequest>,
}

impl WriteRequest {
    /// A put of `item`.
    #[must_use]
    pub fn put(item: Item) -> Self {
        Self {
            put_request: Some(PutRequest { item }),
            delete_request: None,
        }
    }

    /// A delete of `key`.
    #[must_use]
    pub fn delete(key: Item) -> Self {
        Self {
            put_request: None,
            delete_request: Some(DeleteRequest { key }),
        }
    }
}

/// Put member of a [`WriteRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRequest {
    /// The full item.
    pub item: Item,
}

/// Delete member of a [`WriteRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRequest {
    /// The primary key.
    pub key: Item,
}

/// Response payload for any operation.
///
/// `item` is set by `GetItem` when the item exists; `items` by `Query` and
/// `Scan`; `responses` by `BatchGetItem`, keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawResponse {
    /// The single item, if found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,

    /// Items of a query or scan page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,

    /// Items of a batch get, per table.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub responses: HashMap<String, Vec<Item>>,

    /// Key to resume from when more pages remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,

    /// Keys of a batch get the store did not process, per table.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub unprocessed_keys: HashMap<String, Vec<Item>>,

    /// Writes of a batch write the store did not process, per table.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub unprocessed_items: HashMap<String, Vec<WriteRequest>>,

    /// Number of items returned after filtering.
    #[serde(default)]
    pub count: u32,

    /// Number of items evaluated before filtering.
    #[serde(default)]
    pub scanned_count: u32,
}
