//! The request descriptor handed to the transport collaborator.
//!
//! One struct covers every operation. Fields an operation does not use stay
//! `None`/empty and are omitted from the serialized form, so the JSON a
//! transport sees is the minimal payload for that operation. Batch and
//! transaction descriptors nest one descriptor per member in `requests`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::{AttributeValue, Item};
use crate::operations::OperationKind;

/// A fully compiled, transport-ready request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestDescriptor {
    /// The operation to perform.
    pub operation: OperationKind,

    /// Target table. Empty for batch/transaction envelopes, whose members
    /// each name their own table.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub table_name: String,

    /// Secondary index to read from (query/scan only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// Primary key of the target item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Item>,

    /// Full item for puts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,

    /// Key condition for queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,

    /// Update clauses for updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_expression: Option<String>,

    /// Condition for conditional writes and condition checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,

    /// Post-key-match filter for queries and scans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,

    /// Attributes to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,

    /// Name placeholder to real attribute name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,

    /// Value placeholder to attribute value.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,

    /// Continuation key from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<Item>,

    /// Maximum number of items to evaluate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Strongly consistent read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,

    /// Ascending (`true`) or descending sort-key traversal for queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,

    /// Member requests of a batch or transaction, in caller order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<RequestDescriptor>,
}

impl RequestDescriptor {
    /// Create an empty descriptor for `operation` against `table_name`.
    #[must_use]
    pub fn new(operation: OperationKind, table_name: impl Into<String>) -> Self {
        Self {
            operation,
            table_name: table_name.into(),
            index_name: None,
            key: None,
            item: None,
            key_condition_expression: None,
            update_expression: None,
            condition_expression: None,
            filter_expression: None,
            projection_expression: None,
            expression_attribute_names: HashMap::new(),
            expression_attribute_values: HashMap::new(),
            exclusive_start_key: None,
            limit: None,
            consistent_read: None,
            scan_index_forward: None,
            requests: Vec::new(),
        }
    }

    /// Returns every expression string present on this descriptor.
    #[must_use]
    pub fn expressions(&self) -> Vec<&str> {
        [
            &self.key_condition_expression,
            &self.update_expression,
            &self.condition_expression,
            &self.filter_expression,
            &self.projection_expression,
        ]
        .into_iter()
        .filter_map(|e| e.as_deref())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_omit_unused_fields() {
        let mut req = RequestDescriptor::new(OperationKind::GetItem, "users");
        req.key = Some(HashMap::from([(
            "id".to_owned(),
            AttributeValue::S("u1".to_owned()),
        )]));
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"Operation":"GetItem","TableName":"users","Key":{"id":{"S":"u1"}}}"#
        );
    }

    #[test]
    fn test_should_roundtrip_nested_requests() {
        let mut envelope = RequestDescriptor::new(OperationKind::TransactWriteItems, "");
        let mut check = RequestDescriptor::new(OperationKind::ConditionCheck, "orders");
        check.condition_expression = Some("attribute_exists(#n0)".to_owned());
        check
            .expression_attribute_names
            .insert("#n0".to_owned(), "id".to_owned());
        envelope.requests.push(check);

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("TableName\":\"\""));
        let back: RequestDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_should_list_present_expressions() {
        let mut req = RequestDescriptor::new(OperationKind::Query, "t");
        req.key_condition_expression = Some("#n0 = :v0".to_owned());
        req.projection_expression = Some("#n1".to_owned());
        assert_eq!(req.expressions(), vec!["#n0 = :v0", "#n1"]);
    }
}
