//! Transactional writes.

use std::collections::HashSet;
use std::sync::Arc;

use dynamodel_model::{Item, OperationKind, RequestDescriptor};

use crate::compiler::batch::check_size;
use crate::compiler::item::{DeleteItem, PutItem, UpdateItem};
use crate::compiler::{Intent, attach_placeholders, canonical_key, key_identity};
use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::expression::{Condition, ExpressionBuilder};
use crate::schema::TableSchema;

/// Assert a condition on an item without writing it.
#[derive(Debug, Clone)]
pub struct ConditionCheck {
    schema: Arc<TableSchema>,
    key: Item,
    condition: Condition,
}

impl ConditionCheck {
    /// Require `condition` to hold on the item with `key`.
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, key: Item, condition: Condition) -> Self {
        Self {
            schema,
            key,
            condition,
        }
    }

    fn descriptor(&self, builder: &mut ExpressionBuilder<'_>) -> MapperResult<RequestDescriptor> {
        let key = canonical_key(&self.schema, &self.key)?;
        let mut descriptor =
            RequestDescriptor::new(OperationKind::ConditionCheck, self.schema.table_name());
        descriptor.key = Some(key);
        descriptor.condition_expression = Some(builder.condition(&self.condition)?);
        Ok(descriptor)
    }
}

#[derive(Debug, Clone)]
enum TransactMember {
    Put(PutItem),
    Update(UpdateItem),
    Delete(DeleteItem),
    Check(ConditionCheck),
}

/// An ordered all-or-nothing group of writes, possibly across tables.
///
/// Atomicity is provided by the store. Compilation only checks the group
/// size and that no two members target the same item.
#[derive(Debug, Clone, Default)]
pub struct TransactWrite {
    members: Vec<TransactMember>,
}

impl TransactWrite {
    /// An empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a put, with its condition if any.
    #[must_use]
    pub fn put(mut self, put: PutItem) -> Self {
        self.members.push(TransactMember::Put(put));
        self
    }

    /// Add an update.
    #[must_use]
    pub fn update(mut self, update: UpdateItem) -> Self {
        self.members.push(TransactMember::Update(update));
        self
    }

    /// Add a delete.
    #[must_use]
    pub fn delete(mut self, delete: DeleteItem) -> Self {
        self.members.push(TransactMember::Delete(delete));
        self
    }

    /// Add a condition check.
    #[must_use]
    pub fn condition_check(mut self, check: ConditionCheck) -> Self {
        self.members.push(TransactMember::Check(check));
        self
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the transaction has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Intent for TransactWrite {
    fn compile(&self, config: &MapperConfig) -> MapperResult<RequestDescriptor> {
        check_size(
            OperationKind::TransactWriteItems,
            self.members.len(),
            config.max_transact_items,
        )?;

        let mut seen = HashSet::new();
        let mut envelope = RequestDescriptor::new(OperationKind::TransactWriteItems, "");
        for member in &self.members {
            let (schema, key) = match member {
                TransactMember::Put(put) => (put.schema(), put.target_key()?),
                TransactMember::Update(update) => (update.schema(), update.target_key()?),
                TransactMember::Delete(delete) => (delete.schema(), delete.target_key()?),
                TransactMember::Check(check) => {
                    (&check.schema, canonical_key(&check.schema, &check.key)?)
                }
            };
            if !seen.insert(key_identity(schema.table_name(), &key)) {
                return Err(MapperError::DuplicateTransactionKey {
                    table: schema.table_name().to_owned(),
                });
            }

            let mut builder = ExpressionBuilder::with_schema(schema);
            let mut descriptor = match member {
                TransactMember::Put(put) => put.descriptor(&mut builder)?,
                TransactMember::Update(update) => update.descriptor(&mut builder)?,
                TransactMember::Delete(delete) => delete.descriptor(&mut builder)?,
                TransactMember::Check(check) => check.descriptor(&mut builder)?,
            };
            attach_placeholders(&mut descriptor, builder);
            envelope.requests.push(descriptor);
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::fixtures::{event, events, users};
    use crate::expression::Path;
    use crate::marshal::Value;

    #[test]
    fn test_should_compile_ordered_members() {
        let key = events().key("u1", Some(Value::from(2))).unwrap();
        let tx = TransactWrite::new()
            .put(PutItem::new(events(), event("u1", 1)).condition(Path::new("userId").not_exists()))
            .update(UpdateItem::new(events(), key).action(Path::new("retryCount").add_number(1)))
            .condition_check(ConditionCheck::new(
                users(),
                users().key("u1", None).unwrap(),
                Path::new("id").exists(),
            ))
            .delete(DeleteItem::new(users(), users().key("u2", None).unwrap()));
        let desc = tx.compile(&MapperConfig::default()).unwrap();

        assert_eq!(desc.operation, OperationKind::TransactWriteItems);
        let ops: Vec<_> = desc.requests.iter().map(|r| r.operation).collect();
        assert_eq!(
            ops,
            vec![
                OperationKind::PutItem,
                OperationKind::UpdateItem,
                OperationKind::ConditionCheck,
                OperationKind::DeleteItem
            ]
        );
        // Each member numbers its placeholders from zero.
        assert_eq!(
            desc.requests[0].condition_expression.as_deref(),
            Some("attribute_not_exists(#n0)")
        );
        assert_eq!(desc.requests[1].update_expression.as_deref(), Some("ADD #n0 :v0"));
        assert_eq!(
            desc.requests[2].condition_expression.as_deref(),
            Some("attribute_exists(#n0)")
        );
    }

    #[test]
    fn test_should_reject_two_members_on_same_key() {
        let key = events().key("u1", Some(Value::from(1))).unwrap();
        let tx = TransactWrite::new()
            .put(PutItem::new(events(), event("u1", 1)))
            .update(UpdateItem::new(events(), key).action(Path::new("status").set("x")));
        let err = tx.compile(&MapperConfig::default()).unwrap_err();
        assert!(matches!(err, MapperError::DuplicateTransactionKey { ref table } if table == "events"));
    }

    #[test]
    fn test_should_reject_same_key_with_different_number_text() {
        let spelled = Item::from([
            ("userId".to_owned(), dynamodel_model::AttributeValue::S("u1".to_owned())),
            ("createdAt".to_owned(), dynamodel_model::AttributeValue::N("1e0".to_owned())),
        ]);
        let tx = TransactWrite::new()
            .put(PutItem::new(events(), event("u1", 1)))
            .delete(DeleteItem::new(events(), spelled));
        assert!(matches!(
            tx.compile(&MapperConfig::default()),
            Err(MapperError::DuplicateTransactionKey { .. })
        ));
    }

    #[test]
    fn test_should_reject_check_and_delete_on_same_key() {
        let key = users().key("u1", None).unwrap();
        let tx = TransactWrite::new()
            .condition_check(ConditionCheck::new(users(), key.clone(), Path::new("id").exists()))
            .delete(DeleteItem::new(users(), key));
        assert!(matches!(
            tx.compile(&MapperConfig::default()),
            Err(MapperError::DuplicateTransactionKey { .. })
        ));
    }

    #[test]
    fn test_should_enforce_transaction_limits() {
        assert!(matches!(
            TransactWrite::new().compile(&MapperConfig::default()),
            Err(MapperError::InvalidExpression { .. })
        ));

        let tx = (0..101).fold(TransactWrite::new(), |tx, i| {
            tx.delete(DeleteItem::new(users(), users().key(i.to_string(), None).unwrap()))
        });
        assert!(matches!(
            tx.compile(&MapperConfig::default()),
            Err(MapperError::BatchTooLarge {
                operation: OperationKind::TransactWriteItems,
                limit: 100,
                count: 101
            })
        ));
    }

    #[test]
    fn test_should_require_condition_in_check() {
        let tx = TransactWrite::new().condition_check(ConditionCheck::new(
            users(),
            users().key("u1", None).unwrap(),
            Condition::all(Vec::new()),
        ));
        assert!(matches!(
            tx.compile(&MapperConfig::default()),
            Err(MapperError::InvalidExpression { .. })
        ));
    }
}
