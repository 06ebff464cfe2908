//! Batches and transactions through the mapper.

#[cfg(test)]
mod tests {
    use dynamodel_core::{
        BatchGet, BatchWrite, ConditionCheck, DeleteItem, MapperError, Path, PutItem, Record,
        TransactWrite, Value,
    };
    use dynamodel_model::{AttributeValue, Item, OperationKind};

    use crate::{events_schema, mapper, users_schema};

    fn user(id: &str) -> Record {
        Record::from([
            ("id".to_owned(), Value::from(id)),
            ("name".to_owned(), Value::from(format!("user {id}"))),
        ])
    }

    #[tokio::test]
    async fn test_should_write_and_read_batches() {
        let mapper = mapper();
        let users = users_schema();
        let write = (0..5).fold(BatchWrite::new(), |b, i| {
            b.put(users.clone(), user(&i.to_string()))
        });
        let result = mapper.batch_write(&write).await.unwrap();
        assert!(result.is_complete());

        let get = BatchGet::new()
            .get(users.clone(), users.key("1", None).unwrap())
            .get(users.clone(), users.key("3", None).unwrap())
            .get(users.clone(), users.key("missing", None).unwrap());
        let result = mapper.batch_get(&get).await.unwrap();
        assert_eq!(result.records["users"].len(), 2);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_should_surface_unprocessed_writes() {
        let mapper = mapper();
        mapper.transport().limit_batch_writes(2);
        let users = users_schema();
        let write = (0..4).fold(BatchWrite::new(), |b, i| {
            b.put(users.clone(), user(&i.to_string()))
        });

        let result = mapper.batch_write(&write).await.unwrap();
        assert!(!result.is_complete());
        assert_eq!(result.unprocessed_items["users"].len(), 2);
        assert_eq!(mapper.transport().items("users").len(), 2);
    }

    #[tokio::test]
    async fn test_should_reject_oversized_batch_before_sending() {
        let mapper = mapper();
        let users = users_schema();
        let write = (0..26).fold(BatchWrite::new(), |b, i| {
            b.put(users.clone(), user(&i.to_string()))
        });

        let err = mapper.batch_write(&write).await.unwrap_err();
        assert!(matches!(
            err,
            MapperError::BatchTooLarge {
                operation: OperationKind::BatchWriteItem,
                limit: 25,
                count: 26
            }
        ));
        assert!(mapper.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_put_and_delete_of_same_key() {
        let mapper = mapper();
        let users = users_schema();
        let write = BatchWrite::new()
            .put(users.clone(), user("1"))
            .delete(users.clone(), users.key("1", None).unwrap());
        assert!(matches!(
            mapper.batch_write(&write).await,
            Err(MapperError::ConflictingBatchOperation { .. })
        ));
    }

    #[tokio::test]
    async fn test_should_reject_delete_of_put_key_spelled_differently() {
        let mapper = mapper();
        let events = events_schema();
        let event = Record::from([
            ("userId".to_owned(), Value::from("1")),
            ("createdAt".to_owned(), Value::from(10)),
        ]);
        let key = Item::from([
            ("userId".to_owned(), AttributeValue::S("1".to_owned())),
            ("createdAt".to_owned(), AttributeValue::N("10.00".to_owned())),
        ]);
        let write = BatchWrite::new()
            .put(events.clone(), event)
            .delete(events, key);
        assert!(matches!(
            mapper.batch_write(&write).await,
            Err(MapperError::ConflictingBatchOperation { .. })
        ));
        assert!(mapper.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_should_run_transaction_across_tables() {
        let mapper = mapper();
        let users = users_schema();
        let events = events_schema();
        mapper.put(&PutItem::new(users.clone(), user("1"))).await.unwrap();

        let event = Record::from([
            ("userId".to_owned(), Value::from("1")),
            ("createdAt".to_owned(), Value::from(10)),
        ]);
        let tx = TransactWrite::new()
            .condition_check(ConditionCheck::new(
                users.clone(),
                users.key("1", None).unwrap(),
                Path::new("id").exists(),
            ))
            .put(PutItem::new(events.clone(), event))
            .delete(DeleteItem::new(users.clone(), users.key("2", None).unwrap()));
        let result = mapper.transact(&tx).await.unwrap();
        assert!(result.is_complete());
        assert_eq!(mapper.transport().items("events").len(), 1);

        let sent = mapper.transport().sent();
        let envelope = sent.last().unwrap();
        assert_eq!(envelope.operation, OperationKind::TransactWriteItems);
        assert_eq!(envelope.requests.len(), 3);
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_transaction_key() {
        let mapper = mapper();
        let users = users_schema();
        let tx = TransactWrite::new()
            .put(PutItem::new(users.clone(), user("1")))
            .delete(DeleteItem::new(users.clone(), users.key("1", None).unwrap()));
        assert!(matches!(
            mapper.transact(&tx).await,
            Err(MapperError::DuplicateTransactionKey { .. })
        ));
        assert!(mapper.transport().sent().is_empty());
    }
}
