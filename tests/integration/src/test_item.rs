//! Single-item round trips through the mapper.

#[cfg(test)]
mod tests {
    use dynamodel_core::marshal::to_record;
    use dynamodel_core::{
        DeleteItem, GetItem, MapperError, Path, PutItem, Record, UpdateItem, Value,
    };
    use dynamodel_model::{AttributeValue, OperationKind};
    use serde::{Deserialize, Serialize};

    use crate::{mapper, users_schema};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        name: Option<String>,
        email: Option<String>,
    }

    fn ann() -> User {
        User {
            id: "u1".to_owned(),
            name: Some("Ann".to_owned()),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_should_save_and_get_typed_value() {
        let mapper = mapper();
        let schema = users_schema();
        mapper.save(&schema, &ann()).await.unwrap();

        let key = schema.key("u1", None).unwrap();
        let user: Option<User> = mapper.get_as(&GetItem::new(schema, key)).await.unwrap();
        assert_eq!(user, Some(ann()));
    }

    #[tokio::test]
    async fn test_should_return_none_for_missing_item() {
        let mapper = mapper();
        let schema = users_schema();
        let key = schema.key("nobody", None).unwrap();
        assert_eq!(mapper.get(&GetItem::new(schema, key)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_should_write_null_for_explicit_nullable_field() {
        let mapper = mapper();
        let schema = users_schema();
        let record = Record::from([
            ("id".to_owned(), Value::from("u2")),
            ("email".to_owned(), Value::Null),
        ]);
        mapper.put(&PutItem::new(schema, record)).await.unwrap();

        let stored = mapper.transport().items("users");
        assert_eq!(stored[0]["email"], AttributeValue::Null);
        assert!(!stored[0].contains_key("name"));
    }

    #[tokio::test]
    async fn test_should_reject_conditional_put_on_existing_item() {
        let mapper = mapper();
        let schema = users_schema();
        let record = to_record(&schema, &ann()).unwrap();
        let create = PutItem::new(schema, record).condition(Path::new("id").not_exists());

        mapper.put(&create).await.unwrap();
        let err = mapper.put(&create).await.unwrap_err();
        assert!(matches!(err, MapperError::Transport(_)));
        assert!(err.to_string().contains("ConditionalCheckFailedException"));
    }

    #[tokio::test]
    async fn test_should_update_then_delete() {
        let mapper = mapper();
        let schema = users_schema();
        mapper.save(&schema, &ann()).await.unwrap();

        let key = schema.key("u1", None).unwrap();
        let update = UpdateItem::new(schema.clone(), key.clone())
            .action(Path::new("name").set("Annie"))
            .action(Path::new("email").set("ann@example.com"));
        mapper.update(&update).await.unwrap();

        let record = mapper
            .get(&GetItem::new(schema.clone(), key.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["name"], Value::from("Annie"));
        assert_eq!(record["email"], Value::from("ann@example.com"));

        mapper
            .delete(&DeleteItem::new(schema.clone(), key.clone()))
            .await
            .unwrap();
        assert_eq!(mapper.get(&GetItem::new(schema, key)).await.unwrap(), None);

        let ops: Vec<_> = mapper
            .transport()
            .sent()
            .iter()
            .map(|r| r.operation)
            .collect();
        assert_eq!(
            ops,
            vec![
                OperationKind::PutItem,
                OperationKind::UpdateItem,
                OperationKind::GetItem,
                OperationKind::DeleteItem,
                OperationKind::GetItem
            ]
        );
    }

    #[tokio::test]
    async fn test_should_not_send_invalid_update() {
        let mapper = mapper();
        let schema = users_schema();
        let key = schema.key("u1", None).unwrap();
        let update = UpdateItem::new(schema, key).action(Path::new("id").set("u2"));

        let err = mapper.update(&update).await.unwrap_err();
        assert!(matches!(err, MapperError::InvalidExpression { .. }));
        assert!(mapper.transport().sent().is_empty());
    }
}
