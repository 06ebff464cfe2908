//! Query, scan and pagination through the mapper.

#[cfg(test)]
mod tests {
    use dynamodel_core::{MapperError, PageCursor, Path, PutItem, Query, Record, Scan, Value};
    use serde::Deserialize;

    use crate::{events_schema, mapper};

    async fn seed(mapper: &dynamodel_core::Mapper<std::sync::Arc<crate::MemoryTransport>>) {
        let schema = events_schema();
        for (user, at, status) in [
            ("u1", 100, "open"),
            ("u1", 150, "done"),
            ("u1", 200, "open"),
            ("u1", 250, "open"),
            ("u2", 120, "open"),
        ] {
            let record = Record::from([
                ("userId".to_owned(), Value::from(user)),
                ("createdAt".to_owned(), Value::from(at)),
                ("status".to_owned(), Value::from(status)),
            ]);
            mapper
                .put(&PutItem::new(schema.clone(), record))
                .await
                .unwrap();
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Event {
        user_id: String,
        created_at: i64,
    }

    #[tokio::test]
    async fn test_should_compile_and_run_partition_query() {
        let mapper = mapper();
        seed(&mapper).await;

        let query = Query::new(
            events_schema(),
            Path::new("userId").equals("u1") & Path::new("createdAt").between(100, 200),
        );
        let request = mapper.compile(&query).unwrap();
        assert_eq!(
            request.key_condition_expression.as_deref(),
            Some("#n0 = :v0 AND #n1 BETWEEN :v1 AND :v2")
        );
        assert!(request.filter_expression.is_none());
        assert_eq!(request.expression_attribute_names.len(), 2);
        assert_eq!(request.expression_attribute_values.len(), 3);

        let page = mapper.query_as::<Event>(&query).await.unwrap();
        assert!(page.records.iter().all(|e| e.user_id == "u1"));
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_should_page_with_cursor() {
        let mapper = mapper();
        seed(&mapper).await;

        let query = Query::partition(events_schema(), "u1").limit(3);
        let first = mapper.query(&query).await.unwrap();
        assert_eq!(first.count, 3);
        let cursor = first.next_cursor.clone().unwrap();

        // Cursors survive a trip through plain text.
        let resumed = PageCursor::new(cursor.to_string());
        let second = mapper.query(&query.clone().cursor(resumed)).await.unwrap();
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0]["createdAt"], Value::from(250));
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_should_collect_all_pages() {
        let mapper = mapper();
        seed(&mapper).await;

        let query = Query::partition(events_schema(), "u1").limit(2).descending();
        let events: Vec<Event> = mapper.query_all_as(&query).await.unwrap();
        let times: Vec<_> = events.iter().map(|e| e.created_at).collect();
        assert_eq!(times, vec![250, 200, 150, 100]);
        assert_eq!(mapper.transport().sent().iter().filter(|r| r.limit == Some(2)).count(), 2);

        let all = mapper.scan_all(&Scan::new(events_schema()).limit(2)).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn test_should_reject_invalid_cursor_before_sending() {
        let mapper = mapper();
        let query = Query::partition(events_schema(), "u1").cursor(PageCursor::new("not-a-cursor"));
        let err = mapper.query(&query).await.unwrap_err();
        assert!(matches!(err, MapperError::InvalidCursor { .. }));
        assert!(mapper.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_unsupported_sort_key_operator() {
        let mapper = mapper();
        let query =
            Query::partition(events_schema(), "u1").sort_key(Path::new("createdAt").not_equals(5));
        assert!(matches!(
            mapper.query(&query).await,
            Err(MapperError::UnsupportedKeyCondition { .. })
        ));
    }
}
