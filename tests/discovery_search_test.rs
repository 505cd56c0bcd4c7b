//! Search, suggest and type counts against a fake search engine

mod common;

use common::*;
use metadata_discovery::error::AppError;
use metadata_discovery::models::{AssetType, SearchRequest};
use metadata_discovery::namespace::NamespaceState;
use metadata_discovery::search::{SearchConfig, SearchError};
use mockito::Matcher;
use serde_json::json;

const DEFAULT_SOURCE: &str = "id,urn,type,service,name,description,data,labels,created_at,updated_at";

#[tokio::test]
async fn test_search_targets_namespace_alias() {
    let (mut server, config) = engine().await;
    let ns = tenant("acme", NamespaceState::Shared, 21);

    let search = server
        .mock("POST", "/tenant-alias-acme/_search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("size".into(), "200".into()),
            Matcher::UrlEncoded("from".into(), "0".into()),
            Matcher::UrlEncoded("ignore_unavailable".into(), "true".into()),
            Matcher::UrlEncoded("_source_includes".into(), DEFAULT_SOURCE.into()),
        ]))
        .match_body(Matcher::PartialJson(json!({
            "min_score": 0.01,
            "query": {"bool": {"filter": [{"terms": {"service.keyword": ["kafka", "rabbitmq"]}}]}}
        })))
        .with_status(200)
        .with_body(hits(vec![
            json!({"id": "a-1", "urn": "urn:kafka:orders", "type": "topic", "service": "kafka",
                   "name": "orders", "description": "order events", "labels": {"team": "payments"}}),
            json!({"urn": "urn:rabbitmq:refunds", "type": "topic", "service": "rabbitmq",
                   "name": "refunds"}),
        ]))
        .expect(1)
        .create_async()
        .await;

    let request = SearchRequest::new("ordr")
        .with_filter("service", ["kafka", "rabbitmq"])
        .with_namespace(ns);
    let results = discovery(&config).search(&request).await.unwrap();

    search.assert_async().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "a-1");
    assert_eq!(results[0].title, "orders");
    assert_eq!(results[0].result_type, "topic");
    assert_eq!(results[0].labels["team"], "payments");
    // Documents indexed before IDs existed surface their URN
    assert_eq!(results[1].id, "urn:rabbitmq:refunds");
}

#[tokio::test]
async fn test_search_honours_size_offset_and_fields() {
    let (mut server, config) = engine().await;

    let search = server
        .mock("POST", "/tenant-alias-default/_search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("size".into(), "5".into()),
            Matcher::UrlEncoded("from".into(), "10".into()),
            Matcher::UrlEncoded("_source_includes".into(), "id,name".into()),
        ]))
        .match_body(Matcher::PartialJson(json!({
            "query": {"function_score": {"score_mode": "sum"}}
        })))
        .with_status(200)
        .with_body(hits(vec![]))
        .create_async()
        .await;

    let request = SearchRequest::new("orders")
        .with_rank_by("data.usage_count")
        .with_max_results(5)
        .with_offset(10)
        .with_include_fields(vec!["id".to_string(), "name".to_string()]);
    let results = discovery(&config).search(&request).await.unwrap();

    assert!(results.is_empty());
    search.assert_async().await;
}

#[tokio::test]
async fn test_search_error_reason_is_extracted() {
    let (mut server, config) = engine().await;

    let _mock = server
        .mock("POST", "/tenant-alias-default/_search")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(
            r#"{"error":{"root_cause":[],"type":"search_phase_execution_exception","reason":"all shards failed"},"status":400}"#,
        )
        .create_async()
        .await;

    let err = discovery(&config)
        .search(&SearchRequest::new("orders"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Response { op: "Search", .. }));

    let app: AppError = err.into();
    match app {
        AppError::Internal(message) => {
            assert!(message.starts_with("Search:"));
            assert!(message.contains("all shards failed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_engine_is_transport_error() {
    let config = SearchConfig {
        brokers: "http://127.0.0.1:1".to_string(),
        request_timeout_secs: 1,
        ..Default::default()
    };

    let err = discovery(&config)
        .search(&SearchRequest::new("orders"))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport { op: "Search", .. }));
}

#[tokio::test]
async fn test_suggest_returns_completions() {
    let (mut server, config) = engine().await;
    let ns = tenant("acme", NamespaceState::Dedicated, 22);

    let suggest = server
        .mock("POST", "/tenant-alias-acme/_search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("size".into(), "0".into()),
            Matcher::UrlEncoded("ignore_unavailable".into(), "true".into()),
        ]))
        .match_body(Matcher::Json(json!({"suggest": {"name-phrase-suggest": {
            "text": "ord",
            "completion": {"field": "name.suggest", "skip_duplicates": true, "size": 5}
        }}})))
        .with_status(200)
        .with_body(
            json!({
                "hits": {"hits": []},
                "suggest": {"name-phrase-suggest": [{
                    "text": "ord", "offset": 0, "length": 3,
                    "options": [{"text": "orders", "_score": 1.0}, {"text": "order_items", "_score": 1.0}]
                }]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let suggestions = discovery(&config).suggest("ord", &ns).await.unwrap();
    assert_eq!(suggestions, vec!["orders", "order_items"]);
    suggest.assert_async().await;
}

#[tokio::test]
async fn test_suggest_without_suggester_key_is_contract_error() {
    let (mut server, config) = engine().await;
    let ns = tenant("acme", NamespaceState::Shared, 21);

    let _mock = server
        .mock("POST", "/tenant-alias-acme/_search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"hits":{"hits":[]},"suggest":{"other":[]}}"#)
        .create_async()
        .await;

    let err = discovery(&config).suggest("ord", &ns).await.unwrap_err();
    assert!(matches!(err, SearchError::Contract { op: "Suggest", .. }));
    assert!(matches!(AppError::from(err), AppError::Internal(_)));
}

#[tokio::test]
async fn test_counts_by_type_reports_every_supported_type() {
    let (mut server, config) = engine().await;
    let ns = tenant("acme", NamespaceState::Shared, 21);

    let aggregate = server
        .mock("POST", "/tenant-alias-acme/_search")
        .match_query(Matcher::UrlEncoded("size".into(), "0".into()))
        .match_body(Matcher::PartialJson(json!({
            "aggs": {"aggregation_name": {"terms": {
                "field": "type.keyword",
                "size": 7,
                "include": ["table", "job", "dashboard", "topic", "feature_table", "application", "model"]
            }}}
        })))
        .with_status(200)
        .with_body(
            json!({
                "hits": {"hits": []},
                "aggregations": {"aggregation_name": {"buckets": [
                    {"key": "table", "doc_count": 4},
                    {"key": "topic", "doc_count": 2},
                    {"key": "spreadsheet", "doc_count": 9}
                ]}}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let counts = discovery(&config).counts_by_type(&ns).await.unwrap();
    aggregate.assert_async().await;

    assert_eq!(counts.len(), AssetType::SUPPORTED.len());
    assert_eq!(counts[&AssetType::Table], 4);
    assert_eq!(counts[&AssetType::Topic], 2);
    assert_eq!(counts[&AssetType::Job], 0);
    assert_eq!(counts[&AssetType::FeatureTable], 0);
    assert!(!counts.contains_key(&AssetType::Unknown));
}
