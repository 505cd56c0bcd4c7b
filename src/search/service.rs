//! Search execution: relevance search, suggestions and per-type counts

use crate::models::{self, AssetType, SearchRequest};
use crate::namespace::Namespace;
use crate::search::alias::alias_name;
use crate::search::client::{EngineClient, SearchParams};
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{
    suggest_query, type_aggregation_query, QueryBuilder, SUGGESTER_NAME, TYPE_AGGREGATION_NAME,
};
use std::collections::HashMap;

/// Source fields returned when a request does not name its own
pub const DEFAULT_SOURCE_FIELDS: [&str; 10] = [
    "id",
    "urn",
    "type",
    "service",
    "name",
    "description",
    "data",
    "labels",
    "created_at",
    "updated_at",
];

/// Read side of the discovery subsystem. Every query targets the
/// requesting namespace's alias.
#[derive(Clone)]
pub struct DiscoveryService {
    client: EngineClient,
    builder: QueryBuilder,
    max_results: usize,
}

impl DiscoveryService {
    pub fn new(client: EngineClient, config: &SearchConfig) -> Self {
        Self {
            client,
            builder: QueryBuilder::new(config.min_score),
            max_results: config.max_results,
        }
    }

    /// Run a full-text search
    pub async fn search(&self, request: &SearchRequest) -> SearchResult<Vec<models::SearchResult>> {
        if request.text.trim().is_empty() {
            return Err(SearchError::EmptySearchText);
        }
        let alias = alias_name(&request.namespace)?;

        let size = if request.max_results == 0 {
            self.max_results
        } else {
            request.max_results
        };
        let source_includes = if request.include_fields.is_empty() {
            DEFAULT_SOURCE_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            request.include_fields.clone()
        };
        let params = SearchParams {
            size: Some(size),
            from: Some(request.offset),
            source_includes,
            ignore_unavailable: true,
        };

        let body = self.builder.build(request);
        let response = self.client.search("Search", &alias, &body, &params).await?;

        tracing::debug!(
            alias = %alias,
            hits = response.hits.hits.len(),
            "Search completed"
        );
        Ok(response
            .hits
            .hits
            .into_iter()
            .map(|hit| to_search_result(hit.source))
            .collect())
    }

    /// Prefix completions of asset names, at most five and deduplicated
    pub async fn suggest(&self, text: &str, namespace: &Namespace) -> SearchResult<Vec<String>> {
        const OP: &str = "Suggest";
        if text.trim().is_empty() {
            return Err(SearchError::EmptySearchText);
        }
        let alias = alias_name(namespace)?;

        let params = SearchParams {
            size: Some(0),
            ignore_unavailable: true,
            ..Default::default()
        };
        let response = self
            .client
            .search(OP, &alias, &suggest_query(text), &params)
            .await?;

        let entries = response
            .suggest
            .and_then(|mut suggest| suggest.remove(SUGGESTER_NAME))
            .ok_or_else(|| SearchError::Contract {
                op: OP,
                message: format!("suggester key {:?} does not exist", SUGGESTER_NAME),
            })?;

        Ok(entries
            .into_iter()
            .flat_map(|entry| entry.options)
            .map(|option| option.text)
            .collect())
    }

    /// Document count per supported type within `namespace`.
    ///
    /// Every supported type is present, with zero when it has no documents.
    /// Bucket keys outside the supported set are dropped.
    pub async fn counts_by_type(&self, namespace: &Namespace) -> SearchResult<HashMap<AssetType, u64>> {
        const OP: &str = "CountsByType";
        let alias = alias_name(namespace)?;

        let params = SearchParams {
            size: Some(0),
            ignore_unavailable: true,
            ..Default::default()
        };
        let response = self
            .client
            .search(OP, &alias, &type_aggregation_query(), &params)
            .await?;

        // No reachable index yields no aggregation at all
        let aggregation = response
            .aggregations
            .and_then(|mut aggs| aggs.remove(TYPE_AGGREGATION_NAME))
            .unwrap_or_default();

        let mut counts: HashMap<AssetType, u64> =
            AssetType::SUPPORTED.iter().map(|t| (*t, 0)).collect();
        for bucket in aggregation.buckets {
            match AssetType::parse_supported(&bucket.key) {
                Some(asset_type) => *counts.entry(asset_type).or_default() += bucket.doc_count,
                None => tracing::debug!(key = %bucket.key, "Dropping unsupported type bucket"),
            }
        }
        Ok(counts)
    }
}

fn to_search_result(asset: models::Asset) -> models::SearchResult {
    let id = asset.effective_id().to_string();
    models::SearchResult {
        result_type: asset.asset_type.to_string(),
        id,
        urn: asset.urn,
        description: asset.description,
        title: asset.name,
        service: asset.service,
        labels: asset.labels,
        data: asset.data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Asset;

    #[test]
    fn test_legacy_document_id_falls_back_to_urn() {
        let asset = Asset::new("", "urn:kafka:orders", AssetType::Topic, "kafka", "orders");
        let result = to_search_result(asset);
        assert_eq!(result.id, "urn:kafka:orders");
        assert_eq!(result.title, "orders");
        assert_eq!(result.result_type, "topic");
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_request() {
        let server = mockito::Server::new_async().await;
        let config = SearchConfig {
            brokers: server.url(),
            ..Default::default()
        };
        let service = DiscoveryService::new(EngineClient::new(&config).unwrap(), &config);

        let err = service.search(&SearchRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, SearchError::EmptySearchText));

        let mut request = SearchRequest::new("orders");
        request.namespace.name = String::new();
        let err = service.search(&request).await.unwrap_err();
        assert!(matches!(err, SearchError::EmptyNamespace));
    }
}
