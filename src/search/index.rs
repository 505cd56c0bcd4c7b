//! Search index management

use crate::search::alias::{DEDICATED_INDEX_PREFIX, TENANT_ALIAS_PREFIX};
use crate::search::client::EngineClient;
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::schema::{self, UNIVERSE_ALIAS};
use reqwest::StatusCode;

/// Validate a service name and return the physical index name it maps to.
///
/// Names are lowercased. The aggregate alias and the prefixes used for
/// tenant indices and aliases cannot be claimed by a service.
pub fn service_index_name(service: &str) -> SearchResult<String> {
    let name = service.trim().to_lowercase();
    if name.is_empty() {
        return Err(SearchError::EmptyService);
    }
    if name == UNIVERSE_ALIAS
        || name.starts_with(DEDICATED_INDEX_PREFIX)
        || name.starts_with(TENANT_ALIAS_PREFIX)
    {
        return Err(SearchError::ReservedIndexName(name));
    }
    Ok(name)
}

/// Ensures correctly mapped indices exist before documents are written to them
#[derive(Clone)]
pub struct IndexManager {
    client: EngineClient,
    shard_count: u32,
}

impl IndexManager {
    pub fn new(client: EngineClient, config: &SearchConfig) -> Self {
        Self {
            client,
            shard_count: config.shard_count,
        }
    }

    /// Ensure the index for `service` exists with the current mapping.
    ///
    /// Returns `true` when the index was created by this call.
    pub async fn ensure_index(&self, service: &str) -> SearchResult<bool> {
        let index = service_index_name(service)?;
        self.ensure_physical(&index).await
    }

    /// Same as [`ensure_index`](Self::ensure_index) for an already derived
    /// physical index name, shared or dedicated.
    pub(crate) async fn ensure_physical(&self, index: &str) -> SearchResult<bool> {
        if self.client.index_exists(index).await? {
            tracing::debug!(index = %index, "Index exists, re-applying mapping");
            self.client
                .put_mapping(index, &schema::index_mapping())
                .await?;
            return Ok(false);
        }

        match self
            .client
            .create_index(index, &schema::create_index_body(self.shard_count))
            .await
        {
            Ok(()) => {
                tracing::info!(index = %index, shards = self.shard_count, "Created search index");
                Ok(true)
            }
            // Lost a creation race with a concurrent writer
            Err(SearchError::Response { status, reason, .. })
                if status == StatusCode::BAD_REQUEST
                    && reason.contains("already exists") =>
            {
                tracing::debug!(index = %index, "Index created concurrently");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_index_name() {
        assert_eq!(service_index_name("BigQuery").unwrap(), "bigquery");
        assert_eq!(service_index_name(" kafka ").unwrap(), "kafka");
    }

    #[test]
    fn test_reserved_names_rejected() {
        assert!(matches!(
            service_index_name("universe"),
            Err(SearchError::ReservedIndexName(_))
        ));
        assert!(matches!(
            service_index_name("Universe"),
            Err(SearchError::ReservedIndexName(_))
        ));
        assert!(matches!(
            service_index_name("dedicated-acme-kafka"),
            Err(SearchError::ReservedIndexName(_))
        ));
        assert!(matches!(
            service_index_name("tenant-alias-acme"),
            Err(SearchError::ReservedIndexName(_))
        ));
        assert!(matches!(service_index_name("  "), Err(SearchError::EmptyService)));
    }

    #[tokio::test]
    async fn test_existing_index_gets_mapping_update() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/kafka")
            .with_status(200)
            .create_async()
            .await;
        let mapping = server
            .mock("PUT", "/kafka/_mapping")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "properties": {"namespace_id": {"type": "keyword"}}
            })))
            .with_status(200)
            .with_body(r#"{"acknowledged":true}"#)
            .create_async()
            .await;

        let config = SearchConfig {
            brokers: server.url(),
            ..Default::default()
        };
        let manager = IndexManager::new(EngineClient::new(&config).unwrap(), &config);

        let created = manager.ensure_index("Kafka").await.unwrap();
        assert!(!created);
        head.assert_async().await;
        mapping.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_index_is_created_under_universe() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/kafka")
            .with_status(404)
            .create_async()
            .await;
        let create = server
            .mock("PUT", "/kafka")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "settings": {"number_of_shards": 3},
                "aliases": {"universe": {}}
            })))
            .with_status(200)
            .with_body(r#"{"acknowledged":true}"#)
            .create_async()
            .await;

        let config = SearchConfig {
            brokers: server.url(),
            shard_count: 3,
            ..Default::default()
        };
        let manager = IndexManager::new(EngineClient::new(&config).unwrap(), &config);

        assert!(manager.ensure_index("kafka").await.unwrap());
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_reserved_name_makes_no_request() {
        let server = mockito::Server::new_async().await;
        let config = SearchConfig {
            brokers: server.url(),
            ..Default::default()
        };
        let manager = IndexManager::new(EngineClient::new(&config).unwrap(), &config);

        let err = manager.ensure_index("universe").await.unwrap_err();
        assert!(err.is_validation());
    }
}
