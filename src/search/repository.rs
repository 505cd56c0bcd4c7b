//! Asset document writes and namespace alias synchronisation

use crate::error::Result;
use crate::models::Asset;
use crate::namespace::{Namespace, NamespaceDirectory, NamespaceDiscovery, NamespaceLocks};
use crate::search::alias::{
    alias_name, service_from_index, AliasRouter, BindingStrategy, IndexBinding,
    DEDICATED_INDEX_PREFIX,
};
use crate::search::client::EngineClient;
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{service_index_name, IndexManager};
use crate::search::schema::UNIVERSE_ALIAS;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Indexes and removes asset documents
#[derive(Clone)]
pub struct DiscoveryRepository {
    client: EngineClient,
    indices: IndexManager,
    router: AliasRouter,
    locks: NamespaceLocks,
    /// Source of the current namespace state for write-time binding
    directory: Option<Arc<dyn NamespaceDirectory>>,
}

impl DiscoveryRepository {
    pub fn new(client: EngineClient, config: &SearchConfig) -> Self {
        Self {
            indices: IndexManager::new(client.clone(), config),
            router: AliasRouter::new(client.clone()),
            client,
            locks: NamespaceLocks::new(),
            directory: None,
        }
    }

    /// Re-read namespaces from `directory` before binding on write
    pub fn with_directory(mut self, directory: Arc<dyn NamespaceDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Locks taken around write-time rebinds; share them with the namespace service
    pub fn locks(&self) -> &NamespaceLocks {
        &self.locks
    }

    pub fn indices(&self) -> &IndexManager {
        &self.indices
    }

    pub fn router(&self) -> &AliasRouter {
        &self.router
    }

    /// Create or replace `asset` on behalf of `namespace`.
    ///
    /// The target index is created if missing and the namespace alias bound on
    /// it before the write. Binding happens under the namespace lock against
    /// the stored namespace state, so a stale `namespace` cannot undo a
    /// concurrent rebind. The document is tagged with the namespace ID and
    /// visible to searches once this returns.
    pub async fn upsert(&self, namespace: &Namespace, asset: &Asset) -> SearchResult<()> {
        if asset.id.is_empty() {
            return Err(SearchError::EmptyId);
        }
        if !asset.asset_type.is_valid() {
            return Err(SearchError::UnknownType(asset.asset_type.to_string()));
        }
        alias_name(namespace)?;
        service_index_name(&asset.service)?;

        let lock = self.locks.for_namespace(namespace.id);
        let guard = lock.lock().await;
        let namespace = self.current(namespace).await?;
        let binding = IndexBinding::for_namespace(&namespace, &asset.service)?;
        let created = self.indices.ensure_physical(&binding.index).await?;
        if created || !self.router.is_bound(&binding).await? {
            self.router.bind(&namespace, &binding.service).await?;
        }
        drop(guard);

        let body = upsert_body(&namespace, &binding, asset)?;
        self.client.bulk(body, true).await?;

        tracing::debug!(
            id = %asset.id,
            index = %binding.index,
            namespace_id = %namespace.id,
            "Upserted asset document"
        );
        Ok(())
    }

    async fn current(&self, namespace: &Namespace) -> SearchResult<Namespace> {
        let Some(directory) = &self.directory else {
            return Ok(namespace.clone());
        };
        match directory.get_by_id(namespace.id).await {
            Ok(stored) => Ok(stored.unwrap_or_else(|| namespace.clone())),
            Err(err) => Err(SearchError::Directory {
                op: "Upsert",
                message: err.to_string(),
            }),
        }
    }

    /// Remove the document with `asset_id` from every discovery index
    pub async fn delete(&self, asset_id: &str) -> SearchResult<()> {
        if asset_id.is_empty() {
            return Err(SearchError::EmptyId);
        }
        self.delete_matching(json!({ "query": { "term": { "_id": asset_id } } }))
            .await
    }

    /// Remove every document carrying `urn` from every discovery index
    pub async fn delete_by_urn(&self, urn: &str) -> SearchResult<()> {
        if urn.is_empty() {
            return Err(SearchError::EmptyUrn);
        }
        self.delete_matching(json!({ "query": { "term": { "urn.keyword": urn } } }))
            .await
    }

    async fn delete_matching(&self, query: Value) -> SearchResult<()> {
        let deleted = self
            .client
            .delete_by_query(UNIVERSE_ALIAS, &query, true)
            .await?;
        tracing::debug!(deleted, query = %query, "Deleted asset documents");
        Ok(())
    }

    /// Rebind `namespace`'s alias on every service it can currently reach.
    ///
    /// Services are those already under the alias plus, for shared tenants,
    /// every shared service index. Missing target indices are created first.
    /// The caller holds the namespace lock.
    pub async fn sync_namespace(&self, namespace: &Namespace) -> SearchResult<usize> {
        let alias = alias_name(namespace)?;

        let mut services: BTreeSet<String> = self
            .client
            .alias_indices(&alias)
            .await?
            .iter()
            .filter_map(|index| service_from_index(namespace, index))
            .collect();

        if BindingStrategy::from(namespace.state) == BindingStrategy::Shared {
            services.extend(
                self.client
                    .alias_indices(UNIVERSE_ALIAS)
                    .await?
                    .into_iter()
                    .filter(|index| !index.starts_with(DEDICATED_INDEX_PREFIX)),
            );
        }

        for service in &services {
            let binding = IndexBinding::for_namespace(namespace, service)?;
            self.indices.ensure_physical(&binding.index).await?;
            self.router.bind(namespace, service).await?;
        }

        tracing::info!(
            namespace_id = %namespace.id,
            alias = %alias,
            state = %namespace.state,
            services = services.len(),
            "Synchronised namespace bindings"
        );
        Ok(services.len())
    }
}

#[async_trait]
impl NamespaceDiscovery for DiscoveryRepository {
    async fn bind_namespace(&self, namespace: &Namespace) -> Result<()> {
        self.sync_namespace(namespace).await?;
        Ok(())
    }
}

fn upsert_body(namespace: &Namespace, binding: &IndexBinding, asset: &Asset) -> SearchResult<String> {
    const OP: &str = "Upsert";

    let mut action = json!({ "_index": binding.index, "_id": asset.id });
    if let Some(routing) = binding.write_routing() {
        action["routing"] = json!(routing);
    }

    let mut document = asset.clone();
    document.namespace_id = Some(namespace.id);

    let mut body = serde_json::to_string(&json!({ "index": action }))
        .map_err(SearchError::decode(OP))?;
    body.push('\n');
    body.push_str(&serde_json::to_string(&document).map_err(SearchError::decode(OP))?);
    body.push('\n');
    Ok(body)
}
