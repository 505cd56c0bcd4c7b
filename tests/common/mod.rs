//! Common test utilities
//!
//! A `mockito` server stands in for the search engine; helpers here build
//! clients and services pointed at it, plus fixture namespaces and assets.

#![allow(dead_code)]

use metadata_discovery::api::AppState;
use metadata_discovery::config::IdentityConfig;
use metadata_discovery::models::{Asset, AssetType};
use metadata_discovery::namespace::{
    InMemoryNamespaceStore, Namespace, NamespaceResolver, NamespaceService, NamespaceState,
    NamespaceStore,
};
use metadata_discovery::search::{
    DiscoveryRepository, DiscoveryService, EngineClient, SearchConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Start a fake engine and a config pointing at it
pub async fn engine() -> (mockito::ServerGuard, SearchConfig) {
    let server = mockito::Server::new_async().await;
    let config = SearchConfig {
        brokers: server.url(),
        ..Default::default()
    };
    (server, config)
}

pub fn client(config: &SearchConfig) -> EngineClient {
    EngineClient::new(config).unwrap()
}

pub fn repository(config: &SearchConfig) -> DiscoveryRepository {
    DiscoveryRepository::new(client(config), config)
}

pub fn discovery(config: &SearchConfig) -> DiscoveryService {
    DiscoveryService::new(client(config), config)
}

/// Namespace with a stable ID derived from `seed`
pub fn tenant(name: &str, state: NamespaceState, seed: u128) -> Namespace {
    Namespace::new(name, state).with_id(Uuid::from_u128(seed))
}

pub fn topic(id: &str, name: &str) -> Asset {
    Asset::new(
        id,
        format!("urn:kafka:{}", name),
        AssetType::Topic,
        "kafka",
        name,
    )
}

/// `_search` response body with the given sources as hits
pub fn hits(sources: Vec<Value>) -> String {
    let hits: Vec<Value> = sources
        .into_iter()
        .map(|source| {
            json!({
                "_index": "kafka",
                "_id": source.get("id").or_else(|| source.get("urn")).cloned(),
                "_score": 1.0,
                "_source": source
            })
        })
        .collect();
    json!({ "took": 2, "timed_out": false, "hits": { "hits": hits } }).to_string()
}

pub fn acknowledged() -> &'static str {
    r#"{"acknowledged":true}"#
}

/// Application state over an in-memory directory seeded with `namespaces`
pub async fn app_state(config: &SearchConfig, namespaces: &[Namespace]) -> AppState {
    let store = Arc::new(InMemoryNamespaceStore::new());
    for namespace in namespaces {
        store.create(namespace).await.unwrap();
    }

    let repository = Arc::new(repository(config).with_directory(store.clone()));
    let service = Arc::new(
        NamespaceService::new(store.clone(), repository.clone())
            .with_locks(repository.locks().clone()),
    );
    let resolver = NamespaceResolver::new(store, IdentityConfig::default());

    AppState::new(Arc::new(discovery(config)), repository, service, resolver)
}
