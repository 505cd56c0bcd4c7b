//! Multi-tenant asset search backed by Elasticsearch
//!
//! This module owns everything the service does against the search engine:
//!
//! - **Index lifecycle**: one index per source service, created on first
//!   write with an identifier-aware analyzer and a completion field on `name`
//! - **Tenant aliases**: each namespace reads and writes through its own
//!   alias, filtered and routed for shared tenants, unfiltered over
//!   dedicated indices otherwise
//! - **Writes**: single-document upserts and broad deletes, refreshed so the
//!   change is visible to the next search
//! - **Queries**: weighted fuzzy text relevance, exact and fuzzy field
//!   filters, rank blending, completion suggestions and type counts
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐   ┌───────────────────────────┐
//! │   DiscoveryRepository    │   │     DiscoveryService      │
//! │  upsert / delete / sync  │   │ search / suggest / counts │
//! └────────────┬─────────────┘   └─────────────┬─────────────┘
//!              │                               │
//!   IndexManager + AliasRouter           QueryBuilder
//!              │                               │
//!              ▼                               ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                      EngineClient                        │
//! │      indices, aliases, _bulk, _delete_by_query, _search  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use metadata_discovery::models::{Asset, AssetType, SearchRequest};
//! use metadata_discovery::namespace::Namespace;
//! use metadata_discovery::search::{DiscoveryRepository, DiscoveryService, EngineClient, SearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchConfig::default();
//!     let client = EngineClient::new(&config)?;
//!     let repository = DiscoveryRepository::new(client.clone(), &config);
//!     let discovery = DiscoveryService::new(client, &config);
//!
//!     let namespace = Namespace::default_namespace();
//!     let asset = Asset::new("a-1", "urn:kafka:orders", AssetType::Topic, "kafka", "orders");
//!     repository.upsert(&namespace, &asset).await?;
//!
//!     let request = SearchRequest::new("ordr")
//!         .with_filter("service", ["kafka"])
//!         .with_namespace(namespace);
//!     let results = discovery.search(&request).await?;
//!     println!("Found {} assets", results.len());
//!
//!     Ok(())
//! }
//! ```

pub mod alias;
pub mod client;
pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod repository;
pub mod schema;
pub mod service;

pub use alias::{alias_name, AliasRouter, BindingStrategy, IndexBinding};
pub use client::{EngineClient, SearchParams};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use error::{SearchError, SearchResult};
pub use index::{service_index_name, IndexManager};
pub use query::QueryBuilder;
pub use repository::DiscoveryRepository;
pub use schema::UNIVERSE_ALIAS;
pub use service::DiscoveryService;
