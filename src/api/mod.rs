pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::namespace::{NamespaceResolver, NamespaceService};
use crate::search::{DiscoveryRepository, DiscoveryService};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub discovery: Arc<DiscoveryService>,
    pub repository: Arc<DiscoveryRepository>,
    pub namespaces: Arc<NamespaceService>,
    pub resolver: NamespaceResolver,
}

impl AppState {
    pub fn new(
        discovery: Arc<DiscoveryService>,
        repository: Arc<DiscoveryRepository>,
        namespaces: Arc<NamespaceService>,
        resolver: NamespaceResolver,
    ) -> Self {
        Self {
            discovery,
            repository,
            namespaces,
            resolver,
        }
    }
}
