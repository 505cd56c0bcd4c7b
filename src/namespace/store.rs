use crate::error::{AppError, Result};
use crate::namespace::Namespace;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Read side of the namespace directory, used by request-time resolution
#[async_trait]
pub trait NamespaceDirectory: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Namespace>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Namespace>>;
}

/// Persistence for namespaces
#[async_trait]
pub trait NamespaceStore: NamespaceDirectory {
    async fn create(&self, namespace: &Namespace) -> Result<Uuid>;

    async fn update(&self, namespace: &Namespace) -> Result<()>;

    async fn list(&self) -> Result<Vec<Namespace>>;
}

/// Look a namespace up by UUID when `urn` parses as one, otherwise by name.
///
/// A well-formed identifier with no matching namespace is `NotFound`.
pub async fn find_by_urn(directory: &dyn NamespaceDirectory, urn: &str) -> Result<Namespace> {
    let found = match Uuid::parse_str(urn) {
        Ok(id) => directory.get_by_id(id).await?,
        Err(_) => directory.get_by_name(urn).await?,
    };

    found.ok_or_else(|| AppError::NotFound(format!("namespace {:?} not found", urn)))
}

/// In-memory namespace store (for single-node deployments and testing).
///
/// Names are unique ignoring case: aliases and dedicated indices are derived
/// from the lowercased name, so "Acme" and "acme" would share them.
#[derive(Clone, Default)]
pub struct InMemoryNamespaceStore {
    namespaces: Arc<DashMap<Uuid, Namespace>>,
    /// Keyed by lowercased name
    name_index: Arc<DashMap<String, Uuid>>,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl InMemoryNamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NamespaceDirectory for InMemoryNamespaceStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Namespace>> {
        Ok(self.namespaces.get(&id).map(|entry| entry.clone()))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Namespace>> {
        Ok(self
            .name_index
            .get(&name_key(name))
            .and_then(|id| self.namespaces.get(id.value()).map(|entry| entry.clone())))
    }
}

#[async_trait]
impl NamespaceStore for InMemoryNamespaceStore {
    async fn create(&self, namespace: &Namespace) -> Result<Uuid> {
        if self.namespaces.contains_key(&namespace.id) {
            return Err(AppError::Conflict(format!(
                "namespace with id {} already exists",
                namespace.id
            )));
        }

        match self.name_index.entry(name_key(&namespace.name)) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "namespace with name {:?} already exists",
                    namespace.name
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(namespace.id);
            }
        }
        self.namespaces.insert(namespace.id, namespace.clone());

        tracing::debug!(namespace_id = %namespace.id, name = %namespace.name, "Namespace saved");
        Ok(namespace.id)
    }

    async fn update(&self, namespace: &Namespace) -> Result<()> {
        match self.namespaces.get_mut(&namespace.id) {
            Some(mut existing) => {
                existing.state = namespace.state;
                existing.metadata = namespace.metadata.clone();
                tracing::debug!(namespace_id = %namespace.id, "Namespace updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "namespace {} not found",
                namespace.id
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<Namespace>> {
        let mut namespaces: Vec<Namespace> =
            self.namespaces.iter().map(|entry| entry.clone()).collect();
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(namespaces)
    }
}
