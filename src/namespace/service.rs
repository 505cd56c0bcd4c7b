use crate::error::{AppError, Result};
use crate::namespace::store::{find_by_urn, NamespaceStore};
use crate::namespace::{validate_namespace_name, Namespace, NamespaceLocks, NamespaceState};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Search-engine side of namespace management
#[async_trait]
pub trait NamespaceDiscovery: Send + Sync {
    /// Bring the namespace's alias bindings in line with its current state.
    ///
    /// Called with the namespace's lock held.
    async fn bind_namespace(&self, namespace: &Namespace) -> Result<()>;
}

/// Partial update of a namespace. Looked up by `name` when set, else by `id`.
#[derive(Debug, Clone, Default)]
pub struct NamespaceUpdate {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub state: Option<NamespaceState>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Creates and updates namespaces, keeping the search engine bindings in step
pub struct NamespaceService {
    store: Arc<dyn NamespaceStore>,
    discovery: Arc<dyn NamespaceDiscovery>,
    /// Rebinds of one namespace never overlap
    locks: NamespaceLocks,
}

impl NamespaceService {
    pub fn new(store: Arc<dyn NamespaceStore>, discovery: Arc<dyn NamespaceDiscovery>) -> Self {
        Self {
            store,
            discovery,
            locks: NamespaceLocks::new(),
        }
    }

    /// Share rebind locks with other writers of alias bindings
    pub fn with_locks(mut self, locks: NamespaceLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Register the default namespace
    pub async fn migrate_default(&self) -> Result<Uuid> {
        let default = Namespace::default_namespace();
        if self.store.get_by_id(default.id).await?.is_some() {
            return Ok(default.id);
        }
        self.create(default).await
    }

    /// Persist a new namespace and push it into the search engine
    pub async fn create(&self, mut namespace: Namespace) -> Result<Uuid> {
        validate_namespace_name(&namespace.name)?;
        if namespace.id.is_nil() && !namespace.is_default() {
            namespace.id = Uuid::new_v4();
        }

        let id = self.store.create(&namespace).await?;

        let lock = self.locks.for_namespace(id);
        let _guard = lock.lock().await;
        self.discovery.bind_namespace(&namespace).await?;

        tracing::info!(namespace_id = %id, name = %namespace.name, state = %namespace.state, "Namespace created");
        Ok(id)
    }

    /// Merge mutable fields into an existing namespace.
    ///
    /// A state change rebinds the namespace's aliases before the new state is
    /// stored, so a failed rebind leaves both the binding and the record untouched.
    pub async fn update(&self, update: NamespaceUpdate) -> Result<Namespace> {
        let mut existing = match (&update.name, update.id) {
            (Some(name), _) if !name.is_empty() => self
                .store
                .get_by_name(name)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("namespace {:?} not found", name)))?,
            (_, Some(id)) => self
                .store
                .get_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("namespace {} not found", id)))?,
            _ => {
                return Err(AppError::Validation(
                    "namespace id or name is required".to_string(),
                ))
            }
        };

        let lock = self.locks.for_namespace(existing.id);
        let _guard = lock.lock().await;

        let previous_state = existing.state;
        if let Some(state) = update.state {
            existing.state = state;
        }
        existing.metadata = update.metadata;

        if existing.state != previous_state {
            tracing::info!(
                namespace_id = %existing.id,
                from = %previous_state,
                to = %existing.state,
                "Namespace state changed, rebinding aliases"
            );
            self.discovery.bind_namespace(&existing).await?;
        }

        self.store.update(&existing).await?;
        Ok(existing)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Namespace> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("namespace {} not found", id)))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Namespace> {
        self.store
            .get_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("namespace {:?} not found", name)))
    }

    /// Look up by UUID or by name
    pub async fn get_by_urn(&self, urn: &str) -> Result<Namespace> {
        find_by_urn(self.store.as_ref(), urn).await
    }

    pub async fn list(&self) -> Result<Vec<Namespace>> {
        self.store.list().await
    }
}
