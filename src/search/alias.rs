//! Per-namespace aliases over service indices.
//!
//! Every namespace owns one alias, `tenant-alias-<name>`. Shared tenants
//! reach the service index itself through a filtered, routed alias.
//! Dedicated tenants get a `dedicated-<name>-<service>` index of their own
//! and an unfiltered alias over it. Reads and writes for a tenant always go
//! through its alias or the binding derived here.

use crate::namespace::{Namespace, NamespaceState};
use crate::search::client::EngineClient;
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::service_index_name;
use serde_json::{json, Value};

pub const TENANT_ALIAS_PREFIX: &str = "tenant-alias-";
pub const DEDICATED_INDEX_PREFIX: &str = "dedicated-";

/// How a namespace's alias is attached to a service index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStrategy {
    Shared,
    Dedicated,
}

impl From<NamespaceState> for BindingStrategy {
    fn from(state: NamespaceState) -> Self {
        match state {
            NamespaceState::Dedicated => BindingStrategy::Dedicated,
            // Upgrades stay on shared indices until the state flips
            NamespaceState::Shared | NamespaceState::Pending | NamespaceState::Upgrade => {
                BindingStrategy::Shared
            }
        }
    }
}

impl BindingStrategy {
    fn other(self) -> Self {
        match self {
            BindingStrategy::Shared => BindingStrategy::Dedicated,
            BindingStrategy::Dedicated => BindingStrategy::Shared,
        }
    }
}

/// Alias name for a namespace; fails on an empty name
pub fn alias_name(namespace: &Namespace) -> SearchResult<String> {
    let name = namespace.name.trim();
    if name.is_empty() {
        return Err(SearchError::EmptyNamespace);
    }
    Ok(format!("{}{}", TENANT_ALIAS_PREFIX, name.to_lowercase()))
}

fn physical_index(namespace: &Namespace, service: &str, strategy: BindingStrategy) -> String {
    match strategy {
        BindingStrategy::Shared => service.to_string(),
        BindingStrategy::Dedicated => format!(
            "{}{}-{}",
            DEDICATED_INDEX_PREFIX,
            namespace.name.trim().to_lowercase(),
            service
        ),
    }
}

/// Recover the service name from an index reachable through `namespace`'s alias.
///
/// Returns `None` for dedicated indices of other namespaces.
pub fn service_from_index(namespace: &Namespace, index: &str) -> Option<String> {
    match index.strip_prefix(DEDICATED_INDEX_PREFIX) {
        Some(rest) => {
            let owner = format!("{}-", namespace.name.trim().to_lowercase());
            rest.strip_prefix(&owner)
                .filter(|service| !service.is_empty())
                .map(str::to_string)
        }
        None => Some(index.to_string()),
    }
}

/// Desired attachment of one namespace alias to one service index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBinding {
    pub service: String,
    /// Physical index the alias points at
    pub index: String,
    pub alias: String,
    pub strategy: BindingStrategy,
    /// Term constraint on `namespace_id` (shared only)
    pub filter: Option<Value>,
    /// Shard routing key for index and search (shared only)
    pub routing: Option<String>,
}

impl IndexBinding {
    pub fn for_namespace(namespace: &Namespace, service: &str) -> SearchResult<Self> {
        let alias = alias_name(namespace)?;
        let service = service_index_name(service)?;
        let strategy = BindingStrategy::from(namespace.state);

        let (filter, routing) = match strategy {
            BindingStrategy::Shared => {
                let id = namespace.id.to_string();
                (
                    Some(json!({ "term": { "namespace_id": id } })),
                    Some(id),
                )
            }
            BindingStrategy::Dedicated => (None, None),
        };

        Ok(Self {
            index: physical_index(namespace, &service, strategy),
            service,
            alias,
            strategy,
            filter,
            routing,
        })
    }

    /// Routing to attach to writes addressed at the physical index
    pub fn write_routing(&self) -> Option<&str> {
        self.routing.as_deref()
    }

    fn add_action(&self) -> Value {
        let mut add = json!({ "index": self.index, "alias": self.alias });
        if let Some(filter) = &self.filter {
            add["filter"] = filter.clone();
        }
        if let Some(routing) = &self.routing {
            add["index_routing"] = json!(routing);
            add["search_routing"] = json!(routing);
        }
        json!({ "add": add })
    }
}

fn remove_action(index: &str, alias: &str) -> Value {
    json!({ "remove": { "index": index, "alias": alias, "must_exist": false } })
}

/// Attaches namespace aliases to service indices
#[derive(Clone)]
pub struct AliasRouter {
    client: EngineClient,
}

impl AliasRouter {
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }

    /// Whether the binding's alias is already attached to its index
    pub async fn is_bound(&self, binding: &IndexBinding) -> SearchResult<bool> {
        self.client
            .alias_exists(&binding.index, &binding.alias)
            .await
    }

    /// Rebind `namespace`'s alias on `service` according to its current state.
    ///
    /// One `_aliases` call detaches any prior binding for the service, on
    /// either the shared or the dedicated index, and attaches the new one. The
    /// target index must already exist. If the call fails nothing changes.
    pub async fn bind(&self, namespace: &Namespace, service: &str) -> SearchResult<IndexBinding> {
        let binding = IndexBinding::for_namespace(namespace, service)?;

        let mut actions = vec![remove_action(&binding.index, &binding.alias)];
        let previous = physical_index(namespace, &binding.service, binding.strategy.other());
        if self.client.index_exists(&previous).await? {
            actions.push(remove_action(&previous, &binding.alias));
        }
        actions.push(binding.add_action());

        self.client.update_aliases(&actions).await?;
        tracing::info!(
            namespace_id = %namespace.id,
            alias = %binding.alias,
            index = %binding.index,
            strategy = ?binding.strategy,
            "Bound namespace alias"
        );
        Ok(binding)
    }
}
