//! Tenants ("namespaces"): model, directory, lifecycle service and the
//! request-time resolver that picks the namespace every call acts on.

mod locks;
pub mod middleware;
mod model;
pub mod resolver;
mod service;
mod store;

pub use locks::NamespaceLocks;
pub use middleware::namespace_middleware;
pub use model::{validate_namespace_name, Namespace, NamespaceState, DEFAULT_NAMESPACE_NAME};
pub use resolver::{IdentityInput, NamespaceResolver, RequestContext, TrustedClaims};
pub use service::{NamespaceDiscovery, NamespaceService, NamespaceUpdate};
pub use store::{find_by_urn, InMemoryNamespaceStore, NamespaceDirectory, NamespaceStore};
