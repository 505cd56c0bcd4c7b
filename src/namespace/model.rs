use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Name of the namespace used when a request carries no tenant context
pub const DEFAULT_NAMESPACE_NAME: &str = "default";

const MIN_NAME_LEN: usize = 3;

/// Lifecycle state of a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NamespaceState {
    /// Registered but not ready for use
    Pending,
    /// Co-resides with other tenants in common indices
    Shared,
    /// Owns whole indices
    Dedicated,
    /// Shared tenant being moved to dedicated indices
    Upgrade,
}

/// An isolation boundary for assets and search.
///
/// `id` and `name` are fixed at creation; only `state` and `metadata` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: Uuid,
    pub name: String,
    pub state: NamespaceState,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, state: NamespaceState) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            state,
            metadata: serde_json::Map::new(),
        }
    }

    /// The single-tenant fallback: nil ID, name `default`, shared
    pub fn default_namespace() -> Self {
        Self {
            id: Uuid::nil(),
            name: DEFAULT_NAMESPACE_NAME.to_string(),
            state: NamespaceState::Shared,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.id.is_nil() && self.name == DEFAULT_NAMESPACE_NAME
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Reject names shorter than three characters or containing whitespace, `.` or `-`.
///
/// The separators are reserved for the index and alias names derived from a namespace.
pub fn validate_namespace_name(name: &str) -> Result<()> {
    if name.chars().count() < MIN_NAME_LEN {
        return Err(AppError::Validation(format!(
            "namespace name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c == '.' || c == '-')
    {
        return Err(AppError::Validation(format!(
            "namespace name {:?} must not contain whitespace, '.' or '-'",
            name
        )));
    }
    Ok(())
}
