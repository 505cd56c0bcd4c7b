use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Kind of data asset held in the catalog
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetType {
    Table,
    Job,
    Dashboard,
    Topic,
    FeatureTable,
    Application,
    Model,
    /// Any type name outside the supported set
    #[serde(other)]
    Unknown,
}

impl AssetType {
    /// Every type the catalog accepts, in reporting order
    pub const SUPPORTED: [AssetType; 7] = [
        AssetType::Table,
        AssetType::Job,
        AssetType::Dashboard,
        AssetType::Topic,
        AssetType::FeatureTable,
        AssetType::Application,
        AssetType::Model,
    ];

    pub fn is_valid(&self) -> bool {
        !matches!(self, AssetType::Unknown)
    }

    /// Parse a bucket key or user input, returning `None` for unsupported names
    pub fn parse_supported(name: &str) -> Option<Self> {
        name.parse::<AssetType>().ok().filter(AssetType::is_valid)
    }
}

impl Default for AssetType {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Asset owner as denormalized into the search document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
}

/// Search-relevant projection of an asset.
///
/// The relational store owns the authoritative record; this is the
/// denormalized copy written to the search engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Document identifier. Older documents may carry only a URN.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub urn: String,

    #[serde(rename = "type", default)]
    pub asset_type: AssetType,

    /// Source system; doubles as the physical index name
    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Free-form, source specific attributes
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<Owner>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Tenant that owns the document; the filter key for shared tenants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<Uuid>,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        urn: impl Into<String>,
        asset_type: AssetType,
        service: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            urn: urn.into(),
            asset_type,
            service: service.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Identifier to expose to clients; falls back to the URN for legacy documents
    pub fn effective_id(&self) -> &str {
        if self.id.is_empty() {
            &self.urn
        } else {
            &self.id
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}
