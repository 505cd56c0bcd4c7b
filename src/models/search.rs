use crate::namespace::Namespace;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Abstract search request, turned into an engine query by the query builder
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free text matched against urn, name and every other text field
    pub text: String,

    /// Exact filters: values ORed within a field, fields ANDed
    pub filters: BTreeMap<String, Vec<String>>,

    /// Fuzzy field matches, all mandatory
    pub queries: BTreeMap<String, String>,

    /// Numeric field blended into the score
    pub rank_by: Option<String>,

    /// Result cap; zero means the configured default
    pub max_results: usize,

    /// Number of hits to skip
    pub offset: usize,

    /// Source fields to return; empty means the default projection
    pub include_fields: Vec<String>,

    /// Turn off automatic fuzziness
    pub disable_fuzzy: bool,

    /// Tenant whose alias the search targets
    pub namespace: Namespace,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: BTreeMap::new(),
            queries: BTreeMap::new(),
            rank_by: None,
            max_results: 0,
            offset: 0,
            include_fields: Vec::new(),
            disable_fuzzy: false,
            namespace: Namespace::default_namespace(),
        }
    }

    /// Add an exact-match filter; repeated calls for the same field accumulate values
    pub fn with_filter<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.filters
            .entry(field.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_query(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.queries.insert(field.into(), value.into());
        self
    }

    pub fn with_rank_by(mut self, field: impl Into<String>) -> Self {
        self.rank_by = Some(field.into());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_include_fields(mut self, fields: Vec<String>) -> Self {
        self.include_fields = fields;
        self
    }

    pub fn with_fuzzy(mut self, enabled: bool) -> Self {
        self.disable_fuzzy = !enabled;
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }
}

/// A single search hit projected for clients. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub result_type: String,
    pub id: String,
    pub urn: String,
    pub description: String,
    pub title: String,
    pub service: String,
    pub labels: HashMap<String, String>,
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_builder() {
        let request = SearchRequest::new("orders")
            .with_filter("service", ["kafka"])
            .with_filter("service", ["rabbitmq"])
            .with_query("description", "payment")
            .with_rank_by("data.usage_count")
            .with_max_results(50)
            .with_fuzzy(false);

        assert_eq!(request.text, "orders");
        assert_eq!(request.filters["service"], vec!["kafka", "rabbitmq"]);
        assert_eq!(request.queries["description"], "payment");
        assert_eq!(request.rank_by.as_deref(), Some("data.usage_count"));
        assert_eq!(request.max_results, 50);
        assert!(request.disable_fuzzy);
        assert!(request.namespace.is_default());
    }
}
