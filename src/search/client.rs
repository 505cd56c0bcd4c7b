//! HTTP client for the search engine (Elasticsearch 7 compatible REST API)

use crate::models::Asset;
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Optional knobs of a `_search` call
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub size: Option<usize>,
    pub from: Option<usize>,
    /// Source fields to return; empty returns the whole source
    pub source_includes: Vec<String>,
    /// Skip indices that do not exist under the target
    pub ignore_unavailable: bool,
}

/// Decoded `_search` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponseBody {
    #[serde(default)]
    pub hits: Hits,
    #[serde(default)]
    pub suggest: Option<HashMap<String, Vec<SuggestEntry>>>,
    #[serde(default)]
    pub aggregations: Option<HashMap<String, TermsAggregation>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Asset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestEntry {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<SuggestOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestOption {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermsAggregation {
    #[serde(default)]
    pub buckets: Vec<AggregationBucket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationBucket {
    pub key: String,
    pub doc_count: u64,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DeleteByQueryResponse {
    #[serde(default)]
    deleted: u64,
}

/// Extract `error.reason` from an engine error body.
///
/// Falls back to the raw body when it is not the expected shape.
pub fn error_reason(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Value::String(reason),
        }) => reason,
        Ok(ErrorBody { error }) => match error.get("reason").and_then(Value::as_str) {
            Some(reason) => reason.to_string(),
            None => format!("raw response = {}", body),
        },
        Err(_) => format!("raw response = {}", body),
    }
}

/// Thin handle over the engine's REST API.
///
/// Cheap to clone and safe to share between concurrent requests.
#[derive(Clone)]
pub struct EngineClient {
    client: Client,
    base_url: String,
}

impl EngineClient {
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("metadata-discovery/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SearchError::transport("NewClient"))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    /// Cluster name and version, for start-up logging
    pub async fn info(&self) -> SearchResult<String> {
        #[derive(Deserialize)]
        struct Info {
            cluster_name: String,
            version: Version,
        }
        #[derive(Deserialize)]
        struct Version {
            number: String,
        }

        let body = self.send("Info", self.request(Method::GET, "")).await?;
        let info: Info = serde_json::from_str(&body).map_err(SearchError::decode("Info"))?;
        Ok(format!(
            "{:?} (server version {})",
            info.cluster_name, info.version.number
        ))
    }

    pub async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        self.exists("IndexExists", index).await
    }

    /// Create an index with the given settings/mappings/aliases body
    pub async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()> {
        self.send("CreateIndex", self.request(Method::PUT, index).json(body))
            .await
            .map(drop)
    }

    /// Re-apply a mapping to an existing index
    pub async fn put_mapping(&self, index: &str, mapping: &Value) -> SearchResult<()> {
        let path = format!("{}/_mapping", index);
        self.send("PutMapping", self.request(Method::PUT, &path).json(mapping))
            .await
            .map(drop)
    }

    pub async fn alias_exists(&self, index: &str, alias: &str) -> SearchResult<bool> {
        self.exists("AliasExists", &format!("{}/_alias/{}", index, alias))
            .await
    }

    /// Physical indices the alias currently points at
    pub async fn alias_indices(&self, alias: &str) -> SearchResult<Vec<String>> {
        const OP: &str = "GetAlias";
        let response = self
            .request(Method::GET, &format!("_alias/{}", alias))
            .send()
            .await
            .map_err(SearchError::transport(OP))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body = Self::read_success(OP, response).await?;
        let indices: HashMap<String, Value> =
            serde_json::from_str(&body).map_err(SearchError::decode(OP))?;
        let mut names: Vec<String> = indices.into_keys().collect();
        names.sort();
        Ok(names)
    }

    /// Apply alias actions in one atomic `_aliases` call
    pub async fn update_aliases(&self, actions: &[Value]) -> SearchResult<()> {
        let body = json!({ "actions": actions });
        self.send("UpdateAliases", self.request(Method::POST, "_aliases").json(&body))
            .await
            .map(drop)
    }

    /// Send newline-delimited bulk actions; item failures are reported as errors
    pub async fn bulk(&self, ndjson: String, refresh: bool) -> SearchResult<()> {
        const OP: &str = "Bulk";
        let mut request = self
            .request(Method::POST, "_bulk")
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(ndjson);
        if refresh {
            request = request.query(&[("refresh", "true")]);
        }

        let body = self.send(OP, request).await?;
        let response: BulkResponse = serde_json::from_str(&body).map_err(SearchError::decode(OP))?;
        if response.errors {
            let reason = response
                .items
                .iter()
                .flat_map(|item| item.values())
                .find_map(|item| item.error.as_ref())
                .map(|error| error_reason(&json!({ "error": error }).to_string()))
                .unwrap_or_else(|| "bulk request reported errors".to_string());
            return Err(SearchError::Response {
                op: OP,
                status: StatusCode::OK,
                reason,
            });
        }
        Ok(())
    }

    /// Delete every document matching `query` under `target`, returning the count
    pub async fn delete_by_query(
        &self,
        target: &str,
        query: &Value,
        refresh: bool,
    ) -> SearchResult<u64> {
        const OP: &str = "DeleteByQuery";
        let path = format!("{}/_delete_by_query", target);
        let request = self
            .request(Method::POST, &path)
            .query(&[
                ("refresh", refresh.to_string()),
                ("ignore_unavailable", "true".to_string()),
            ])
            .json(query);

        let body = self.send(OP, request).await?;
        let response: DeleteByQueryResponse =
            serde_json::from_str(&body).map_err(SearchError::decode(OP))?;
        Ok(response.deleted)
    }

    /// Run a `_search` against an index or alias
    pub async fn search(
        &self,
        op: &'static str,
        target: &str,
        body: &Value,
        params: &SearchParams,
    ) -> SearchResult<SearchResponseBody> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(size) = params.size {
            query.push(("size", size.to_string()));
        }
        if let Some(from) = params.from {
            query.push(("from", from.to_string()));
        }
        if params.ignore_unavailable {
            query.push(("ignore_unavailable", "true".to_string()));
        }
        if !params.source_includes.is_empty() {
            query.push(("_source_includes", params.source_includes.join(",")));
        }

        let path = format!("{}/_search", target);
        tracing::debug!(op, target, body = %body, "Executing search");
        let response = self
            .send(op, self.request(Method::POST, &path).query(&query).json(body))
            .await?;
        serde_json::from_str(&response).map_err(SearchError::decode(op))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
    }

    async fn exists(&self, op: &'static str, path: &str) -> SearchResult<bool> {
        let response = self
            .request(Method::HEAD, path)
            .send()
            .await
            .map_err(SearchError::transport(op))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SearchError::Response {
                op,
                status,
                reason: format!("unexpected status for {}", path),
            }),
        }
    }

    async fn send(&self, op: &'static str, request: RequestBuilder) -> SearchResult<String> {
        let response = request.send().await.map_err(SearchError::transport(op))?;
        Self::read_success(op, response).await
    }

    async fn read_success(op: &'static str, response: reqwest::Response) -> SearchResult<String> {
        let status = response.status();
        let body = response.text().await.map_err(SearchError::transport(op))?;

        if !status.is_success() {
            return Err(SearchError::Response {
                op,
                status,
                reason: error_reason(&body),
            });
        }
        Ok(body)
    }
}
