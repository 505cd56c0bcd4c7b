//! Search query building

use crate::models::{AssetType, SearchRequest};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Key the completion suggester is registered under in request and response
pub const SUGGESTER_NAME: &str = "name-phrase-suggest";

/// Key of the per-type terms aggregation
pub const TYPE_AGGREGATION_NAME: &str = "aggregation_name";

/// Completion suggestions returned per request
pub const SUGGEST_SIZE: usize = 5;

/// Fields that dominate text relevance, with their boosts
const BOOSTED_FIELDS: [&str; 2] = ["urn^10", "name^5"];

/// Builds engine queries from abstract search requests.
///
/// Stages wrap the running query in order: text relevance, exact filters,
/// fuzzy field queries, then rank blending. Each stage applies only when the
/// request populates it.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    min_score: f64,
}

impl QueryBuilder {
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }

    /// Full search body including the minimum score.
    ///
    /// `request.text` must be non-empty; callers reject empty text first.
    pub fn build(&self, request: &SearchRequest) -> Value {
        let fuzzy = !request.disable_fuzzy;

        let mut query = text_query(&request.text, fuzzy);
        if has_filters(&request.filters) {
            query = with_filters(query, &request.filters);
        }
        if !request.queries.is_empty() {
            query = with_field_queries(query, &request.queries, fuzzy);
        }
        if let Some(field) = request.rank_by.as_deref().filter(|f| !f.is_empty()) {
            query = with_rank(query, field);
        }

        json!({
            "query": query,
            "min_score": self.min_score,
        })
    }
}

fn multi_match(text: &str, fields: Option<&[&str]>, fuzzy: bool) -> Value {
    let mut clause = json!({ "query": text });
    if let Some(fields) = fields {
        clause["fields"] = json!(fields);
    }
    if fuzzy {
        clause["fuzziness"] = json!("AUTO");
    }
    json!({ "multi_match": clause })
}

/// Exact on the boosted fields, fuzzy on the boosted fields, fuzzy on everything
fn text_query(text: &str, fuzzy: bool) -> Value {
    let text = text.trim();
    json!({
        "bool": {
            "should": [
                multi_match(text, Some(&BOOSTED_FIELDS), false),
                multi_match(text, Some(&BOOSTED_FIELDS), fuzzy),
                multi_match(text, None, fuzzy),
            ]
        }
    })
}

fn has_filters(filters: &BTreeMap<String, Vec<String>>) -> bool {
    filters.values().any(|values| !values.is_empty())
}

fn with_filters(query: Value, filters: &BTreeMap<String, Vec<String>>) -> Value {
    let clauses: Vec<Value> = filters
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(field, values)| {
            let key = format!("{}.keyword", field);
            match values.as_slice() {
                [value] => json!({ "term": { key: value } }),
                _ => json!({ "terms": { key: values } }),
            }
        })
        .collect();

    json!({ "bool": { "should": [query], "filter": clauses } })
}

fn with_field_queries(query: Value, queries: &BTreeMap<String, String>, fuzzy: bool) -> Value {
    let clauses: Vec<Value> = queries
        .iter()
        .map(|(field, value)| {
            let mut clause = json!({ "query": value });
            if fuzzy {
                clause["fuzziness"] = json!("AUTO");
            }
            json!({ "match": { field.as_str(): clause } })
        })
        .collect();

    json!({ "bool": { "should": [query], "filter": clauses } })
}

fn with_rank(query: Value, field: &str) -> Value {
    json!({
        "function_score": {
            "query": query,
            "functions": [{
                "field_value_factor": {
                    "field": field,
                    "modifier": "log1p",
                    "missing": 1.0
                },
                "weight": 1.0
            }],
            "score_mode": "sum"
        }
    })
}

/// Completion query on `name.suggest`, deduplicated
pub fn suggest_query(text: &str) -> Value {
    json!({
        "suggest": {
            SUGGESTER_NAME: {
                "text": text,
                "completion": {
                    "field": "name.suggest",
                    "skip_duplicates": true,
                    "size": SUGGEST_SIZE
                }
            }
        }
    })
}

/// Zero-hit terms aggregation over `type.keyword`.
///
/// Buckets are restricted to supported types so stray keys cannot push them
/// out of the bucket limit.
pub fn type_aggregation_query() -> Value {
    let supported: Vec<String> = AssetType::SUPPORTED.iter().map(ToString::to_string).collect();
    json!({
        "size": 0,
        "aggs": {
            TYPE_AGGREGATION_NAME: {
                "terms": {
                    "field": "type.keyword",
                    "size": supported.len(),
                    "include": supported
                }
            }
        }
    })
}
