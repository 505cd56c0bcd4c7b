//! Index settings, analyzer and mapping bodies for service indices

use serde_json::{json, Value};

/// Alias every service index joins at creation, used for cross-service queries
pub const UNIVERSE_ALIAS: &str = "universe";

/// Analyzer applied to `urn` and `name`
pub const IDENTIFIER_ANALYZER: &str = "my_analyzer";

/// Splits on non-alphanumerics, letter/digit boundaries and camelCase humps.
///
/// `OrderLineItems_v2` yields `order`, `line`, `items`, `v`, `2` after lowercasing.
const IDENTIFIER_SPLIT_PATTERN: &str = r"([^\p{L}\d]+)|(?<=\D)(?=\d)|(?<=\d)(?=\D)|(?<=[\p{L}&&[^\p{Lu}]])(?=\p{Lu})|(?<=\p{Lu})(?=\p{Lu}[\p{L}&&[^\p{Lu}]])";

/// Settings block: shard count and the identifier analyzer
pub fn index_settings(shard_count: u32) -> Value {
    json!({
        "number_of_shards": shard_count,
        "analysis": {
            "analyzer": {
                IDENTIFIER_ANALYZER: {
                    "type": "custom",
                    "tokenizer": "my_tokenizer",
                    "filter": ["lowercase"]
                }
            },
            "tokenizer": {
                "my_tokenizer": {
                    "type": "pattern",
                    "pattern": IDENTIFIER_SPLIT_PATTERN
                }
            }
        }
    })
}

fn keyword_subfield() -> Value {
    json!({ "type": "keyword", "ignore_above": 256 })
}

/// Mapping shared by every service index
pub fn index_mapping() -> Value {
    json!({
        "properties": {
            "urn": {
                "type": "text",
                "analyzer": IDENTIFIER_ANALYZER,
                "fields": { "keyword": keyword_subfield() }
            },
            "name": {
                "type": "text",
                "analyzer": IDENTIFIER_ANALYZER,
                "fields": {
                    "keyword": keyword_subfield(),
                    "suggest": { "type": "completion" }
                }
            },
            "service": {
                "type": "text",
                "fields": { "keyword": keyword_subfield() }
            },
            "type": {
                "type": "text",
                "fields": { "keyword": keyword_subfield() }
            },
            "description": { "type": "text" },
            "labels": { "type": "object" },
            "namespace_id": { "type": "keyword" }
        }
    })
}

/// Full create-index body. The new index joins [`UNIVERSE_ALIAS`].
pub fn create_index_body(shard_count: u32) -> Value {
    json!({
        "settings": index_settings(shard_count),
        "mappings": index_mapping(),
        "aliases": { UNIVERSE_ALIAS: {} }
    })
}
