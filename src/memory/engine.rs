use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::MemoryError;
use super::types::{AddAttributes, MemoryHit, SearchFilter};

/// Opaque memory engine. Extraction, deduplication, embedding and ranking
/// all happen on its side; we only hand it records and queries.
#[async_trait]
pub trait MemoryEngine: Send + Sync {
    /// Store a message under the given identity tags. Returns the engine's
    /// acknowledgement as-is.
    async fn add(&self, message: &str, attributes: &AddAttributes) -> Result<Value, MemoryError>;

    /// Search using the engine's own filtering and ranking.
    async fn search(&self, query: &str, filter: &SearchFilter)
        -> Result<Vec<MemoryHit>, MemoryError>;
}

/// Request body shared by the self-hosted and hosted add endpoints.
pub(crate) fn add_body(message: &str, attributes: &AddAttributes) -> Value {
    let mut body = Map::new();
    body.insert(
        "messages".into(),
        serde_json::json!([{ "role": "user", "content": message }]),
    );
    body.insert("user_id".into(), Value::String(attributes.user_id.clone()));
    body.insert("run_id".into(), Value::String(attributes.run_id.clone()));
    body.insert("agent_id".into(), Value::String(attributes.agent_id.clone()));
    if let Some(ref metadata) = attributes.metadata {
        body.insert("metadata".into(), Value::Object(metadata.clone()));
    }
    Value::Object(body)
}

/// A decoded search response body.
pub(crate) struct RemoteSearch {
    pub hits: Vec<MemoryHit>,
    /// Top-level keys other than `results` (e.g. `relations`), untouched.
    pub extra: Map<String, Value>,
}

/// Accept either `{"results": [...], ...}` or a bare array of hits.
pub(crate) fn parse_search(body: Value) -> Result<RemoteSearch, MemoryError> {
    let (list, extra) = match body {
        Value::Array(items) => (items, Map::new()),
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(items)) => (items, obj),
            _ => {
                return Err(MemoryError::Serialization(
                    "search response has no results array".into(),
                ))
            }
        },
        other => {
            return Err(MemoryError::Serialization(format!(
                "unexpected search response: {other}"
            )))
        }
    };

    let hits = list
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| MemoryError::Serialization(format!("bad search hit: {e}")))
        })
        .collect::<Result<_, _>>()?;
    Ok(RemoteSearch { hits, extra })
}
