use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Optional identity filters for a search. Unset fields impose no constraint;
/// they are never treated as an empty-string match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl SearchFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.run_id.is_none() && self.agent_id.is_none()
    }
}

/// Identity tags and metadata attached to a memory on insertion.
/// All three identity fields are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddAttributes {
    pub user_id: String,
    pub run_id: String,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// One ranked search hit, kept as the JSON object the backend produced.
/// Remote hits pass through untouched (unknown keys, nulls and all);
/// locally built hits carry `id`, `memory`, `score` and identity tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryHit(Map<String, Value>);

impl MemoryHit {
    pub fn new(id: impl Into<String>, memory: impl Into<String>, score: f64) -> Self {
        Self::default()
            .with_field("id", id.into())
            .with_field("memory", memory.into())
            .with_field("score", score)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn memory(&self) -> Option<&str> {
        self.0.get("memory").and_then(Value::as_str)
    }

    /// `1 - cosine_distance`; higher is more similar. Read from `score`,
    /// falling back to `similarity`. `None` when absent or null.
    pub fn score(&self) -> Option<f64> {
        self.0
            .get("score")
            .or_else(|| self.0.get("similarity"))
            .and_then(Value::as_f64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Map<String, Value>> for MemoryHit {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// Envelope returned by every search. Failures degrade to
/// `{status: error, results: []}` instead of propagating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: Status,
    pub results: Vec<MemoryHit>,
    /// Other top-level keys of a pass-through response (e.g. `relations`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResponse {
    pub fn success(results: Vec<MemoryHit>) -> Self {
        Self {
            status: Status::Success,
            results,
            extra: Map::new(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: Status::Error,
            results: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResponse {
    pub status: Status,
    pub message: String,
}

impl AddResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_filter_fields_are_not_serialized() {
        let filter = SearchFilter::for_user("u1");
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, json!({ "user_id": "u1" }));
    }

    #[test]
    fn filter_accepts_explicit_nulls() {
        let filter: SearchFilter =
            serde_json::from_value(json!({ "user_id": null, "run_id": "r1", "agent_id": null }))
                .unwrap();
        assert_eq!(filter.user_id, None);
        assert_eq!(filter.run_id.as_deref(), Some("r1"));
        assert!(!filter.is_empty());
        assert!(SearchFilter::default().is_empty());
    }

    #[test]
    fn hit_keeps_unknown_fields_and_accepts_similarity_alias() {
        let hit: MemoryHit = serde_json::from_value(json!({
            "id": "m1",
            "memory": "likes tea",
            "similarity": 0.42,
            "hash": "abc",
        }))
        .unwrap();
        assert_eq!(hit.id(), Some("m1"));
        assert_eq!(hit.score(), Some(0.42));
        assert_eq!(hit.get("hash"), Some(&json!("abc")));
    }

    #[test]
    fn remote_hit_serializes_back_unchanged() {
        let raw = json!({ "id": 7, "memory": null, "score": null, "categories": ["work"] });
        let hit: MemoryHit = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(hit.id(), None);
        assert_eq!(hit.score(), None);
        assert_eq!(serde_json::to_value(&hit).unwrap(), raw);
    }

    #[test]
    fn local_hit_shape() {
        let hit = MemoryHit::new("m1", "likes tea", 0.5).with_field("user_id", "u1");
        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            json!({ "id": "m1", "memory": "likes tea", "score": 0.5, "user_id": "u1" })
        );
    }

    #[test]
    fn error_envelope_shape() {
        let value = serde_json::to_value(SearchResponse::error()).unwrap();
        assert_eq!(value, json!({ "status": "error", "results": [] }));
    }
}
