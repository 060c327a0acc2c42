use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::engine::{add_body, parse_search, MemoryEngine};
use crate::memory::error::MemoryError;
use crate::memory::types::{AddAttributes, MemoryHit, SearchFilter};

/// Client for a self-hosted mem0 REST server (`POST /memories`, `POST /search`).
pub struct Mem0Engine {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl Mem0Engine {
    /// `base_url` is typically `http://localhost:8888`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, reqwest::Error> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, MemoryError> {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            MemoryError::from_http(e, "memory engine request", |e| {
                MemoryError::Engine(format!("request to {path} failed: {e}"))
            })
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Engine(format!(
                "memory engine returned {status} for {path}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            MemoryError::from_http(e, "memory engine request", |e| {
                MemoryError::Serialization(format!("engine response from {path}: {e}"))
            })
        })
    }
}

#[async_trait]
impl MemoryEngine for Mem0Engine {
    async fn add(&self, message: &str, attributes: &AddAttributes) -> Result<Value, MemoryError> {
        self.post("/memories", &add_body(message, attributes)).await
    }

    async fn search(
        &self,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        // Identity filters go top-level, unset ones are omitted entirely.
        let mut body = serde_json::to_value(filter)
            .map_err(|e| MemoryError::Serialization(format!("search filter: {e}")))?;
        body["query"] = json!(query);

        let response = self.post("/search", &body).await?;
        Ok(parse_search(response)?.hits)
    }
}
