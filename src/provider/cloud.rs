use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::error;

use super::MemoryProvider;
use crate::config::ProviderKind;
use crate::memory::engine::{add_body, parse_search};
use crate::memory::{AddAttributes, AddResponse, MemoryError, SearchFilter, SearchResponse};

/// Hosted memory platform. Pure pass-through to the remote API.
pub struct CloudProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CloudProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.mem0.ai".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, reqwest::Error> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, MemoryError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("Authorization", format!("Token {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                MemoryError::from_http(e, "cloud platform request", |e| {
                    MemoryError::Engine(format!("request to {path} failed: {e}"))
                })
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            MemoryError::from_http(e, "cloud platform request", |e| {
                MemoryError::Engine(format!("reading response from {path} failed: {e}"))
            })
        })?;

        if !status.is_success() {
            return Err(MemoryError::Engine(format!(
                "cloud platform returned {status} for {path}: {text}"
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| MemoryError::Serialization(format!("cloud response from {path}: {e}")))
    }
}

#[async_trait]
impl MemoryProvider for CloudProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CloudPlatform
    }

    /// The remote body is not inspected; only transport and status failures
    /// are reported.
    async fn add(
        &self,
        message: &str,
        attributes: &AddAttributes,
    ) -> Result<AddResponse, MemoryError> {
        self.post("/v1/memories/", &add_body(message, attributes))
            .await?;
        Ok(AddResponse::success(
            "Data added to Mem0 cloud platform successfully.",
        ))
    }

    /// Hits and any sibling keys of `results` come back exactly as the
    /// platform sent them.
    async fn search(&self, query: &str, filter: &SearchFilter) -> SearchResponse {
        let body = json!({ "query": query, "filters": filter });
        let result = self
            .post("/v1/memories/search/", &body)
            .await
            .and_then(parse_search);

        match result {
            Ok(remote) => SearchResponse {
                extra: remote.extra,
                ..SearchResponse::success(remote.hits)
            },
            Err(e) => {
                error!(error = %e, "cloud memory search failed");
                SearchResponse::error()
            }
        }
    }
}
