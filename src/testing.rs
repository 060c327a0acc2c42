//! Shared fakes for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use std::time::Duration;

use async_trait::async_trait;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::memory::engine::MemoryEngine;
use crate::memory::error::MemoryError;
use crate::memory::similarity::{FilterField, SimilarityQuery};
use crate::memory::store::VectorStore;
use crate::memory::{AddAttributes, EmbeddingProvider, MemoryHit, SearchFilter};

/// Serve `router` on an ephemeral local port, returning its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Handler body that answers long after any test timeout.
pub async fn slow(body: Value) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(body)
}

/// A server that sends response headers and the first byte of a JSON body,
/// then stalls with the connection open.
pub async fn serve_stalled_body() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(5)).await;
            });
        }
    });
    format!("http://{addr}")
}

// --- Embedder ---

/// Returns a scripted vector per text, `[1, 0]` otherwise.
#[derive(Default)]
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl FakeEmbedder {
    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MemoryError::Embedding("embedding service unavailable".into()));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![1.0, 0.0]))
    }
}

// --- Vector store ---

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub memory: String,
    pub embedding: Vec<f32>,
    pub user_id: Option<String>,
    pub run_id: Option<String>,
    pub agent_id: Option<String>,
}

impl StoredRecord {
    pub fn new(id: &str, memory: &str, embedding: Vec<f32>) -> Self {
        Self {
            id: id.to_string(),
            memory: memory.to_string(),
            embedding,
            user_id: None,
            run_id: None,
            agent_id: None,
        }
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    fn tag(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::UserId => self.user_id.as_deref(),
            FilterField::RunId => self.run_id.as_deref(),
            FilterField::AgentId => self.agent_id.as_deref(),
        }
    }
}

/// A 2-d unit vector whose cosine similarity to `[1, 0]` is `similarity`.
pub fn unit_at(similarity: f32) -> Vec<f32> {
    vec![similarity, (1.0 - similarity * similarity).sqrt()]
}

/// Brute-force cosine scan applying the same filters, strict threshold,
/// ordering and limit the pgvector query does.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<StoredRecord>>,
    fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, record: StoredRecord) {
        self.records.lock().unwrap().push(record);
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn similarity_search(
        &self,
        query: &SimilarityQuery,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MemoryError::Store("connection refused".into()));
        }

        let records = self.records.lock().unwrap();
        let mut hits: Vec<MemoryHit> = records
            .iter()
            .filter(|r| {
                query
                    .predicates
                    .iter()
                    .all(|p| r.tag(p.field) == Some(p.value.as_str()))
            })
            .map(|r| (r, cosine(&r.embedding, &query.embedding)))
            .filter(|(_, score)| query.admits(*score))
            .map(|(r, score)| {
                FilterField::ALL
                    .into_iter()
                    .fold(MemoryHit::new(&r.id, &r.memory, score), |hit, field| {
                        match r.tag(field) {
                            Some(tag) => hit.with_field(field.payload_key(), tag),
                            None => hit,
                        }
                    })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id().cmp(&b.id()))
        });
        hits.truncate(query.limit);
        Ok(hits)
    }
}

// --- Memory engine ---

/// Records every call. `add` optionally writes into an [`InMemoryStore`]
/// so direct-vector searches can find what the engine stored.
#[derive(Default)]
pub struct FakeEngine {
    pub added: Mutex<Vec<(String, AddAttributes)>>,
    pub searches: Mutex<Vec<(String, SearchFilter)>>,
    hits: Vec<MemoryHit>,
    sink: Option<(Arc<InMemoryStore>, Vec<f32>)>,
    fail: bool,
}

impl FakeEngine {
    pub fn with_hits(hits: Vec<MemoryHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Store added messages in `store` with the given embedding.
    pub fn writing_to(store: Arc<InMemoryStore>, embedding: Vec<f32>) -> Self {
        Self {
            sink: Some((store, embedding)),
            ..Self::default()
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }
}

#[async_trait]
impl MemoryEngine for FakeEngine {
    async fn add(&self, message: &str, attributes: &AddAttributes) -> Result<Value, MemoryError> {
        if self.fail {
            return Err(MemoryError::Engine("engine unavailable".into()));
        }
        let mut added = self.added.lock().unwrap();
        added.push((message.to_string(), attributes.clone()));

        let id = format!("mem-{}", added.len());
        if let Some((ref store, ref embedding)) = self.sink {
            store.insert(StoredRecord {
                id: id.clone(),
                memory: message.to_string(),
                embedding: embedding.clone(),
                user_id: Some(attributes.user_id.clone()),
                run_id: Some(attributes.run_id.clone()),
                agent_id: Some(attributes.agent_id.clone()),
            });
        }
        Ok(json!({ "results": [{ "id": id, "event": "ADD" }] }))
    }

    async fn search(
        &self,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), filter.clone()));
        if self.fail {
            return Err(MemoryError::Engine("engine unavailable".into()));
        }
        Ok(self.hits.clone())
    }
}

pub fn attributes(user_id: &str, run_id: &str, agent_id: &str) -> AddAttributes {
    AddAttributes {
        user_id: user_id.into(),
        run_id: run_id.into(),
        agent_id: agent_id.into(),
        metadata: None::<Map<String, Value>>,
    }
}
