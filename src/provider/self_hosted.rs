use async_trait::async_trait;
use tracing::{debug, error};

use super::MemoryProvider;
use crate::config::{ProviderKind, SearchDriver};
use crate::memory::similarity::{
    SimilarityQuery, DEFAULT_SEARCH_LIMIT, DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::memory::{
    AddAttributes, AddResponse, EmbeddingProvider, MemoryEngine, MemoryError, MemoryHit,
    SearchFilter, SearchResponse, VectorStore,
};

/// Direct-vector search: embed the query, then run a filtered similarity
/// query against the vector store.
pub struct VectorSearch {
    embedder: Box<dyn EmbeddingProvider>,
    store: Box<dyn VectorStore>,
    threshold: f64,
    limit: usize,
}

impl VectorSearch {
    pub fn new(
        embedder: impl EmbeddingProvider + 'static,
        store: impl VectorStore + 'static,
    ) -> Self {
        Self {
            embedder: Box::new(embedder),
            store: Box::new(store),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    async fn search(&self, query: &str, filter: &SearchFilter) -> Result<Vec<MemoryHit>, MemoryError> {
        let embedding = self.embedder.embed(query).await?;
        let query = SimilarityQuery::new(embedding, filter, self.threshold, self.limit);
        self.store.similarity_search(&query).await
    }
}

enum SearchBackend {
    Engine,
    DirectVector(VectorSearch),
}

/// Provider backed by a self-hosted memory engine. Adds always go to the
/// engine; searches go either to the engine or straight to the vector store,
/// fixed at construction.
pub struct SelfHostedProvider {
    engine: Box<dyn MemoryEngine>,
    search: SearchBackend,
}

impl SelfHostedProvider {
    /// Engine-delegated search.
    pub fn new(engine: impl MemoryEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            search: SearchBackend::Engine,
        }
    }

    /// Switch searches to the direct-vector driver.
    pub fn with_vector_search(mut self, search: VectorSearch) -> Self {
        self.search = SearchBackend::DirectVector(search);
        self
    }

    pub fn driver(&self) -> SearchDriver {
        match self.search {
            SearchBackend::Engine => SearchDriver::Engine,
            SearchBackend::DirectVector(_) => SearchDriver::DirectVector,
        }
    }
}

#[async_trait]
impl MemoryProvider for SelfHostedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SelfHosted
    }

    async fn add(
        &self,
        message: &str,
        attributes: &AddAttributes,
    ) -> Result<AddResponse, MemoryError> {
        let ack = self.engine.add(message, attributes).await?;
        debug!(user_id = %attributes.user_id, run_id = %attributes.run_id, %ack, "memory added");
        Ok(AddResponse::success(
            "Data added to Mem0 self-hosted platform successfully.",
        ))
    }

    async fn search(&self, query: &str, filter: &SearchFilter) -> SearchResponse {
        let driver = self.driver();
        let result = match self.search {
            SearchBackend::Engine => self.engine.search(query, filter).await,
            SearchBackend::DirectVector(ref vector) => vector.search(query, filter).await,
        };

        match result {
            Ok(hits) => {
                debug!(
                    %driver,
                    unfiltered = filter.is_empty(),
                    hits = hits.len(),
                    "memory search complete"
                );
                SearchResponse::success(hits)
            }
            Err(e) => {
                error!(%driver, error = %e, "memory search failed");
                SearchResponse::error()
            }
        }
    }
}
