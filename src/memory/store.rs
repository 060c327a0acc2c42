use async_trait::async_trait;

use super::error::MemoryError;
use super::similarity::SimilarityQuery;
use super::types::MemoryHit;

/// Vector storage seam. Postgres+pgvector in production, an in-memory
/// cosine scan in tests. The store only executes the query it is handed:
/// filters, threshold, ordering and limit are all carried by the query.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Rows ordered by descending similarity, ties broken by ascending id,
    /// at most `query.limit` of them.
    async fn similarity_search(&self, query: &SimilarityQuery)
        -> Result<Vec<MemoryHit>, MemoryError>;
}
