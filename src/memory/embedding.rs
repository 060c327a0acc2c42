use async_trait::async_trait;

use super::error::MemoryError;

/// Embedding provider trait. Turns query text into a fixed-length vector.
/// One network call per invocation: no retry, no caching. Failures surface
/// to the caller.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError>;
}
