pub mod embedders;
pub mod embedding;
pub mod engine;
pub mod engines;
pub mod error;
pub mod similarity;
pub mod store;
pub mod stores;
pub mod types;

pub use embedders::openai::OpenAiEmbedder;
pub use embedding::EmbeddingProvider;
pub use engine::MemoryEngine;
pub use engines::mem0::Mem0Engine;
pub use error::MemoryError;
pub use similarity::{CollectionName, FilterField, SimilarityQuery};
pub use store::VectorStore;
#[cfg(feature = "pgvector")]
pub use stores::pgvector::PgVectorStore;
pub use types::{AddAttributes, AddResponse, MemoryHit, SearchFilter, SearchResponse, Status};
