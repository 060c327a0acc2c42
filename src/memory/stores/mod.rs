#[cfg(feature = "pgvector")]
pub mod pgvector;
