use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Row};
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::memory::error::MemoryError;
use crate::memory::similarity::{CollectionName, FilterField, QueryParam, SimilarityQuery};
use crate::memory::store::VectorStore;
use crate::memory::types::MemoryHit;

/// Postgres + pgvector store. Holds connection settings only; a fresh
/// connection is opened for each search and closed before returning.
pub struct PgVectorStore {
    options: PgConnectOptions,
    collection: CollectionName,
    timeout: Duration,
}

impl PgVectorStore {
    pub fn new(config: &StorageConfig, timeout: Duration) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.dbname);
        if let Some(ref password) = config.password {
            options = options.password(password);
        }
        Self::with_options(options, config.collection.clone(), timeout)
    }

    pub fn with_options(
        options: PgConnectOptions,
        collection: CollectionName,
        timeout: Duration,
    ) -> Self {
        Self {
            options,
            collection,
            timeout,
        }
    }

    async fn run(&self, query: &SimilarityQuery) -> Result<Vec<PgRow>, MemoryError> {
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| MemoryError::Store(format!("failed to connect to pgvector: {e}")))?;

        let sql = query.to_sql(&self.collection);
        let mut statement = sqlx::query(&sql);
        for param in query.params() {
            statement = match param {
                QueryParam::Text(v) => statement.bind(v),
                QueryParam::Float(v) => statement.bind(v),
                QueryParam::Int(v) => statement.bind(v),
            };
        }

        let result = statement.fetch_all(&mut conn).await;

        // Close on both paths; a failed close doesn't mask the query result.
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close pgvector connection");
        }

        result.map_err(|e| MemoryError::Store(format!("similarity query failed: {e}")))
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn similarity_search(
        &self,
        query: &SimilarityQuery,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        // On expiry the pending future is dropped, which drops the connection.
        let rows = tokio::time::timeout(self.timeout, self.run(query))
            .await
            .map_err(|_| MemoryError::Timeout("pgvector search"))??;

        debug!(
            collection = self.collection.as_str(),
            predicates = query.predicates.len(),
            rows = rows.len(),
            "pgvector search complete"
        );

        rows.iter().map(row_to_hit).collect()
    }
}

fn row_to_hit(row: &PgRow) -> Result<MemoryHit, MemoryError> {
    let decode = |e: sqlx::Error| MemoryError::Serialization(format!("bad row: {e}"));

    let id: String = row.try_get("id").map_err(decode)?;
    let memory: Option<String> = row.try_get("memory").map_err(decode)?;
    let score: f64 = row.try_get("similarity").map_err(decode)?;

    let mut hit = MemoryHit::new(id, memory.unwrap_or_default(), score);
    for field in FilterField::ALL {
        let key = field.payload_key();
        if let Some(tag) = row.try_get::<Option<String>, _>(key).map_err(decode)? {
            hit = hit.with_field(key, tag);
        }
    }
    Ok(hit)
}
