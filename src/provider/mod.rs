pub mod cloud;
pub mod self_hosted;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, ProviderConfig, ProviderKind, SearchConfig, SelfHostedConfig};
use crate::error::ConfigError;
use crate::memory::{
    AddAttributes, AddResponse, Mem0Engine, MemoryError, SearchFilter, SearchResponse,
};

pub use cloud::CloudProvider;
pub use self_hosted::{SelfHostedProvider, VectorSearch};

/// A memory backend: store a message, search for relevant ones.
///
/// `search` never fails. Upstream errors are logged and turned into an
/// error envelope with no results. `add` errors propagate to the caller.
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn add(
        &self,
        message: &str,
        attributes: &AddAttributes,
    ) -> Result<AddResponse, MemoryError>;

    async fn search(&self, query: &str, filter: &SearchFilter) -> SearchResponse;
}

/// Build the configured provider. Only the selected variant's clients are
/// constructed.
pub fn create_provider(config: &Config) -> Result<Arc<dyn MemoryProvider>, ConfigError> {
    let kind = config.provider.kind();
    let provider: Arc<dyn MemoryProvider> = match config.provider {
        ProviderConfig::SelfHosted(ref self_hosted) => {
            let provider = build_self_hosted(self_hosted, config)?;
            info!(
                provider = %kind,
                driver = %self_hosted.search.driver(),
                engine = %self_hosted.engine.base_url,
                "memory provider ready"
            );
            Arc::new(provider)
        }
        ProviderConfig::Cloud(ref cloud) => {
            let provider = CloudProvider::new(&cloud.api_key)
                .with_base_url(&cloud.base_url)
                .with_timeout(config.upstream_timeout)?;
            info!(provider = %kind, url = %cloud.base_url, "memory provider ready");
            Arc::new(provider)
        }
    };
    Ok(provider)
}

fn build_self_hosted(
    self_hosted: &SelfHostedConfig,
    config: &Config,
) -> Result<SelfHostedProvider, ConfigError> {
    let mut engine =
        Mem0Engine::new(&self_hosted.engine.base_url).with_timeout(config.upstream_timeout)?;
    if let Some(ref key) = self_hosted.engine.api_key {
        engine = engine.with_api_key(key);
    }
    let provider = SelfHostedProvider::new(engine);

    match self_hosted.search {
        SearchConfig::Engine => Ok(provider),
        SearchConfig::DirectVector(ref vector) => {
            Ok(provider.with_vector_search(vector_search(vector, config)?))
        }
    }
}

#[cfg(feature = "pgvector")]
fn vector_search(
    vector: &crate::config::VectorSearchConfig,
    config: &Config,
) -> Result<VectorSearch, ConfigError> {
    use crate::memory::{OpenAiEmbedder, PgVectorStore};

    let embedder = OpenAiEmbedder::new(
        &vector.embedder.base_url,
        &vector.embedder.api_key,
        &vector.embedder.model,
    )
    .with_timeout(config.upstream_timeout)?;
    let store = PgVectorStore::new(&vector.storage, config.upstream_timeout);

    Ok(VectorSearch::new(embedder, store)
        .with_threshold(vector.threshold)
        .with_limit(vector.limit))
}

#[cfg(not(feature = "pgvector"))]
fn vector_search(
    _vector: &crate::config::VectorSearchConfig,
    _config: &Config,
) -> Result<VectorSearch, ConfigError> {
    Err(ConfigError::FeatureDisabled("pgvector"))
}
