use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::memory::similarity::{
    CollectionName, DEFAULT_SEARCH_LIMIT, DEFAULT_SIMILARITY_THRESHOLD,
};

/// Which backend serves add/search. Chosen once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    SelfHosted,
    CloudPlatform,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::SelfHosted, ProviderKind::CloudPlatform];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::SelfHosted => "self_hosted",
            ProviderKind::CloudPlatform => "cloud_platform",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownProvider {
                value: s.to_string(),
                allowed: join_names(Self::ALL.iter().map(|k| k.as_str())),
            })
    }
}

/// How the self-hosted provider answers searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDriver {
    /// Hand the query to the memory engine and trust its ranking.
    Engine,
    /// Embed the query and run a filtered similarity query against pgvector.
    DirectVector,
}

impl SearchDriver {
    pub const ALL: [SearchDriver; 2] = [SearchDriver::Engine, SearchDriver::DirectVector];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchDriver::Engine => "mem0",
            SearchDriver::DirectVector => "pgvector",
        }
    }
}

impl fmt::Display for SearchDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|driver| driver.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownSearchDriver {
                value: s.to_string(),
                allowed: join_names(Self::ALL.iter().map(|d| d.as_str())),
            })
    }
}

/// Process configuration. Resolved once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Applied to every embedding, engine, cloud and storage call.
    pub upstream_timeout: Duration,
    pub provider: ProviderConfig,
}

/// Settings for the selected provider only. Credentials for the other
/// variant are never read.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    SelfHosted(SelfHostedConfig),
    Cloud(CloudConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::SelfHosted(_) => ProviderKind::SelfHosted,
            ProviderConfig::Cloud(_) => ProviderKind::CloudPlatform,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelfHostedConfig {
    pub engine: EngineConfig,
    pub search: SearchConfig,
}

/// REST endpoint of the self-hosted memory engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SearchConfig {
    Engine,
    DirectVector(VectorSearchConfig),
}

impl SearchConfig {
    pub fn driver(&self) -> SearchDriver {
        match self {
            SearchConfig::Engine => SearchDriver::Engine,
            SearchConfig::DirectVector(_) => SearchDriver::DirectVector,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorSearchConfig {
    pub storage: StorageConfig,
    pub embedder: EmbedderConfig,
    pub threshold: f64,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    pub collection: CollectionName,
}

#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Config {
    /// Read configuration from the process environment. Call
    /// `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let provider_kind: ProviderKind = env.required("MEM0_PROVIDER")?.parse()?;
        let provider = match provider_kind {
            ProviderKind::SelfHosted => ProviderConfig::SelfHosted(self_hosted_config(&env)?),
            ProviderKind::CloudPlatform => ProviderConfig::Cloud(CloudConfig {
                base_url: env.or("MEM0_BASE_URL", "https://api.mem0.ai"),
                api_key: env.required("MEM0_API_KEY")?,
            }),
        };

        let timeout_secs: u64 = env.parsed("UPSTREAM_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "UPSTREAM_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            host: env.or("APP_HOST", "127.0.0.1"),
            port: env.parsed("APP_PORT", 5000)?,
            upstream_timeout: Duration::from_secs(timeout_secs),
            provider,
        })
    }
}

fn self_hosted_config<F>(env: &Env<F>) -> Result<SelfHostedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let engine = EngineConfig {
        base_url: env.or("MEM0_ENGINE_URL", "http://localhost:8888"),
        api_key: env.optional("MEM0_ENGINE_API_KEY"),
    };

    let driver: SearchDriver = env.or("MEMORY_SEARCH_DRIVER", "mem0").parse()?;
    let search = match driver {
        SearchDriver::Engine => SearchConfig::Engine,
        SearchDriver::DirectVector => SearchConfig::DirectVector(vector_search_config(env)?),
    };

    Ok(SelfHostedConfig { engine, search })
}

fn vector_search_config<F>(env: &Env<F>) -> Result<VectorSearchConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let collection_raw = env.or("PGVECTOR_COLLECTION", "agent_memories");
    let collection = CollectionName::parse(&collection_raw).map_err(|reason| {
        ConfigError::Invalid {
            var: "PGVECTOR_COLLECTION",
            value: collection_raw.clone(),
            reason,
        }
    })?;

    let storage = StorageConfig {
        host: env.or("PGVECTOR_HOST", "localhost"),
        port: env.parsed("PGVECTOR_PORT", 5432)?,
        user: env.or("PGVECTOR_USER", "postgres"),
        password: env.optional("PGVECTOR_PASSWORD"),
        dbname: env.or("PGVECTOR_DBNAME", "mem0_db"),
        collection,
    };

    let embedder = EmbedderConfig {
        base_url: env.or("OPENAI_BASE_URL", "https://api.openai.com"),
        api_key: env.required("OPENAI_API_KEY")?,
        model: env.or("EMBEDDING_MODEL", "text-embedding-3-small"),
    };

    let threshold: f64 = env.parsed("MEMORY_SEARCH_THRESHOLD", DEFAULT_SIMILARITY_THRESHOLD)?;
    if !(-1.0..=1.0).contains(&threshold) {
        return Err(ConfigError::Invalid {
            var: "MEMORY_SEARCH_THRESHOLD",
            value: threshold.to_string(),
            reason: "must be between -1 and 1".into(),
        });
    }

    let limit: usize = env.parsed("MEMORY_SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?;
    if limit == 0 {
        return Err(ConfigError::Invalid {
            var: "MEMORY_SEARCH_LIMIT",
            value: "0".into(),
            reason: "must be at least 1".into(),
        });
    }

    Ok(VectorSearchConfig {
        storage,
        embedder,
        threshold,
        limit,
    })
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var: key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
