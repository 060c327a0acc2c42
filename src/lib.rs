pub mod config;
pub mod error;
pub mod memory;
pub mod provider;
pub mod server;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, ProviderKind, SearchDriver};
pub use error::ConfigError;
pub use memory::{
    AddAttributes, AddResponse, MemoryError, MemoryHit, SearchFilter, SearchResponse, Status,
};
pub use provider::{create_provider, CloudProvider, MemoryProvider, SelfHostedProvider, VectorSearch};
pub use tools::{memory_tools, ToolHandler, ToolRegistry};
