use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::handler::ToolHandler;
use super::registry::ToolRegistry;
use crate::memory::{AddAttributes, SearchFilter};
use crate::provider::MemoryProvider;

pub const GET_CONTEXTUAL_MEMORY: &str = "get_contextual_memory";
pub const ADD_TO_MEMORY: &str = "add_to_memory";

/// Registry holding both memory tools, sharing one provider.
pub fn memory_tools(provider: Arc<dyn MemoryProvider>) -> ToolRegistry {
    ToolRegistry::new()
        .add(
            GET_CONTEXTUAL_MEMORY,
            get_contextual_memory_schema(),
            GetContextualMemory {
                provider: provider.clone(),
            },
        )
        .add(ADD_TO_MEMORY, add_to_memory_schema(), AddToMemory { provider })
}

#[derive(Deserialize)]
struct SearchInput {
    #[serde(alias = "user_input")]
    query: String,
    #[serde(default, alias = "filter_attributes")]
    filters: Option<SearchFilter>,
}

/// Semantic search over stored memories.
pub struct GetContextualMemory {
    provider: Arc<dyn MemoryProvider>,
}

#[async_trait]
impl ToolHandler for GetContextualMemory {
    async fn call(&self, input: &Value) -> Result<Value, String> {
        let input: SearchInput = serde_json::from_value(input.clone())
            .map_err(|e| format!("invalid arguments: {e}"))?;
        let filter = input.filters.unwrap_or_default();

        let response = self.provider.search(&input.query, &filter).await;
        serde_json::to_value(response).map_err(|e| e.to_string())
    }
}

#[derive(Deserialize)]
struct AddInput {
    message: String,
    user_id: String,
    run_id: String,
    agent_id: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

/// Stores a message under user/run/agent identity tags.
pub struct AddToMemory {
    provider: Arc<dyn MemoryProvider>,
}

#[async_trait]
impl ToolHandler for AddToMemory {
    async fn call(&self, input: &Value) -> Result<Value, String> {
        let input: AddInput = serde_json::from_value(input.clone())
            .map_err(|e| format!("invalid arguments: {e}"))?;
        let attributes = AddAttributes {
            user_id: input.user_id,
            run_id: input.run_id,
            agent_id: input.agent_id,
            metadata: input.metadata,
        };

        match self.provider.add(&input.message, &attributes).await {
            Ok(response) => serde_json::to_value(response).map_err(|e| e.to_string()),
            Err(e) => {
                warn!(user_id = %attributes.user_id, error = %e, "add_to_memory failed");
                Err(format!("failed to add memory: {e}"))
            }
        }
    }
}

fn get_contextual_memory_schema() -> Value {
    json!({
        "name": GET_CONTEXTUAL_MEMORY,
        "description": "Fetch relevant contextual memory for the given query, optionally restricted to a user, run or agent.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text to search for relevant memories"
                },
                "filters": {
                    "type": "object",
                    "description": "Optional identity filters. Omitted or null fields impose no constraint.",
                    "properties": {
                        "user_id": { "type": ["string", "null"], "description": "Filter by user identifier" },
                        "run_id": { "type": ["string", "null"], "description": "Filter by conversation/run identifier" },
                        "agent_id": { "type": ["string", "null"], "description": "Filter by agent identifier" }
                    }
                }
            },
            "required": ["query"]
        }
    })
}

fn add_to_memory_schema() -> Value {
    json!({
        "name": ADD_TO_MEMORY,
        "description": "Add a message to memory under the given user, run and agent.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "The message/memory content to store" },
                "user_id": { "type": "string", "description": "User identifier to associate with the memory" },
                "run_id": { "type": "string", "description": "Conversation/run identifier for grouping related memories" },
                "agent_id": { "type": "string", "description": "Agent/application identifier that created the memory" },
                "metadata": { "type": "object", "description": "Optional additional key-value pairs to store with the memory" }
            },
            "required": ["message", "user_id", "run_id", "agent_id"]
        }
    })
}
