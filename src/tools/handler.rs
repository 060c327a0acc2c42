use async_trait::async_trait;
use serde_json::Value;

/// A tool's execution handler. Returns the tool's structured output, or a
/// message describing why the call failed.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: &Value) -> Result<Value, String>;
}

/// A tool definition: schema advertised to clients + handler for execution.
pub struct ToolDef {
    pub name: String,
    pub schema: Value,
    pub(crate) handler: Box<dyn ToolHandler>,
}
