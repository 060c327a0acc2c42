pub mod handler;
pub mod memory;
pub mod registry;

pub use handler::{ToolDef, ToolHandler};
pub use memory::{memory_tools, AddToMemory, GetContextualMemory};
pub use registry::ToolRegistry;
