//! Tool discovery, invocation and the MCP server binding.

pub mod errors;
mod gateway;
mod mcp_host;
mod server;
pub mod types;
mod validate;

pub use errors::{ServerError, ToolError};
pub use gateway::ToolGateway;
pub use mcp_host::connect;
pub use server::ToolServer;
pub use types::{ToolCallResult, ToolDefinition, ToolOutcome, ToolOutput};
pub use validate::validate;
