//! Tool server trait.

use super::{ServerError, ToolDefinition, ToolOutput};
use serde_json::{Map, Value};
use std::future::Future;

/// A process exposing callable tools.
///
/// This is the boundary between the tool gateway and the transport that
/// actually reaches the server.
pub trait ToolServer: Send + Sync {
    /// Name used in logs and step traces.
    fn name(&self) -> &str;

    /// List the tools the server offers.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolDefinition>, ServerError>> + Send;

    /// Invoke a tool with structured arguments.
    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> impl Future<Output = Result<ToolOutput, ServerError>> + Send;

    /// Stop the server. Called once, when the session closes.
    fn shutdown(&self) -> impl Future<Output = Result<(), ServerError>> + Send;
}
