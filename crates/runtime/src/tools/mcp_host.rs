//! MCP-backed tool server.

use super::{ServerError, ToolDefinition, ToolOutput, ToolServer};
use crate::{Error, Result};
use mcp::{Server, ServerConfig};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Spawn an MCP server and complete the protocol handshake.
pub async fn connect(config: ServerConfig) -> Result<Server> {
    let name = config.name.clone();
    let server = Server::spawn(config)
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;

    if let Err(e) = server.initialize().await {
        if let Err(stop) = server.shutdown().await {
            warn!(server = %name, error = %stop, "failed to stop server after handshake failure");
        }
        return Err(Error::Connection(format!(
            "handshake with `{name}` failed: {e}"
        )));
    }

    info!(server = %name, "connected to MCP server");
    Ok(server)
}

impl From<mcp::Error> for ServerError {
    fn from(error: mcp::Error) -> Self {
        match error {
            mcp::Error::ToolCallFailed(text) => Self::Rejected(text),
            mcp::Error::JsonRpc(rpc) => Self::Rejected(rpc.to_string()),
            mcp::Error::Json(e) => Self::Malformed(e.to_string()),
            mcp::Error::InvalidResponse(text) => Self::Malformed(text),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl ToolServer for Server {
    fn name(&self) -> &str {
        Server::name(self)
    }

    async fn list_tools(&self) -> std::result::Result<Vec<ToolDefinition>, ServerError> {
        let tools = self.refresh_tools().await?;
        Ok(tools.into_iter().map(ToolDefinition::from).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> std::result::Result<ToolOutput, ServerError> {
        let result = Server::call_tool(self, name, Some(Value::Object(arguments))).await?;

        if let Some(text) = result.text() {
            return Ok(ToolOutput::Text(text));
        }
        if let Some(structured) = result.structured_content {
            return Ok(ToolOutput::Structured(structured));
        }
        let content = serde_json::to_value(&result.content)
            .map_err(|e| ServerError::Malformed(format!("serialize result: {e}")))?;
        Ok(ToolOutput::Structured(content))
    }

    async fn shutdown(&self) -> std::result::Result<(), ServerError> {
        Server::shutdown(self).await?;
        Ok(())
    }
}
