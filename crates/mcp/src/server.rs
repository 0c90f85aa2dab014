//! MCP server management (spawn, communicate, lifecycle).

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListToolsParams, ListToolsResult, RequestId, Tool,
    is_response,
};

/// Default timeout for MCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum output size (1MB).
/// Sized for large tool outputs (file reads, search results).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Upper bound on `tools/list` pages followed before giving up.
const MAX_LIST_PAGES: usize = 64;

/// Launch specification for an MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// Human-readable summary shown when connecting.
    pub description: Option<String>,
}

impl ServerConfig {
    /// Build a launch spec for a server script, picking the interpreter from
    /// the file extension.
    ///
    /// `.py` runs under Python, `.js`/`.mjs`/`.cjs` under Node. Anything else
    /// is executed directly.
    pub fn from_script(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let script = path.to_string_lossy().into_owned();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.clone());

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        let (command, args) = match extension.as_deref() {
            Some("py") => (python_command().to_string(), vec![script]),
            Some("js" | "mjs" | "cjs") => ("node".to_string(), vec![script]),
            _ => {
                warn!(script = %script, "server script has no .py or .js extension; executing it directly");
                (script, Vec::new())
            }
        };

        Self {
            name,
            command,
            args,
            env: HashMap::new(),
            description: None,
        }
    }
}

fn python_command() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Server stdout plus any bytes of a line not yet terminated.
///
/// The partial line outlives a timed-out read so the next read resumes
/// mid-line instead of parsing a fragment.
struct LineReader {
    inner: BufReader<ChildStdout>,
    pending: Vec<u8>,
}

/// Handle to a running MCP server.
pub struct Server {
    config: ServerConfig,
    process: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<LineReader>,
    next_id: AtomicI64,
    initialized: Mutex<bool>,
    server_info: Mutex<Option<InitializeResult>>,
    request_timeout: Duration,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Spawn a new MCP server process.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        debug!(server = %config.name, command = %config.command, args = ?config.args, "spawning MCP server");

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let spawn_error = |source| Error::Spawn {
            command: config.command.clone(),
            source,
        };

        let mut process = cmd.spawn().map_err(spawn_error)?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("failed to capture stdout")))?;

        Ok(Self {
            config,
            process: Mutex::new(process),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(LineReader {
                inner: BufReader::new(stdout),
                pending: Vec::new(),
            }),
            next_id: AtomicI64::new(1),
            initialized: Mutex::new(false),
            server_info: Mutex::new(None),
            request_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Initialize the server (must be called before other operations).
    pub async fn initialize(&self) -> Result<&Self> {
        let params = InitializeParams::default();
        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        debug!(
            server = %self.config.name,
            remote = %result.server_info.name,
            protocol = %result.protocol_version,
            "MCP handshake complete"
        );

        self.notify(JsonRpcNotification::new("notifications/initialized"))
            .await?;

        *self.server_info.lock().await = Some(result);
        *self.initialized.lock().await = true;

        Ok(self)
    }

    /// Check if the server is initialized.
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    /// Get server info (after initialization).
    pub async fn server_info(&self) -> Option<InitializeResult> {
        self.server_info.lock().await.clone()
    }

    /// Refresh the list of available tools, following pagination cursors.
    pub async fn refresh_tools(&self) -> Result<Vec<Tool>> {
        if !*self.initialized.lock().await {
            return Err(Error::NotInitialized);
        }

        let mut tools = Vec::new();
        let mut cursor = None;
        for _ in 0..MAX_LIST_PAGES {
            let params = ListToolsParams { cursor };
            let page: ListToolsResult = self.request("tools/list", Some(params)).await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        Err(Error::InvalidResponse(format!(
            "tools/list did not finish within {MAX_LIST_PAGES} pages"
        )))
    }

    /// Call a tool by name.
    ///
    /// A result flagged `isError` is turned into [`Error::ToolCallFailed`].
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        if !*self.initialized.lock().await {
            return Err(Error::NotInitialized);
        }

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            let error_text = result
                .text()
                .unwrap_or_else(|| "tool reported an error without details".to_string());
            return Err(Error::ToolCallFailed(error_text));
        }

        Ok(result)
    }

    /// Check if the server process is still running.
    pub async fn is_running(&self) -> bool {
        let mut process = self.process.lock().await;
        matches!(process.try_wait(), Ok(None))
    }

    /// Shut down the server: close its stdin and kill the process.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut stdin = self.stdin.lock().await;
            let _ = stdin.shutdown().await;
        }

        let mut process = self.process.lock().await;
        if matches!(process.try_wait(), Ok(None)) {
            process.kill().await?;
        }
        *self.initialized.lock().await = false;
        debug!(server = %self.config.name, "MCP server stopped");

        Ok(())
    }

    // --- Internal methods ---

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        let request_json = serde_json::to_string(&request)?;
        trace!(server = %self.config.name, %method, "-> {request_json}");
        self.write_line(&request_json).await?;

        let response = timeout(self.request_timeout, self.read_response(&id))
            .await
            .map_err(|_| {
                warn!(server = %self.config.name, %method, "MCP request timed out");
                Error::Timeout
            })??;

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)?;

        Ok(result)
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        let notification_json = serde_json::to_string(&notification)?;
        self.write_line(&notification_json).await
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read the response to `expected`.
    ///
    /// Server-initiated notifications and requests, blank lines and late
    /// responses to earlier (timed-out) requests are skipped. An error
    /// response without an id is handed to the waiting request.
    async fn read_response(&self, expected: &RequestId) -> Result<JsonRpcResponse> {
        let mut stdout = self.stdout.lock().await;
        let LineReader { inner, pending } = &mut *stdout;

        loop {
            let bytes_read = inner.read_until(b'\n', pending).await?;
            if bytes_read == 0 {
                return Err(Error::ServerExited);
            }

            let line = std::mem::take(pending);
            if line.len() > MAX_OUTPUT_SIZE {
                return Err(Error::OutputTooLarge {
                    size: line.len(),
                    max: MAX_OUTPUT_SIZE,
                });
            }

            let text = String::from_utf8_lossy(&line);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!(server = %self.config.name, "<- {trimmed}");

            let message: Value = serde_json::from_str(trimmed)?;
            if !is_response(&message) {
                debug!(
                    server = %self.config.name,
                    method = message.get("method").and_then(serde_json::Value::as_str).unwrap_or("?"),
                    "ignoring server-initiated message"
                );
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(message)?;
            match &response.id {
                Some(id) if id != expected => {
                    debug!(
                        server = %self.config.name,
                        stale = ?id,
                        expected = ?expected,
                        "discarding stale response"
                    );
                }
                _ => return Ok(response),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_scripts_use_python() {
        let config = ServerConfig::from_script("servers/weather.py");
        assert_eq!(config.command, python_command());
        assert_eq!(config.args, vec!["servers/weather.py".to_string()]);
        assert_eq!(config.name, "weather");
    }

    #[test]
    fn javascript_scripts_use_node() {
        let config = ServerConfig::from_script("../mcp-server/build/index.js");
        assert_eq!(config.command, "node");
        assert_eq!(config.args, vec!["../mcp-server/build/index.js".to_string()]);
    }

    #[test]
    fn other_paths_run_directly() {
        let config = ServerConfig::from_script("./target/release/my-server");
        assert_eq!(config.command, "./target/release/my-server");
        assert!(config.args.is_empty());
        assert!(config.env.is_empty());
    }

    #[tokio::test]
    async fn spawn_missing_binary_fails() {
        let config = ServerConfig {
            name: "missing".to_string(),
            command: "/definitely/not/a/real/mcp-server".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            description: None,
        };
        let err = Server::spawn(config).await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
