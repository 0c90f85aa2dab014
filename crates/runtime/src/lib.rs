//! mcp-chat runtime: chat sessions whose model can call MCP tools.
//!
//! This crate connects a chat-completion backend to an MCP tool server and
//! runs the conversation between them.
//!
//! # Overview
//!
//! - **ToolGateway**: discovers a server's tools once, translates them into
//!   function schemas and executes requested calls, turning every failure into
//!   a result the model can read.
//! - **Backend**: a trait over chat-completion providers, implemented for
//!   OpenAI-compatible APIs by [`OpenAiBackend`].
//! - **Session**: owns the message history and runs each turn: query, tool
//!   execution, one follow-up.
//!
//! # Example
//!
//! ```ignore
//! use mcp::ServerConfig;
//! use runtime::{OpenAiBackend, Session, ToolGateway};
//! use steplog::StepStore;
//!
//! # async fn example() -> runtime::Result<()> {
//! let server = runtime::connect(ServerConfig::from_script("weather.py")).await?;
//! let tools = ToolGateway::discover(server).await?;
//! let backend = OpenAiBackend::builder("sk-...").model("gpt-4o-mini").build();
//!
//! let mut session = Session::new(backend, tools, StepStore::disabled());
//! println!("{}", session.chat("What's the weather in Paris?").await);
//! session.close().await;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
pub mod providers;
pub mod schema;
mod session;
pub mod tools;

pub use error::{Error, Result};

pub use model::{
    Backend, History, Message, ModelError, ModelRequest, ModelTurn, Role, ToolCallRequest,
};

pub use providers::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiBackend, OpenAiBackendBuilder};

pub use schema::{FunctionDefinition, FunctionSchema, translate};

pub use session::Session;

pub use tools::{
    ServerError, ToolCallResult, ToolDefinition, ToolError, ToolGateway, ToolOutcome, ToolOutput,
    ToolServer, connect,
};
