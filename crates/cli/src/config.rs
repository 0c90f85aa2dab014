//! Configuration loading: backend settings from mcp-chat.toml and the
//! environment, server launch specs from a servers JSON file.

use crate::error::Error;
use mcp::ServerConfig;
use runtime::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "mcp-chat.toml";

/// Identifier that selects the servers file's `defaultServer`.
pub const DEFAULT_SERVER: &str = "default";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_TRACE_DIR: &str = "MCP_CHAT_TRACE_DIR";

/// Top-level configuration from mcp-chat.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub trace: TraceConfig,
}

/// Chat-completion backend configuration.
#[derive(Debug, Default, Deserialize)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Step trace configuration.
#[derive(Debug, Default, Deserialize)]
pub struct TraceConfig {
    /// Directory for `Step<N>.json` files. Tracing is off when unset.
    pub dir: Option<PathBuf>,
}

/// Resolved settings, ready to build a backend from.
#[cfg_attr(test, derive(Debug))]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub trace_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise start from defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Let non-empty environment values override the file.
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(ENV_API_KEY) {
            self.backend.api_key = Some(key);
        }
        if let Some(model) = var(ENV_MODEL) {
            self.backend.model = Some(model);
        }
        if let Some(url) = var(ENV_BASE_URL) {
            self.backend.base_url = Some(url);
        }
        if let Some(dir) = var(ENV_TRACE_DIR) {
            self.trace.dir = Some(dir.into());
        }
        self
    }

    /// Fill in defaults. An API key is required.
    pub fn settings(self) -> Result<Settings, ConfigError> {
        let api_key = self
            .backend
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Settings {
            api_key,
            model: self
                .backend
                .model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self
                .backend
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            trace_dir: self.trace.dir,
        })
    }
}

/// A servers JSON file: named launch specs plus optional defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServersFile {
    #[serde(default)]
    pub mcp_servers: HashMap<String, ServerEntry>,

    /// Server used when the identifier is `default`.
    pub default_server: Option<String>,

    /// System prompt for sessions started from this file.
    pub system: Option<String>,
}

/// One launch spec in a servers file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub description: Option<String>,
}

impl ServersFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the launch spec for `identifier`, expanding `${VAR}` placeholders
    /// in its environment.
    pub fn resolve(
        &self,
        identifier: &str,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<ServerConfig, ConfigError> {
        let name = if identifier == DEFAULT_SERVER {
            self.default_server
                .as_deref()
                .ok_or(ConfigError::NoDefaultServer)?
        } else {
            identifier
        };

        let entry = self
            .mcp_servers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownServer(name.to_string()))?;

        Ok(ServerConfig {
            name: name.to_string(),
            command: entry.command.clone(),
            args: entry.args.clone(),
            env: entry
                .env
                .iter()
                .map(|(k, v)| (k.clone(), expand_placeholders(v, &var)))
                .collect(),
            description: entry.description.clone(),
        })
    }
}

/// What to start for a session: the server and an optional system prompt.
#[derive(Debug)]
pub struct Launch {
    pub server: ServerConfig,
    pub system: Option<String>,
}

/// Resolve the command-line server argument.
///
/// With a servers file the identifier names an entry (or `default`) and the
/// file's `system` seeds the session. A name the file lacks is reported as a
/// connection failure. Without a file the identifier is a script path.
pub fn launch(
    servers_file: Option<&Path>,
    identifier: &str,
    var: impl Fn(&str) -> Option<String>,
) -> crate::error::Result<Launch> {
    let Some(path) = servers_file else {
        return Ok(Launch {
            server: ServerConfig::from_script(identifier),
            system: None,
        });
    };

    let file = ServersFile::load(path)?;
    let server = file.resolve(identifier, var).map_err(|e| match e {
        ConfigError::UnknownServer(_) => Error::Runtime(runtime::Error::Connection(e.to_string())),
        other => other.into(),
    })?;

    Ok(Launch {
        server,
        system: file.system,
    })
}

/// Replace `${NAME}` with the variable's value. Unknown names are left as is.
pub fn expand_placeholders(input: &str, var: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match var(name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("API key not configured: set OPENAI_API_KEY or backend.api_key in mcp-chat.toml")]
    MissingApiKey,

    #[error("`default` requested but the servers file sets no defaultServer")]
    NoDefaultServer,

    #[error("no server named `{0}` in the servers file")]
    UnknownServer(String),
}
