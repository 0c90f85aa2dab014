//! OpenAI-compatible chat-completions backend.

use crate::model::{Backend, Message, ModelError, ModelRequest, ModelTurn, Role, ToolCallRequest};
use crate::schema::FunctionSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [FunctionSchema]>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: Role,
    /// Serialized as `null` for call-only assistant messages.
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ApiToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunctionCall<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: Option<ApiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiResponseCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseCall {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    function: Option<ApiResponseFunction>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseFunction {
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiBackendBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Base URL up to, but not including, `/chat/completions`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> OpenAiBackend {
        OpenAiBackend {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
            api_key: self.api_key,
            model: self.model,
        }
    }
}

/// Backend speaking the OpenAI chat-completions protocol.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiBackend {
    pub fn builder(api_key: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(api_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn message_to_api(msg: &Message) -> ApiMessage<'_> {
        let content = match (&msg.content, msg.tool_calls.is_empty()) {
            (Some(text), _) => Some(text.as_str()),
            (None, false) => None,
            (None, true) => Some(""),
        };

        ApiMessage {
            role: msg.role,
            content,
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| ApiToolCall {
                    id: &call.id,
                    kind: "function",
                    function: ApiFunctionCall {
                        name: &call.name,
                        arguments: &call.arguments,
                    },
                })
                .collect(),
            tool_call_id: msg.tool_call_id.as_deref(),
        }
    }

    fn build_request<'a>(&'a self, request: ModelRequest<'a>) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: request.messages.iter().map(Self::message_to_api).collect(),
            tools: request.tools.filter(|tools| !tools.is_empty()),
        }
    }

    fn parse_response(body: &str) -> Result<ModelTurn, ModelError> {
        let response: ApiResponse = serde_json::from_str(body)
            .map_err(|e| ModelError::MalformedResponse(format!("decode body: {e}")))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::MalformedResponse("no choices".into()))?;
        let message = choice
            .message
            .ok_or_else(|| ModelError::MalformedResponse("choice has no message".into()))?;

        let calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter(|call| call.kind.as_deref().is_none_or(|k| k == "function"))
            .map(Self::call_from_api)
            .collect::<Result<Vec<_>, _>>()?;

        if calls.is_empty() {
            return Ok(ModelTurn::text(message.content.unwrap_or_default()));
        }

        Ok(ModelTurn::ToolCallsRequested {
            content: message.content.filter(|c| !c.trim().is_empty()),
            calls,
        })
    }

    fn call_from_api(call: ApiResponseCall) -> Result<ToolCallRequest, ModelError> {
        let id = call
            .id
            .ok_or_else(|| ModelError::MalformedResponse("tool call without id".into()))?;
        let function = call.function.ok_or_else(|| {
            ModelError::MalformedResponse(format!("tool call {id} has no function"))
        })?;
        let name = function.name.ok_or_else(|| {
            ModelError::MalformedResponse(format!("tool call {id} has no function name"))
        })?;

        Ok(ToolCallRequest {
            id,
            name,
            arguments: function.arguments.unwrap_or_default(),
        })
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({}, {})", self.model, self.endpoint)
    }
}

impl Backend for OpenAiBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelTurn, ModelError> {
        let api_request = self.build_request(request);
        debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.map_or(0, <[FunctionSchema]>::len),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(ModelError::Unavailable(format!("{status}: {body}")));
        }

        Self::parse_response(&body)
    }
}
