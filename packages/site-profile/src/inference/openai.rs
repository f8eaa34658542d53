//! OpenAI-compatible implementation of the inference service.
//!
//! Sends one `/chat/completions` request per call using the strict
//! `json_schema` response format.
//!
//! # Example
//!
//! ```rust,ignore
//! use site_profile::inference::OpenAiGateway;
//!
//! let gateway = OpenAiGateway::new("sk-...").with_base_url("https://gateway.internal/v1");
//! let analyzer = Analyzer::new(config).with_inference(Arc::new(gateway));
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{InferenceError, InferenceResult};
use crate::traits::inference::{InferenceRequest, InferenceResponse, InferenceService, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Gateway client for OpenAI-compatible chat completion APIs.
#[derive(Clone)]
pub struct OpenAiGateway {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiGateway {
    /// Create a new gateway client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_body(request: &InferenceRequest) -> ChatRequest<'_> {
        let (max_tokens, max_completion_tokens) = if uses_max_completion_tokens(&request.model) {
            (None, Some(request.max_tokens))
        } else {
            (Some(request.max_tokens), None)
        };

        ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens,
            max_completion_tokens,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.phase.name(),
                    strict: true,
                    schema: &request.schema,
                },
            },
        }
    }
}

impl fmt::Debug for OpenAiGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiGateway")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Reasoning models reject `max_tokens`.
fn uses_max_completion_tokens(model: &str) -> bool {
    model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
        || model.starts_with("gpt-5")
}

#[async_trait]
impl InferenceService for OpenAiGateway {
    async fn generate(&self, request: InferenceRequest) -> InferenceResult<InferenceResponse> {
        let start = Instant::now();
        let body = Self::build_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(phase = request.phase.label(), error = %e, "Inference request failed");
                InferenceError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                phase = request.phase.label(),
                status = %status,
                error = %message,
                "Inference API error"
            );
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        let parsed = parse_chat_response(&bytes)?;

        debug!(
            phase = request.phase.label(),
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Inference call complete"
        );

        Ok(parsed)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Decode a successful chat completion body.
///
/// Anything that arrived but does not match the expected shape is an
/// invalid response, never a transport error.
fn parse_chat_response(body: &[u8]) -> InferenceResult<InferenceResponse> {
    let raw: ChatResponse = serde_json::from_slice(body)?;

    let message = raw
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| InferenceError::InvalidResponse("no choices in response".into()))?;

    if let Some(refusal) = message.refusal {
        return Err(InferenceError::InvalidResponse(format!("model refused: {}", refusal)));
    }

    let text = message
        .content
        .ok_or_else(|| InferenceError::InvalidResponse("empty message content".into()))?;
    let content: serde_json::Value = serde_json::from_str(&text)?;

    Ok(InferenceResponse {
        content,
        usage: raw.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'static str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageRaw>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct UsageRaw {
    prompt_tokens: u32,
    completion_tokens: u32,
}
