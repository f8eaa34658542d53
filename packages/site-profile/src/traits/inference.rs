//! Inference service trait.
//!
//! Abstracts the external LLM gateway: one structured-generation call per
//! request, no retries and no timeouts. Both are client-side policy applied
//! by the phase runner.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::InferenceResult;
use crate::types::phase::Phase;

/// A structured-generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    /// Phase issuing the request (routing and logging only)
    pub phase: Phase,

    /// Model identifier
    pub model: String,

    /// Fixed per-phase instructions
    pub system_prompt: String,

    /// Page URL plus preprocessed HTML
    pub user_prompt: String,

    /// Strict JSON schema the response must follow
    pub schema: serde_json::Value,

    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token counts reported by the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Parsed response object plus usage.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    pub content: serde_json::Value,
    pub usage: Option<TokenUsage>,
}

impl InferenceResponse {
    pub fn new(content: serde_json::Value) -> Self {
        Self {
            content,
            usage: None,
        }
    }

    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some(TokenUsage {
            prompt_tokens,
            completion_tokens,
        });
        self
    }
}

/// External structured-generation gateway.
///
/// Implementations wrap a specific provider and must not retry
/// internally.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Issue one structured-generation call.
    async fn generate(&self, request: InferenceRequest) -> InferenceResult<InferenceResponse>;

    /// Provider name for logs.
    fn name(&self) -> &str {
        "inference"
    }
}
