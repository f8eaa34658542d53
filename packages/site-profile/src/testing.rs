//! Testing utilities including mock implementations.
//!
//! These are useful for testing code that runs the analyzer without making
//! real inference calls.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::error::{InferenceError, InferenceResult};
use crate::traits::fallback::FallbackExtractor;
use crate::traits::inference::{InferenceRequest, InferenceResponse, InferenceService};
use crate::types::phase::Phase;
use crate::types::profile::ExtractedBusinessInfo;

/// How long a stalled call hangs. Longer than any sane phase timeout.
const STALL: Duration = Duration::from_secs(3_600);

/// A mock inference service for testing.
///
/// Returns scripted per-phase responses. Unscripted phases answer with an
/// empty payload at zero confidence, which every gate rejects.
#[derive(Default, Clone)]
pub struct MockInference {
    /// Response content by phase
    responses: Arc<RwLock<HashMap<Phase, Value>>>,

    /// Errors returned instead of a response
    errors: Arc<RwLock<HashMap<Phase, InferenceError>>>,

    /// Delay before answering
    delays: Arc<RwLock<HashMap<Phase, Duration>>>,

    /// Number of leading calls that hang past any timeout
    stalls: Arc<RwLock<HashMap<Phase, u32>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockInferenceCall>>>,
}

/// Record of a call made to the mock.
#[derive(Debug, Clone)]
pub struct MockInferenceCall {
    pub phase: Phase,
    pub model: String,
    pub user_prompt: String,
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `phase` with this raw content.
    pub fn with_response(self, phase: Phase, content: Value) -> Self {
        write(&self.responses).insert(phase, content);
        self
    }

    /// Answer `phase` with a serialized payload plus a confidence field.
    pub fn with_payload<T: Serialize>(self, phase: Phase, payload: &T, confidence: f32) -> Self {
        let mut content = serde_json::to_value(payload).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut content {
            map.insert("confidence".to_string(), json!(confidence));
        }
        self.with_response(phase, content)
    }

    /// Fail every call for `phase` with `error`.
    pub fn with_error(self, phase: Phase, error: InferenceError) -> Self {
        write(&self.errors).insert(phase, error);
        self
    }

    /// Delay every answer for `phase`.
    pub fn with_delay(self, phase: Phase, delay: Duration) -> Self {
        write(&self.delays).insert(phase, delay);
        self
    }

    /// Hang the first `count` calls for `phase` so they time out.
    pub fn with_stalls(self, phase: Phase, count: u32) -> Self {
        write(&self.stalls).insert(phase, count);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockInferenceCall> {
        read(&self.calls).clone()
    }

    /// Number of calls issued for one phase.
    pub fn call_count(&self, phase: Phase) -> usize {
        read(&self.calls).iter().filter(|c| c.phase == phase).count()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        write(&self.calls).clear();
    }
}

#[async_trait]
impl InferenceService for MockInference {
    async fn generate(&self, request: InferenceRequest) -> InferenceResult<InferenceResponse> {
        let phase = request.phase;

        let call_index = {
            let mut calls = write(&self.calls);
            let index = calls.iter().filter(|c| c.phase == phase).count() as u32;
            calls.push(MockInferenceCall {
                phase,
                model: request.model.clone(),
                user_prompt: request.user_prompt.clone(),
            });
            index
        };

        let stalls = read(&self.stalls).get(&phase).copied().unwrap_or(0);
        if call_index < stalls {
            tokio::time::sleep(STALL).await;
        }

        let delay = read(&self.delays).get(&phase).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = read(&self.errors).get(&phase).cloned() {
            return Err(error);
        }

        let content = read(&self.responses)
            .get(&phase)
            .cloned()
            .unwrap_or_else(|| json!({ "confidence": 0.0 }));

        Ok(InferenceResponse::new(content).with_usage(1_000, 200))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Fallback extractor that returns the same profile for every page.
#[derive(Debug, Clone, Default)]
pub struct StaticFallback {
    info: ExtractedBusinessInfo,
}

impl StaticFallback {
    pub fn new(info: ExtractedBusinessInfo) -> Self {
        Self { info }
    }
}

impl FallbackExtractor for StaticFallback {
    fn extract_business_info(&self, _html: &str, _base_url: &str) -> ExtractedBusinessInfo {
        self.info.clone()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
