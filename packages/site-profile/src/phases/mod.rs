//! Single-phase extractors.
//!
//! Phase 1 (brand) and the five Phase 2 extractors share one contract and
//! one runner. Each phase only declares its prompt, payload schema, input
//! shape and minimum-data gate through [`PhaseSpec`]; [`extract`] does the
//! calling, timeout, retry and gating.
//!
//! A phase never falls back on its own. A rejected or failed result comes
//! back with `succeeded == false` and the orchestrator decides what to do
//! with it.

pub mod brand;
pub mod contact;
pub mod content;
pub mod images;
pub mod prompts;
pub mod social_media;
pub mod social_proof;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::error::InferenceError;
use crate::inference::schema::phase_schema;
use crate::preprocess::ReduceMode;
use crate::traits::inference::{InferenceRequest, InferenceResponse, InferenceService, TokenUsage};
use crate::types::config::ExtractionConfig;
use crate::types::phase::Phase;
use crate::types::profile::ExtractedBusinessInfo;
use crate::types::result::PhaseResult;

pub use brand::{BrandAnalysis, BrandPhase};
pub use contact::ContactPhase;
pub use content::{ContentExtraction, ContentPhase};
pub use images::{ImageExtraction, ImagesPhase};
pub use social_media::{SocialMediaExtraction, SocialMediaPhase};
pub use social_proof::SocialProofPhase;

/// Static description of one extraction phase.
pub trait PhaseSpec {
    const PHASE: Phase;

    /// How the page is reduced before it is sent
    const MODE: ReduceMode;

    /// Phase instructions, without the shared confidence rules
    const INSTRUCTIONS: &'static str;

    /// Structured response payload
    type Payload: JsonSchema + DeserializeOwned + Default + Send;

    /// Whether the payload carries the minimum data this phase must find.
    fn has_minimum_data(data: &Self::Payload) -> bool;

    /// Convert an accepted payload into profile fields.
    ///
    /// Relative URLs are resolved against `base_url` and empty values are
    /// left as `None`.
    fn into_fragment(data: Self::Payload, base_url: &str) -> ExtractedBusinessInfo;
}

/// Run one phase against already-reduced page content.
///
/// Transport errors and timeouts are retried up to the phase's retry count
/// with linear backoff. A response that arrives but cannot be parsed is
/// final. The returned result is never an error: failures are recorded in
/// `errors` with `succeeded == false`.
pub async fn extract<P: PhaseSpec>(
    service: &dyn InferenceService,
    reduced_html: &str,
    page_url: &str,
    config: &ExtractionConfig,
) -> PhaseResult<P::Payload> {
    let phase = P::PHASE;
    let policy = config.phases.get(phase);
    let start = Instant::now();

    let request = InferenceRequest {
        phase,
        model: policy.model.clone(),
        system_prompt: prompts::system_prompt(P::INSTRUCTIONS),
        user_prompt: prompts::format_page_prompt(page_url, reduced_html),
        schema: phase_schema::<P::Payload>(),
        temperature: policy.temperature,
        max_tokens: policy.max_tokens,
    };

    debug!(
        phase = phase.label(),
        model = %policy.model,
        input_bytes = reduced_html.len(),
        "Starting phase"
    );

    let mut attempts = 0u32;
    let mut errors = Vec::new();

    let response = loop {
        attempts += 1;

        let error = match timeout(policy.timeout(), service.generate(request.clone())).await {
            Ok(Ok(response)) => break Some(response),
            Ok(Err(e)) => e,
            Err(_) => InferenceError::Timeout {
                timeout_ms: policy.timeout_ms,
            },
        };

        errors.push(format!("attempt {}: {}", attempts, error));

        if !error.is_retryable() || attempts > policy.retries {
            warn!(
                phase = phase.label(),
                attempt = attempts,
                error = %error,
                "Phase call failed"
            );
            break None;
        }

        warn!(
            phase = phase.label(),
            attempt = attempts,
            error = %error,
            "Phase call failed, retrying..."
        );
        sleep(policy.backoff(attempts)).await;
    };

    let duration_ms = start.elapsed().as_millis() as u64;

    let Some(response) = response else {
        let mut result = PhaseResult::failed(
            format!("{} gave up after {} attempts", phase.label(), attempts),
            attempts,
            duration_ms,
        );
        result.errors.extend(errors);
        return result;
    };

    let result = evaluate::<P>(response, config, attempts, duration_ms, errors);

    info!(
        phase = phase.label(),
        succeeded = result.succeeded,
        confidence = result.confidence,
        attempts = attempts,
        duration_ms = duration_ms,
        "Phase complete"
    );

    result
}

/// Parse a response, read its confidence and apply the gate.
fn evaluate<P: PhaseSpec>(
    response: InferenceResponse,
    config: &ExtractionConfig,
    attempts: u32,
    duration_ms: u64,
    mut errors: Vec<String>,
) -> PhaseResult<P::Payload> {
    let phase = P::PHASE;
    let usage = response.usage.unwrap_or_default();
    let confidence = read_confidence(&response.content);

    let (data, parsed) = match serde_json::from_value::<P::Payload>(response.content) {
        Ok(data) => (data, true),
        Err(e) => {
            errors.push(InferenceError::from(e).to_string());
            (P::Payload::default(), false)
        }
    };

    let gate = config.thresholds.gate_for(phase);
    let has_data = parsed && P::has_minimum_data(&data);
    let succeeded = has_data && confidence >= gate;

    let mut warnings = Vec::new();

    if parsed && !succeeded {
        let reason = if has_data {
            format!(
                "{} confidence {:.2} below gate {:.2}",
                phase.label(),
                confidence,
                gate
            )
        } else {
            format!("{} returned no usable data", phase.label())
        };
        warn!(phase = phase.label(), confidence = confidence, "{}", reason);
        warnings.push(reason);
    }

    PhaseResult {
        data,
        confidence,
        succeeded,
        used_fallback: false,
        errors,
        warnings,
        duration_ms,
        attempts,
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    }
}

/// Self-reported confidence, clamped to 0..=1. Missing or non-numeric is 0.
fn read_confidence(content: &serde_json::Value) -> f32 {
    content
        .get("confidence")
        .and_then(serde_json::Value::as_f64)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(0.0)
}

/// Token usage of a finished phase.
pub fn usage_of<T>(result: &PhaseResult<T>) -> TokenUsage {
    TokenUsage {
        prompt_tokens: result.prompt_tokens,
        completion_tokens: result.completion_tokens,
    }
}

/// Trim, drop blanks and remove duplicates, keeping first-seen order.
pub(crate) fn dedupe_strings(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockInference;
    use serde_json::json;
    use std::time::Duration;

    fn fast_config() -> ExtractionConfig {
        let mut config = ExtractionConfig::new();
        config
            .phases
            .for_each_mut(|p| *p = p.clone().with_timeout_ms(1_000).with_retries(2, 100));
        config
    }

    #[test]
    fn test_read_confidence() {
        assert_eq!(read_confidence(&json!({"confidence": 0.8})), 0.8);
        assert_eq!(read_confidence(&json!({"confidence": 7})), 1.0);
        assert_eq!(read_confidence(&json!({"confidence": "high"})), 0.0);
        assert_eq!(read_confidence(&json!({})), 0.0);
    }

    #[test]
    fn test_dedupe_strings() {
        let out = dedupe_strings(vec![
            " Roboto ".into(),
            "roboto".into(),
            "".into(),
            "Lato".into(),
        ]);
        assert_eq!(out, vec!["Roboto".to_string(), "Lato".to_string()]);
    }

    #[tokio::test]
    async fn test_accepts_confident_result() {
        let mock = MockInference::new().with_response(
            Phase::Contact,
            json!({"emails": ["hi@acme.test"], "phones": [], "addresses": [], "hours": [],
                   "social_links": [], "coordinates": null, "confidence": 0.9}),
        );

        let result =
            extract::<ContactPhase>(&mock, "<p>hi@acme.test</p>", "https://acme.test", &fast_config())
                .await;

        assert!(result.succeeded);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.data.emails, vec!["hi@acme.test".to_string()]);
    }

    #[tokio::test]
    async fn test_low_confidence_is_returned_but_rejected() {
        let mock = MockInference::new().with_response(
            Phase::Brand,
            json!({"brand_colors": ["#000000"], "fonts": [], "typography": null,
                   "design_tokens": null, "logo_url": null, "confidence": 0.1}),
        );

        let result = extract::<BrandPhase>(&mock, "<div/>", "https://acme.test", &fast_config()).await;

        assert!(!result.succeeded);
        assert_eq!(result.data.brand_colors, vec!["#000000".to_string()]);
        assert!(result.warnings.iter().any(|w| w.contains("below gate")));
        assert!(result.errors.is_empty());
        assert_eq!(mock.call_count(Phase::Brand), 1);
    }

    #[tokio::test]
    async fn test_invalid_response_is_not_retried() {
        let mock = MockInference::new()
            .with_response(Phase::SocialMedia, json!({"profiles": "nope", "confidence": 0.9}));

        let result =
            extract::<SocialMediaPhase>(&mock, "", "https://acme.test", &fast_config()).await;

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 1);
        assert_eq!(mock.call_count(Phase::SocialMedia), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_retry_with_backoff() {
        let mock = MockInference::new()
            .with_delay(Phase::Images, Duration::from_secs(60))
            .with_response(Phase::Images, json!({"images": [], "galleries": [], "confidence": 0.9}));

        let result = extract::<ImagesPhase>(&mock, "", "https://acme.test", &fast_config()).await;

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 3);
        assert_eq!(mock.call_count(Phase::Images), 3);
        // 3 x 1000ms timeouts + 100ms + 200ms backoff
        assert!(result.duration_ms >= 3_300 && result.duration_ms < 3_400);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let mock = MockInference::new().with_error(
            Phase::Content,
            InferenceError::Api {
                status: 400,
                message: "bad request".into(),
            },
        );

        let result = extract::<ContentPhase>(&mock, "", "https://acme.test", &fast_config()).await;

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 1);
        assert!(result.errors.iter().any(|e| e.contains("400")));
    }
}
