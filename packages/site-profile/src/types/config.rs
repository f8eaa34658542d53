//! Configuration types for an extraction run.
//!
//! A single [`ExtractionConfig`] is built once per run and passed by
//! reference into every component. Nothing in the library reads the
//! process environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AnalysisError;
use crate::preprocess::ReduceMode;
use crate::types::phase::Phase;

const VISION_MODEL: &str = "gpt-4o";
const FAST_MODEL: &str = "gpt-4o-mini";

/// Per-phase call policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Model identifier sent to the gateway
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on output tokens
    pub max_tokens: u32,

    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,

    /// Extra attempts after the first one fails with a retryable error
    pub retries: u32,

    /// Base delay between attempts in milliseconds.
    ///
    /// The n-th retry waits `n * retry_delay_ms`.
    pub retry_delay_ms: u64,
}

impl PhaseConfig {
    /// Visual analysis defaults (vision-capable model).
    pub fn vision() -> Self {
        Self {
            model: VISION_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 2_000,
            timeout_ms: 30_000,
            retries: 2,
            retry_delay_ms: 1_000,
        }
    }

    /// Text extraction defaults (fast model).
    pub fn text() -> Self {
        Self {
            model: FAST_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1_500,
            timeout_ms: 20_000,
            retries: 2,
            retry_delay_ms: 1_000,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(retry as u64))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn with_retries(mut self, retries: u32, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }
}

/// Call policy for every phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTable {
    pub brand: PhaseConfig,
    pub contact: PhaseConfig,
    pub content: PhaseConfig,
    pub social_proof: PhaseConfig,
    pub images: PhaseConfig,
    pub social_media: PhaseConfig,
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self {
            brand: PhaseConfig::vision(),
            contact: PhaseConfig::text(),
            content: PhaseConfig::text(),
            social_proof: PhaseConfig::text(),
            images: PhaseConfig::text(),
            social_media: PhaseConfig::text(),
        }
    }
}

impl PhaseTable {
    pub fn get(&self, phase: Phase) -> &PhaseConfig {
        match phase {
            Phase::Brand => &self.brand,
            Phase::Contact => &self.contact,
            Phase::Content => &self.content,
            Phase::SocialProof => &self.social_proof,
            Phase::Images => &self.images,
            Phase::SocialMedia => &self.social_media,
        }
    }

    pub fn get_mut(&mut self, phase: Phase) -> &mut PhaseConfig {
        match phase {
            Phase::Brand => &mut self.brand,
            Phase::Contact => &mut self.contact,
            Phase::Content => &mut self.content,
            Phase::SocialProof => &mut self.social_proof,
            Phase::Images => &mut self.images,
            Phase::SocialMedia => &mut self.social_media,
        }
    }

    /// Apply `f` to every phase.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut PhaseConfig)) {
        for phase in Phase::ALL {
            f(self.get_mut(phase));
        }
    }

    /// Sum of worst-case single-attempt timeouts across all phases.
    pub fn total_timeout(&self) -> Duration {
        Phase::ALL.iter().map(|p| self.get(*p).timeout()).sum()
    }
}

/// Minimum self-reported confidence per data category.
///
/// The category gates decide whether an inference result is accepted at
/// all. `prefer_inference` is the separate, higher bar an accepted result
/// must clear to win over fallback data for the same category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub brand_colors: f32,
    pub contact_info: f32,
    pub content: f32,
    pub images: f32,
    pub social_links: f32,
    pub prefer_inference: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            brand_colors: 0.3,
            contact_info: 0.3,
            content: 0.3,
            images: 0.3,
            social_links: 0.3,
            prefer_inference: 0.5,
        }
    }
}

impl ConfidenceThresholds {
    /// The acceptance gate for a phase's data category.
    pub fn gate_for(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Brand => self.brand_colors,
            Phase::Contact => self.contact_info,
            Phase::Content | Phase::SocialProof => self.content,
            Phase::Images => self.images,
            Phase::SocialMedia => self.social_links,
        }
    }

    fn all(&self) -> [(&'static str, f32); 6] {
        [
            ("brand_colors", self.brand_colors),
            ("contact_info", self.contact_info),
            ("content", self.content),
            ("images", self.images),
            ("social_links", self.social_links),
            ("prefer_inference", self.prefer_inference),
        ]
    }
}

/// Size caps for HTML reduction and text output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessLimits {
    pub visual_max_bytes: usize,
    pub text_max_bytes: usize,
    pub image_max_bytes: usize,

    /// A main-content candidate must have at least this much text to beat `<body>`
    pub main_content_min_chars: usize,

    /// Non-homepage text shorter than this is dropped from `page_contents`
    pub page_text_min_chars: usize,

    /// Per-page preview length inside the content summary
    pub preview_chars: usize,

    /// Cap on the whole content summary
    pub summary_max_chars: usize,
}

impl Default for PreprocessLimits {
    fn default() -> Self {
        Self {
            visual_max_bytes: 50_000,
            text_max_bytes: 30_000,
            image_max_bytes: 40_000,
            main_content_min_chars: 100,
            page_text_min_chars: 50,
            preview_chars: 500,
            summary_max_chars: 6_000,
        }
    }
}

impl PreprocessLimits {
    pub fn max_bytes(&self, mode: ReduceMode) -> usize {
        match mode {
            ReduceMode::Visual => self.visual_max_bytes,
            ReduceMode::Text | ReduceMode::PageText => self.text_max_bytes,
            ReduceMode::Image => self.image_max_bytes,
        }
    }
}

/// Token prices for one model, in USD per 1k tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub model: String,
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Soft targets and hard ceilings for a run. Observability only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetTargets {
    pub target_cost_usd: f64,
    pub max_cost_usd: f64,
    pub target_duration_ms: u64,
    pub max_duration_ms: u64,
    #[serde(default)]
    pub pricing: Vec<ModelPricing>,
}

impl Default for BudgetTargets {
    fn default() -> Self {
        Self {
            target_cost_usd: 0.02,
            max_cost_usd: 0.10,
            target_duration_ms: 30_000,
            max_duration_ms: 90_000,
            pricing: vec![
                ModelPricing {
                    model: VISION_MODEL.to_string(),
                    input_per_1k: 0.0025,
                    output_per_1k: 0.01,
                },
                ModelPricing {
                    model: FAST_MODEL.to_string(),
                    input_per_1k: 0.000_15,
                    output_per_1k: 0.000_6,
                },
            ],
        }
    }
}

impl BudgetTargets {
    /// Estimated USD cost of one call. Unknown models cost nothing.
    pub fn estimate_cost(&self, model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        self.pricing
            .iter()
            .find(|p| p.model == model)
            .map(|p| {
                (prompt_tokens as f64 / 1000.0) * p.input_per_1k
                    + (completion_tokens as f64 / 1000.0) * p.output_per_1k
            })
            .unwrap_or(0.0)
    }

    /// Warnings for a finished run's cost and duration.
    pub fn check(&self, cost_usd: f64, duration_ms: u64) -> Vec<String> {
        let mut warnings = Vec::new();

        if cost_usd > self.max_cost_usd {
            warnings.push(format!(
                "estimated cost ${:.4} exceeded ceiling ${:.4}",
                cost_usd, self.max_cost_usd
            ));
        } else if cost_usd > self.target_cost_usd {
            warnings.push(format!(
                "estimated cost ${:.4} above target ${:.4}",
                cost_usd, self.target_cost_usd
            ));
        }

        if duration_ms > self.max_duration_ms {
            warnings.push(format!(
                "run took {}ms, exceeded ceiling {}ms",
                duration_ms, self.max_duration_ms
            ));
        } else if duration_ms > self.target_duration_ms {
            warnings.push(format!(
                "run took {}ms, above target {}ms",
                duration_ms, self.target_duration_ms
            ));
        }

        warnings
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Use the inference service when one is attached.
    ///
    /// When false every category comes from the algorithmic extractor.
    #[serde(default = "default_true")]
    pub inference_enabled: bool,

    #[serde(default)]
    pub phases: PhaseTable,

    #[serde(default)]
    pub thresholds: ConfidenceThresholds,

    #[serde(default)]
    pub limits: PreprocessLimits,

    #[serde(default)]
    pub budget: BudgetTargets,
}

fn default_true() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            inference_enabled: true,
            phases: PhaseTable::default(),
            thresholds: ConfidenceThresholds::default(),
            limits: PreprocessLimits::default(),
            budget: BudgetTargets::default(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that never calls the inference service.
    pub fn fallback_only() -> Self {
        Self::new().with_inference(false)
    }

    pub fn with_inference(mut self, enabled: bool) -> Self {
        self.inference_enabled = enabled;
        self
    }

    pub fn with_phase(mut self, phase: Phase, config: PhaseConfig) -> Self {
        *self.phases.get_mut(phase) = config;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_limits(mut self, limits: PreprocessLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, value) in self.thresholds.all() {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::Config(format!(
                    "threshold {} must be within 0..=1, got {}",
                    name, value
                )));
            }
        }

        let limits = &self.limits;
        for (name, value) in [
            ("visual_max_bytes", limits.visual_max_bytes),
            ("text_max_bytes", limits.text_max_bytes),
            ("image_max_bytes", limits.image_max_bytes),
            ("summary_max_chars", limits.summary_max_chars),
        ] {
            if value == 0 {
                return Err(AnalysisError::Config(format!("{} must be non-zero", name)));
            }
        }

        for phase in Phase::ALL {
            if self.phases.get(phase).model.trim().is_empty() {
                return Err(AnalysisError::Config(format!("{} has no model", phase)));
            }
        }

        Ok(())
    }
}
