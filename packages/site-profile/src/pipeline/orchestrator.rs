//! The analyzer - main entry point for a site profile run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::merge::{merge, Candidate, Merged};
use super::pages::{page_contents, recommended_pages};
use super::summary::content_summary;
use crate::error::{AnalysisError, Result};
use crate::fallback::HeuristicExtractor;
use crate::phases::{
    self, BrandPhase, ContactPhase, ContentPhase, ImagesPhase, PhaseSpec, SocialMediaPhase,
    SocialProofPhase,
};
use crate::preprocess::{reduce, ReduceMode};
use crate::traits::{
    fallback::FallbackExtractor,
    inference::{InferenceService, TokenUsage},
    observer::{CaptureObserver, CaptureRequest, NoopCapture},
};
use crate::types::{
    config::ExtractionConfig,
    page::{DiscoveredPage, PageType},
    profile::ExtractedBusinessInfo,
    result::{AnalysisOutcome, AnalyzedWebsite, ExtractionMetadata, PhaseReport},
};

/// Turns a crawled page set into an [`AnalyzedWebsite`].
///
/// # Example
///
/// ```rust,ignore
/// let analyzer = Analyzer::new(ExtractionConfig::default())
///     .with_inference(Arc::new(OpenAiGateway::new(api_key)));
///
/// let outcome = analyzer.analyze(pages, "https://acme.test").await?;
/// println!("{:?}", outcome.website.business_info.site_title);
/// ```
pub struct Analyzer {
    inference: Option<Arc<dyn InferenceService>>,
    fallback: Arc<dyn FallbackExtractor>,
    observer: Arc<dyn CaptureObserver>,
    config: ExtractionConfig,
}

/// One settled phase, payload already converted to profile fields.
struct PhaseOutcome {
    candidate: Candidate,
    report: PhaseReport,
    usage: TokenUsage,
}

/// Homepage HTML reduced once per mode.
struct ReducedPage {
    visual: String,
    text: String,
    page_text: String,
    image: String,
}

impl ReducedPage {
    fn new(html: &str, config: &ExtractionConfig) -> Self {
        Self {
            visual: reduce(html, ReduceMode::Visual, &config.limits),
            text: reduce(html, ReduceMode::Text, &config.limits),
            page_text: reduce(html, ReduceMode::PageText, &config.limits),
            image: reduce(html, ReduceMode::Image, &config.limits),
        }
    }

    fn get(&self, mode: ReduceMode) -> &str {
        match mode {
            ReduceMode::Visual => &self.visual,
            ReduceMode::Text => &self.text,
            ReduceMode::PageText => &self.page_text,
            ReduceMode::Image => &self.image,
        }
    }
}

impl Analyzer {
    /// Analyzer with the heuristic fallback and no inference service.
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            inference: None,
            fallback: Arc::new(HeuristicExtractor::new()),
            observer: Arc::new(NoopCapture),
            config,
        }
    }

    pub fn with_inference(mut self, service: Arc<dyn InferenceService>) -> Self {
        self.inference = Some(service);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackExtractor>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn CaptureObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Whether this run will call the inference service.
    pub fn inference_active(&self) -> bool {
        self.config.inference_enabled && self.inference.is_some()
    }

    /// Analyze one crawled site.
    ///
    /// Fails only when no homepage is present or the config is invalid.
    /// Every other failure is recorded in the returned metadata.
    pub async fn analyze(&self, pages: Vec<DiscoveredPage>, base_url: &str) -> Result<AnalysisOutcome> {
        let homepage = pages
            .iter()
            .find(|p| p.page_type == PageType::Homepage)
            .ok_or(AnalysisError::MissingHomepage {
                page_count: pages.len(),
            })?;
        self.config.validate()?;

        let run_id = Uuid::now_v7();
        let span = info_span!("analyze", run_id = %run_id, base_url = %base_url);

        let outcome = self
            .run(run_id, homepage, &pages, base_url)
            .instrument(span)
            .await;

        self.notify_observer(CaptureRequest {
            run_id,
            base_url: base_url.to_string(),
            pages: Arc::new(pages),
        });

        Ok(outcome)
    }

    /// Hand the finished run to the observer. A panicking observer is
    /// logged and otherwise ignored.
    fn notify_observer(&self, capture: CaptureRequest) {
        let run_id = capture.run_id;
        let result = catch_unwind(AssertUnwindSafe(|| self.observer.observe(capture)));

        if let Err(panic_info) = result {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!(run_id = %run_id, panic = %panic_msg, "capture observer panicked");
        }
    }

    async fn run(
        &self,
        run_id: Uuid,
        homepage: &DiscoveredPage,
        pages: &[DiscoveredPage],
        base_url: &str,
    ) -> AnalysisOutcome {
        let start = Instant::now();
        let config = &self.config;
        let mut metadata = ExtractionMetadata::new(run_id);

        info!(
            pages = pages.len(),
            inference = self.inference_active(),
            "Starting site analysis"
        );

        let fallback_info = self.fallback.extract_business_info(&homepage.html, base_url);

        let (outcomes, merged) = match self.inference.as_deref().filter(|_| config.inference_enabled) {
            Some(service) => {
                let outcomes = self.run_phases(service, homepage, base_url).await;
                let candidates = outcomes.iter().map(|o| o.candidate.clone()).collect();
                let merged = merge(candidates, fallback_info, config.thresholds.prefer_inference);
                (outcomes, merged)
            }
            None => {
                if config.inference_enabled {
                    let warning = "inference enabled but no service attached, using fallback only";
                    warn!("{}", warning);
                    metadata.warnings.push(warning.to_string());
                }
                let merged = merge(Vec::new(), fallback_info, config.thresholds.prefer_inference);
                (Vec::new(), merged)
            }
        };

        let used_fallback = outcomes.is_empty() || merged.used_fallback();
        let Merged {
            info,
            provenance,
            substituted,
            warnings,
        } = merged;

        let mut cost = 0.0;
        for outcome in outcomes {
            let mut report = outcome.report;
            report.used_fallback = substituted.contains(&report.phase);
            metadata.mark_complete(report.phase, report.succeeded && !report.used_fallback);
            let label = report.phase.label();
            metadata
                .errors
                .extend(report.errors.iter().map(|e| format!("{}: {}", label, e)));
            metadata
                .warnings
                .extend(report.warnings.iter().map(|w| format!("{}: {}", label, w)));
            cost += config.budget.estimate_cost(
                &config.phases.get(report.phase).model,
                outcome.usage.prompt_tokens,
                outcome.usage.completion_tokens,
            );
            metadata.phases.push(report);
        }
        metadata.warnings.extend(warnings);

        let page_contents = page_contents(pages, &config.limits);
        let recommended_pages = recommended_pages(pages);
        let content_summary = content_summary(&info, &page_contents, &config.limits);

        metadata.duration_ms = start.elapsed().as_millis() as u64;
        metadata.estimated_cost_usd = cost;
        for warning in config.budget.check(cost, metadata.duration_ms) {
            warn!("{}", warning);
            metadata.warnings.push(warning);
        }
        metadata.provenance = provenance;
        metadata.used_fallback = used_fallback;
        metadata.success = true;

        info!(
            duration_ms = metadata.duration_ms,
            used_fallback = used_fallback,
            fields = info.present_fields().len(),
            errors = metadata.errors.len(),
            warnings = metadata.warnings.len(),
            estimated_cost_usd = cost,
            "Site analysis complete"
        );

        AnalysisOutcome {
            website: AnalyzedWebsite {
                base_url: base_url.to_string(),
                business_info: info,
                page_contents,
                recommended_pages,
                content_summary,
            },
            metadata,
        }
    }

    /// Run all six phases concurrently and wait for every one to settle.
    async fn run_phases(
        &self,
        service: &dyn InferenceService,
        homepage: &DiscoveredPage,
        base_url: &str,
    ) -> Vec<PhaseOutcome> {
        let reduced = ReducedPage::new(&homepage.html, &self.config);
        let page_url = homepage.url.as_str();
        let config = &self.config;

        let (brand, contact, content, social_proof, images, social_media) = tokio::join!(
            run_phase::<BrandPhase>(service, &reduced, page_url, base_url, config),
            run_phase::<ContactPhase>(service, &reduced, page_url, base_url, config),
            run_phase::<ContentPhase>(service, &reduced, page_url, base_url, config),
            run_phase::<SocialProofPhase>(service, &reduced, page_url, base_url, config),
            run_phase::<ImagesPhase>(service, &reduced, page_url, base_url, config),
            run_phase::<SocialMediaPhase>(service, &reduced, page_url, base_url, config),
        );

        vec![brand, contact, content, social_proof, images, social_media]
    }
}

async fn run_phase<P: PhaseSpec>(
    service: &dyn InferenceService,
    reduced: &ReducedPage,
    page_url: &str,
    base_url: &str,
    config: &ExtractionConfig,
) -> PhaseOutcome {
    let result = phases::extract::<P>(service, reduced.get(P::MODE), page_url, config).await;
    let usage = phases::usage_of(&result);
    let report = result.report(P::PHASE);

    let fragment = if result.succeeded {
        P::into_fragment(result.data, base_url)
    } else {
        ExtractedBusinessInfo::default()
    };

    PhaseOutcome {
        candidate: Candidate {
            phase: P::PHASE,
            fragment,
            confidence: result.confidence,
            accepted: report.succeeded,
        },
        report,
        usage,
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("inference", &self.inference.as_ref().map(|s| s.name().to_string()))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockInference, StaticFallback};
    use crate::types::page::RecommendedPage;
    use crate::types::phase::{FieldSource, Phase};
    use crate::types::profile::ProfileField;
    use serde_json::json;

    const HOME: &str = r#"<html><head><title>Acme Flowers</title>
        <style>.a{color:#112233}.b{color:#112233}.c{color:#445566}</style></head>
        <body><h1>Flowers for every day</h1>
        <footer>Write to hello@acme.test</footer></body></html>"#;

    fn pages() -> Vec<DiscoveredPage> {
        vec![DiscoveredPage::homepage("https://acme.test/", HOME)]
    }

    #[tokio::test]
    async fn test_missing_homepage_is_fatal() {
        let analyzer = Analyzer::new(ExtractionConfig::fallback_only());
        let pages = vec![DiscoveredPage::new(
            "https://acme.test/about",
            PageType::About,
            "<p>About</p>",
        )];

        let err = analyzer.analyze(pages, "https://acme.test").await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingHomepage { page_count: 1 }));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = ExtractionConfig::fallback_only();
        config.thresholds.prefer_inference = 1.5;
        let err = Analyzer::new(config)
            .analyze(pages(), "https://acme.test")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[tokio::test]
    async fn test_fallback_only_run() {
        let mock = MockInference::new();
        let analyzer = Analyzer::new(ExtractionConfig::fallback_only()).with_inference(Arc::new(mock.clone()));

        let outcome = analyzer.analyze(pages(), "https://acme.test").await.unwrap();
        let info = &outcome.website.business_info;

        assert_eq!(info.site_title.as_deref(), Some("Acme Flowers"));
        assert_eq!(info.emails(), ["hello@acme.test".to_string()]);
        assert_eq!(
            outcome.website.recommended_pages,
            vec![RecommendedPage::Home, RecommendedPage::About, RecommendedPage::Contact]
        );
        assert!(outcome.metadata.success);
        assert!(outcome.metadata.used_fallback);
        assert!(outcome.metadata.phases.is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_enabled_without_service_warns() {
        let outcome = Analyzer::new(ExtractionConfig::default())
            .analyze(pages(), "https://acme.test")
            .await
            .unwrap();
        assert!(outcome.metadata.warnings[0].contains("no service attached"));
        assert!(outcome.metadata.used_fallback);
    }

    #[tokio::test]
    async fn test_rejected_brand_falls_back() {
        let mock = MockInference::new().with_response(
            Phase::Brand,
            json!({"brand_colors": ["#000000"], "fonts": [], "typography": null,
                   "design_tokens": null, "logo_url": null, "confidence": 0.1}),
        );
        let analyzer = Analyzer::new(ExtractionConfig::default()).with_inference(Arc::new(mock.clone()));

        let outcome = analyzer.analyze(pages(), "https://acme.test").await.unwrap();
        let meta = &outcome.metadata;

        assert_eq!(
            outcome.website.business_info.brand_colors,
            Some(vec!["#112233".to_string(), "#445566".to_string()])
        );
        assert_eq!(meta.provenance[&ProfileField::BrandColors], FieldSource::Fallback);
        assert!(!meta.phase1_complete);
        assert_eq!(meta.phases.len(), 6);
        assert!(meta.phases[0].used_fallback);
        assert!(meta.warnings.iter().any(|w| w.starts_with("phase1:") && w.contains("below gate")));
        assert_eq!(mock.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_gate_rejections_are_warnings_and_call_failures_are_errors() {
        let mock = MockInference::new()
            .with_response(
                Phase::Brand,
                json!({"brand_colors": ["#000000"], "fonts": [], "typography": null,
                       "design_tokens": null, "logo_url": null, "confidence": 0.1}),
            )
            .with_error(
                Phase::Contact,
                crate::error::InferenceError::Api {
                    status: 400,
                    message: "bad request".into(),
                },
            );
        let analyzer = Analyzer::new(ExtractionConfig::default()).with_inference(Arc::new(mock));

        let outcome = analyzer.analyze(pages(), "https://acme.test").await.unwrap();
        let meta = &outcome.metadata;

        assert!(meta.warnings.iter().any(|w| w.starts_with("phase1:") && w.contains("below gate")));
        assert!(!meta.errors.iter().any(|e| e.starts_with("phase1:")));
        assert!(meta.errors.iter().any(|e| e.starts_with("phase2a:") && e.contains("400")));
        assert!(!meta.warnings.iter().any(|w| w.starts_with("phase2a:")));
    }

    #[tokio::test]
    async fn test_confident_contact_wins() {
        let mock = MockInference::new().with_response(
            Phase::Contact,
            json!({"emails": ["orders@acme.test"], "phones": [], "addresses": [], "hours": [],
                   "social_links": [], "coordinates": null, "confidence": 0.9}),
        );
        let analyzer = Analyzer::new(ExtractionConfig::default())
            .with_inference(Arc::new(mock))
            .with_fallback(Arc::new(StaticFallback::new(ExtractedBusinessInfo::default())));

        let outcome = analyzer.analyze(pages(), "https://acme.test").await.unwrap();
        let meta = &outcome.metadata;

        assert_eq!(
            outcome.website.business_info.emails(),
            ["orders@acme.test".to_string()]
        );
        assert!(meta.phase2a_complete);
        assert_eq!(
            meta.provenance[&ProfileField::ContactInfo],
            FieldSource::Inference(Phase::Contact)
        );
        assert!(meta.estimated_cost_usd > 0.0);
    }

    #[derive(Default)]
    struct RecordingObserver {
        seen: std::sync::Mutex<Vec<CaptureRequest>>,
    }

    impl CaptureObserver for RecordingObserver {
        fn observe(&self, capture: CaptureRequest) {
            self.seen.lock().unwrap().push(capture);
        }
    }

    #[tokio::test]
    async fn test_observer_sees_completed_run() {
        let observer = Arc::new(RecordingObserver::default());
        let analyzer =
            Analyzer::new(ExtractionConfig::fallback_only()).with_observer(observer.clone());

        let outcome = analyzer.analyze(pages(), "https://acme.test").await.unwrap();

        let seen = observer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].run_id, outcome.metadata.run_id);
        assert_eq!(seen[0].base_url, "https://acme.test");
        assert_eq!(seen[0].pages.len(), 1);
    }

    struct PanickingObserver;

    impl CaptureObserver for PanickingObserver {
        fn observe(&self, _capture: CaptureRequest) {
            panic!("disk full");
        }
    }

    #[tokio::test]
    async fn test_panicking_observer_does_not_fail_run() {
        let analyzer =
            Analyzer::new(ExtractionConfig::fallback_only()).with_observer(Arc::new(PanickingObserver));

        let outcome = analyzer.analyze(pages(), "https://acme.test").await.unwrap();

        assert!(outcome.metadata.success);
        assert_eq!(
            outcome.website.business_info.site_title.as_deref(),
            Some("Acme Flowers")
        );
    }
}
