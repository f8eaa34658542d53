//! Website Content Extraction Pipeline
//!
//! Turns the raw HTML of a crawled business website into a structured
//! business profile (brand identity, contact details, marketing copy,
//! social proof, imagery, social links) plus page-scoped context for a
//! downstream site generator.
//!
//! # How a run works
//!
//! - Six inference phases run concurrently against the homepage, each on a
//!   differently reduced, size-bounded view of the HTML
//! - Each phase result passes a confidence and minimum-data gate
//! - A deterministic DOM-heuristic extractor covers any category whose
//!   inference result was rejected, failed, or never requested
//! - The merged profile carries per-field provenance in the run metadata
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use site_profile::{Analyzer, DiscoveredPage, ExtractionConfig, OpenAiGateway};
//!
//! let analyzer = Analyzer::new(ExtractionConfig::default())
//!     .with_inference(Arc::new(OpenAiGateway::new(api_key)));
//!
//! let pages = vec![DiscoveredPage::homepage("https://acme.test/", html)];
//! let outcome = analyzer.analyze(pages, "https://acme.test").await?;
//!
//! println!("{:?}", outcome.website.business_info.brand_colors);
//! println!("{:?}", outcome.metadata.provenance);
//! ```
//!
//! # Modules
//!
//! - [`types`] - Pages, profile, phase results and configuration
//! - [`traits`] - Inference, fallback and capture seams
//! - [`preprocess`] - HTML reduction per phase
//! - [`phases`] - The six single-phase extractors and their runner
//! - [`fallback`] - DOM-heuristic extractor
//! - [`pipeline`] - Orchestration, merge, page context and summary
//! - [`inference`] - OpenAI-compatible gateway and strict schemas
//! - [`capture`] - Filesystem debug capture with retention
//! - [`testing`] - Mock implementations for testing

pub mod capture;
pub mod error;
pub mod fallback;
pub mod inference;
pub mod links;
pub mod phases;
pub mod pipeline;
pub mod preprocess;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{AnalysisError, CaptureError, InferenceError, Result};
pub use traits::{
    fallback::FallbackExtractor,
    inference::{InferenceRequest, InferenceResponse, InferenceService, TokenUsage},
    observer::{CaptureObserver, CaptureRequest, NoopCapture},
};
pub use types::{
    config::{
        BudgetTargets, ConfidenceThresholds, ExtractionConfig, ModelPricing, PhaseConfig,
        PhaseTable, PreprocessLimits,
    },
    page::{DiscoveredPage, PageType, RecommendedPage},
    phase::{FieldSource, Phase},
    profile::{
        ContactInfo, Coordinates, DesignTokens, ExtractedBusinessInfo, ExtractedImage, FaqItem,
        FooterContent, Gallery, HeroSection, ProfileField, Service, SocialLink,
        StructuredContent, Testimonial, Typography,
    },
    result::{AnalysisOutcome, AnalyzedWebsite, ExtractionMetadata, PhaseReport, PhaseResult},
};

pub use capture::{enforce_retention, spawn_retention_task, FsDebugCapture, RetentionPolicy};
pub use fallback::HeuristicExtractor;
pub use inference::OpenAiGateway;
pub use pipeline::Analyzer;
pub use preprocess::ReduceMode;
