//! Best-effort observer hook for debug capture.

use std::sync::Arc;

use crate::types::page::DiscoveredPage;

/// Everything a capture observer receives about a finished run.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub run_id: uuid::Uuid,
    pub base_url: String,
    pub pages: Arc<Vec<DiscoveredPage>>,
}

/// Receives the raw pages of each run after the result is assembled.
///
/// `observe` returns nothing and must not block. Any failure stays inside
/// the observer.
pub trait CaptureObserver: Send + Sync {
    fn observe(&self, capture: CaptureRequest);
}

/// Observer that discards every capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCapture;

impl CaptureObserver for NoopCapture {
    fn observe(&self, _capture: CaptureRequest) {}
}
