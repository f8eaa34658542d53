//! Filesystem debug capture of crawled pages.
//!
//! [`FsDebugCapture`] writes each run's raw HTML into its own session
//! directory under a root:
//!
//! ```text
//! <root>/<timestamp>-<sha256 prefix>/
//!     manifest.json
//!     00-homepage.html
//!     01-about.html
//! ```
//!
//! Writing happens on a detached task; errors are logged and dropped.
//! Old sessions are evicted by [`enforce_retention`], usually run on a
//! timer through [`spawn_retention_task`].

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CaptureResult;
use crate::traits::observer::{CaptureObserver, CaptureRequest};
use crate::types::page::PageType;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Hex chars of the content hash used in session directory names.
const SESSION_HASH_CHARS: usize = 12;

/// Manifest written beside the captured pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub run_id: Uuid,
    pub base_url: String,
    pub captured_at: DateTime<Utc>,
    pub pages: Vec<CapturedPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedPage {
    pub url: String,
    pub page_type: PageType,
    /// File name inside the session directory
    pub file: String,
    pub bytes: usize,
    pub sha256: String,
}

/// Observer that saves every run's pages under `root`.
#[derive(Debug, Clone)]
pub struct FsDebugCapture {
    root: PathBuf,
}

impl FsDebugCapture {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `capture` now and wait for it. [`observe`](CaptureObserver::observe)
    /// does the same on a detached task.
    pub async fn capture(&self, capture: &CaptureRequest) -> CaptureResult<PathBuf> {
        write_session(&self.root, capture, Utc::now()).await
    }
}

impl CaptureObserver for FsDebugCapture {
    fn observe(&self, capture: CaptureRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(run_id = %capture.run_id, "No tokio runtime, debug capture skipped");
            return;
        };

        let this = self.clone();
        runtime.spawn(async move {
            match this.capture(&capture).await {
                Ok(dir) => debug!(run_id = %capture.run_id, dir = %dir.display(), "Captured pages"),
                Err(e) => warn!(run_id = %capture.run_id, error = %e, "Debug capture failed"),
            }
        });
    }
}

/// Write one capture session and return its directory.
pub async fn write_session(
    root: &Path,
    capture: &CaptureRequest,
    captured_at: DateTime<Utc>,
) -> CaptureResult<PathBuf> {
    let hashes: Vec<String> = capture.pages.iter().map(|p| p.content_hash()).collect();

    let mut hasher = Sha256::new();
    hasher.update(capture.base_url.as_bytes());
    for hash in &hashes {
        hasher.update(hash.as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());

    let dir = root.join(format!(
        "{}-{}",
        captured_at.format("%Y%m%dT%H%M%S%.3fZ"),
        &digest[..SESSION_HASH_CHARS]
    ));
    fs::create_dir_all(&dir).await?;

    let pages: Vec<CapturedPage> = capture
        .pages
        .iter()
        .zip(hashes)
        .enumerate()
        .map(|(i, (page, sha256))| CapturedPage {
            url: page.url.clone(),
            page_type: page.page_type,
            file: format!("{:02}-{}.html", i, page.page_type),
            bytes: page.html.len(),
            sha256,
        })
        .collect();

    let writes = capture
        .pages
        .iter()
        .zip(&pages)
        .map(|(page, entry)| fs::write(dir.join(&entry.file), page.html.as_bytes()));
    for result in join_all(writes).await {
        result?;
    }

    let manifest = SessionManifest {
        run_id: capture.run_id,
        base_url: capture.base_url.clone(),
        captured_at,
        pages,
    };
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?).await?;

    Ok(dir)
}

/// Limits on what the capture root may hold.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub max_total_bytes: u64,
    pub max_sessions: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            max_total_bytes: 500 * 1024 * 1024,
            max_sessions: 100,
        }
    }
}

/// What a retention pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionReport {
    pub removed: usize,
    pub freed_bytes: u64,
    pub kept: usize,
}

struct Session {
    path: PathBuf,
    bytes: u64,
    modified: SystemTime,
}

/// Evict sessions, oldest first, until `policy` holds.
///
/// Expired sessions go first, then the oldest remaining ones while the
/// session count or total size is over its limit. A missing root is
/// treated as empty.
pub async fn enforce_retention(root: &Path, policy: &RetentionPolicy) -> CaptureResult<RetentionReport> {
    let mut sessions = match list_sessions(root).await {
        Ok(sessions) => sessions,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RetentionReport::default()),
        Err(e) => return Err(e.into()),
    };
    // Directory names start with the capture timestamp
    sessions.sort_by(|a, b| a.path.cmp(&b.path));

    let now = SystemTime::now();
    let mut total: u64 = sessions.iter().map(|s| s.bytes).sum();
    let mut report = RetentionReport::default();
    let mut kept = Vec::with_capacity(sessions.len());

    for session in sessions {
        let age = now.duration_since(session.modified).unwrap_or_default();
        if age > policy.max_age {
            remove_session(&session, &mut total, &mut report).await?;
        } else {
            kept.push(session);
        }
    }

    let mut kept = kept.into_iter();
    let mut remaining = kept.len();
    while remaining > 0 && (remaining > policy.max_sessions || total > policy.max_total_bytes) {
        let Some(session) = kept.next() else {
            break;
        };
        remove_session(&session, &mut total, &mut report).await?;
        remaining -= 1;
    }
    report.kept = remaining;

    if report.removed > 0 {
        info!(
            root = %root.display(),
            removed = report.removed,
            freed_bytes = report.freed_bytes,
            kept = report.kept,
            "Debug capture retention pass"
        );
    }

    Ok(report)
}

async fn remove_session(session: &Session, total: &mut u64, report: &mut RetentionReport) -> CaptureResult<()> {
    fs::remove_dir_all(&session.path).await?;
    *total = total.saturating_sub(session.bytes);
    report.removed += 1;
    report.freed_bytes += session.bytes;
    Ok(())
}

async fn list_sessions(root: &Path) -> std::io::Result<Vec<Session>> {
    let mut sessions = Vec::new();
    let mut entries = fs::read_dir(root).await?;

    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        if !meta.is_dir() {
            continue;
        }

        let mut bytes = 0;
        let mut files = fs::read_dir(entry.path()).await?;
        while let Some(file) = files.next_entry().await? {
            let file_meta = file.metadata().await?;
            if file_meta.is_file() {
                bytes += file_meta.len();
            }
        }

        sessions.push(Session {
            path: entry.path(),
            bytes,
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    Ok(sessions)
}

/// Run [`enforce_retention`] every `every` until `shutdown` is cancelled.
pub fn spawn_retention_task(
    root: PathBuf,
    policy: RetentionPolicy,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = enforce_retention(&root, &policy).await {
                        warn!(root = %root.display(), error = %e, "Retention pass failed");
                    }
                }
            }
        }
    })
}
