//! Page manifests: the crawler output the CLI reads.
//!
//! ```json
//! {
//!   "base_url": "https://acme.test",
//!   "pages": [
//!     { "url": "https://acme.test/", "page_type": "homepage", "html_file": "home.html" },
//!     { "url": "https://acme.test/about", "page_type": "about", "html": "<p>...</p>" }
//!   ]
//! }
//! ```
//!
//! `html_file` paths are relative to the manifest.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use site_profile::{DiscoveredPage, PageType};

#[derive(Debug, Deserialize)]
pub struct PageManifest {
    pub base_url: Option<String>,
    pub pages: Vec<ManifestPage>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestPage {
    pub url: String,
    pub page_type: PageType,
    pub html: Option<String>,
    pub html_file: Option<PathBuf>,
}

/// Read a manifest and every page it points at.
///
/// Returns the base URL (manifest value, else the first page's origin)
/// and the pages in manifest order.
pub async fn load(path: &Path) -> Result<(String, Vec<DiscoveredPage>)> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest: PageManifest =
        serde_json::from_str(&raw).with_context(|| format!("Invalid manifest {}", path.display()))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut pages = Vec::with_capacity(manifest.pages.len());
    for entry in manifest.pages {
        let html = match (entry.html, &entry.html_file) {
            (Some(html), _) => html,
            (None, Some(file)) => {
                let file = dir.join(file);
                tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("Failed to read page {}", file.display()))?
            }
            (None, None) => bail!("Page {} has neither html nor html_file", entry.url),
        };
        pages.push(DiscoveredPage::new(entry.url, entry.page_type, html));
    }

    let base_url = match manifest.base_url {
        Some(url) => url,
        None => origin_of(&pages).context("Manifest has no base_url and no pages")?,
    };

    Ok((base_url, pages))
}

fn origin_of(pages: &[DiscoveredPage]) -> Option<String> {
    let first = pages.first()?;
    let scheme_end = first.url.find("://")? + 3;
    let host_end = first.url[scheme_end..]
        .find('/')
        .map_or(first.url.len(), |i| scheme_end + i);
    Some(first.url[..host_end].to_string())
}
