use anyhow::{bail, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use site_profile::ExtractionConfig;

/// CLI settings loaded from environment variables
#[derive(Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub inference_enabled: bool,
    pub debug_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable lookup. Blank values count as unset.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let inference_enabled = match var("SITE_PROFILE_INFERENCE").as_deref() {
            None => true,
            Some(v) => parse_switch(v)?,
        };

        Ok(Self {
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL"),
            inference_enabled,
            debug_dir: var("SITE_PROFILE_DEBUG_DIR").map(PathBuf::from),
        })
    }

    /// Extraction config for this environment.
    ///
    /// Inference stays off without an API key.
    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig::new().with_inference(self.inference_enabled && self.openai_api_key.is_some())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("openai_base_url", &self.openai_base_url)
            .field("inference_enabled", &self.inference_enabled)
            .field("debug_dir", &self.debug_dir)
            .finish()
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => bail!("SITE_PROFILE_INFERENCE must be on or off, got {:?}", other),
    }
}
