//! Existence checks for generated image paths

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ImageConfig, ProbeMode};
use crate::{Error, Result};

/// Answers whether an object exists under the image host
///
/// Keys are relative to the image base URL, e.g. `restaurants/monal/1.jpg`.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn exists(&self, key: &str) -> bool;

    /// Short name for logs and diagnostics
    fn name(&self) -> &'static str;
}

/// Probe backed by an exported listing of bucket object keys
#[derive(Debug, Clone, Default)]
pub struct ManifestProbe {
    keys: HashSet<String>,
}

impl ManifestProbe {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|k| k.trim().trim_start_matches('/').to_string())
                .collect(),
        }
    }

    /// Load a JSON array of object keys; a missing manifest is empty
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Image manifest missing, path probing will never hit");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::dataset(path, e))?;
        let keys: Vec<String> = serde_json::from_str(&content).map_err(|e| Error::dataset(path, e))?;
        info!(path = %path.display(), keys = keys.len(), "Loaded image manifest");
        Ok(Self::new(keys))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl ImageProbe for ManifestProbe {
    async fn exists(&self, key: &str) -> bool {
        self.keys.contains(key.trim_start_matches('/'))
    }

    fn name(&self) -> &'static str {
        "manifest"
    }
}

/// Probe that sends HEAD requests to the image host
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProbe {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageProbe for HttpProbe {
    async fn exists(&self, key: &str) -> bool {
        let url = format!("{}/{}", self.base_url, key.trim_start_matches('/'));
        match self.client.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Image probe request failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Probe that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

#[async_trait]
impl ImageProbe for NoProbe {
    async fn exists(&self, _key: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "off"
    }
}

/// Build the probe selected by configuration
pub fn probe_from_config(config: &ImageConfig, data_dir: &Path) -> Result<Box<dyn ImageProbe>> {
    Ok(match config.probe {
        ProbeMode::Manifest => Box::new(ManifestProbe::load(&data_dir.join(&config.manifest_file))?),
        ProbeMode::Http => Box::new(HttpProbe::new(
            &config.base_url,
            Duration::from_millis(config.probe_timeout_ms),
        )?),
        ProbeMode::Off => Box::new(NoProbe),
    })
}
