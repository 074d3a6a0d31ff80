//! Generator and registry configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default destination for the generated tree, relative to the anchor
/// directory.
pub const DEFAULT_DEST_DIR: &str = "./lib/services";

/// Default registry URL when neither the caller nor the environment
/// provides one.
pub const DEFAULT_REGISTRY_URL: &str = "redis://127.0.0.1:6379/";

/// Environment variable consulted by [`RegistryConfig::from_env`].
pub const REGISTRY_URL_ENV: &str = "SVCMIRROR_REGISTRY_URL";

/// Settings for one generator instance.
///
/// Captured once at construction and reused unchanged by every run,
/// including every refresh tick.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Anchor directory a relative `dest_dir` resolves against.
    pub base_dir: PathBuf,

    /// Where the generated tree is written.
    pub dest_dir: PathBuf,

    /// Services to mirror. Empty means every name the registry knows.
    pub services: Vec<String>,

    /// Template tree scaffolded instead of the embedded assets.
    pub template_dir: Option<PathBuf>,

    /// Refresh cadence. `None` generates once.
    pub refresh_every: Option<Duration>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            dest_dir: PathBuf::from(DEFAULT_DEST_DIR),
            services: Vec::new(),
            template_dir: None,
            refresh_every: None,
        }
    }
}

impl GeneratorConfig {
    /// Destination directory with the anchor applied.
    pub fn resolved_dest(&self) -> PathBuf {
        if self.dest_dir.is_absolute() {
            self.dest_dir.clone()
        } else {
            self.base_dir.join(&self.dest_dir)
        }
    }
}

/// Connection settings for the service registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry URL, e.g. `redis://127.0.0.1:6379/`.
    pub url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Default settings with the `SVCMIRROR_REGISTRY_URL` environment
    /// variable layered on top.
    pub fn from_env() -> Self {
        match std::env::var(REGISTRY_URL_ENV) {
            Ok(url) if !url.is_empty() => Self { url },
            _ => Self::default(),
        }
    }
}
