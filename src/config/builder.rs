//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! The artifact directory and the start URL must be set, in that order,
//! before `build()` becomes available.

use anyhow::{Context, Result, anyhow, bail};
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::ScrapeConfig;

// Type states for the builder
pub struct WithArtifactDir;
pub struct WithStartUrl;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) artifact_dir: Option<PathBuf>,
    pub(crate) start_url: Option<String>,
    /// Every optional setting, starting from `ScrapeConfig::default()`
    pub(crate) settings: ScrapeConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            start_url: None,
            settings: ScrapeConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl<State> ScrapeConfigBuilder<State> {
    fn into_state<Next>(self) -> ScrapeConfigBuilder<Next> {
        ScrapeConfigBuilder {
            artifact_dir: self.artifact_dir,
            start_url: self.start_url,
            settings: self.settings,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> ScrapeConfigBuilder<WithArtifactDir> {
        self.artifact_dir = Some(dir.into());
        self.into_state()
    }
}

impl ScrapeConfigBuilder<WithArtifactDir> {
    pub fn start_url(mut self, url: impl Into<String>) -> ScrapeConfigBuilder<WithStartUrl> {
        let url_string = url.into();

        // Normalize URL: add https:// if no scheme is present
        let normalized_url =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("https://{url_string}")
            };

        self.start_url = Some(normalized_url);
        self.into_state()
    }
}

impl ScrapeConfigBuilder<WithStartUrl> {
    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the start URL or lookup URL do not parse, if the
    /// artifact directory cannot be made absolute, or if a timing value is
    /// zero where a positive value is required.
    pub fn build(self) -> Result<ScrapeConfig> {
        let start_url = self
            .start_url
            .ok_or_else(|| anyhow!("start_url is required"))?;
        Url::parse(&start_url).with_context(|| format!("Invalid start URL '{start_url}'"))?;

        let artifact_dir = self
            .artifact_dir
            .ok_or_else(|| anyhow!("artifact_dir is required"))?;
        let artifact_dir = std::path::absolute(&artifact_dir).with_context(|| {
            format!(
                "Failed to resolve artifact directory '{}'",
                artifact_dir.display()
            )
        })?;

        let mut settings = self.settings;
        Url::parse(&settings.lookup_base_url)
            .with_context(|| format!("Invalid lookup base URL '{}'", settings.lookup_base_url))?;

        if settings.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if settings.run_timeout_secs == 0 {
            bail!("run_timeout_secs must be greater than zero");
        }
        if settings.per_candidate_wait_ms > settings.resolve_max_wait_ms {
            tracing::debug!(
                "per_candidate_wait_ms ({}) exceeds resolve_max_wait_ms ({}), clamping",
                settings.per_candidate_wait_ms,
                settings.resolve_max_wait_ms
            );
            settings.per_candidate_wait_ms = settings.resolve_max_wait_ms;
        }

        Ok(ScrapeConfig {
            artifact_dir,
            start_url,
            ..settings
        })
    }
}
