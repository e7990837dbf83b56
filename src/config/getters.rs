//! Getter methods for `ScrapeConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::ScrapeConfig;
use crate::extract::ExtractionProfile;

impl ScrapeConfig {
    #[must_use]
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    #[must_use]
    pub fn resolve_max_wait(&self) -> Duration {
        Duration::from_millis(self.resolve_max_wait_ms)
    }

    #[must_use]
    pub fn per_candidate_wait(&self) -> Duration {
        Duration::from_millis(self.per_candidate_wait_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    #[must_use]
    pub fn action_jitter(&self) -> Duration {
        Duration::from_millis(self.action_jitter_ms)
    }

    #[must_use]
    pub fn keystroke_delay(&self) -> Duration {
        Duration::from_millis(self.keystroke_delay_ms)
    }

    #[must_use]
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    #[must_use]
    pub fn challenge_max_waits(&self) -> u32 {
        self.challenge_max_waits
    }

    #[must_use]
    pub fn challenge_base_delay(&self) -> Duration {
        Duration::from_millis(self.challenge_base_delay_ms)
    }

    #[must_use]
    pub fn results_settle(&self) -> Duration {
        Duration::from_millis(self.results_settle_ms)
    }

    #[must_use]
    pub fn lookup_base_url(&self) -> &str {
        &self.lookup_base_url
    }

    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    #[must_use]
    pub fn capture_on_failure(&self) -> bool {
        self.capture_on_failure
    }

    #[must_use]
    pub fn save_results_html(&self) -> bool {
        self.save_results_html
    }

    #[must_use]
    pub fn plan_path(&self) -> Option<&Path> {
        self.plan_path.as_deref()
    }

    #[must_use]
    pub fn extraction_profile(&self) -> &ExtractionProfile {
        &self.extraction_profile
    }
}
