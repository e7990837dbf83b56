//! Builder methods available for all states

use std::path::PathBuf;

use super::builder::ScrapeConfigBuilder;
use crate::extract::ExtractionProfile;

impl<State> ScrapeConfigBuilder<State> {
    /// Set browser headless mode
    ///
    /// Headed mode is useful when developing a step plan against a live form.
    /// It is only honoured in debug builds; release builds force headless.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.settings.headless = headless;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn action_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.action_timeout_secs = secs;
        self
    }

    /// Budget shared by all candidate locators when resolving one control
    #[must_use]
    pub fn resolve_max_wait_ms(mut self, ms: u64) -> Self {
        self.settings.resolve_max_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn per_candidate_wait_ms(mut self, ms: u64) -> Self {
        self.settings.per_candidate_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.settings.poll_interval_ms = ms;
        self
    }

    /// Pause after each action; the actual pause is `delay + rand(0..jitter)`
    #[must_use]
    pub fn action_delay_ms(mut self, delay: u64, jitter: u64) -> Self {
        self.settings.action_delay_ms = delay;
        self.settings.action_jitter_ms = jitter;
        self
    }

    #[must_use]
    pub fn keystroke_delay_ms(mut self, ms: u64) -> Self {
        self.settings.keystroke_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn run_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.run_timeout_secs = secs;
        self
    }

    /// Backoff shape while a challenge page is showing
    ///
    /// The first wait is `base_delay_ms`, doubling up to `max_waits` times.
    #[must_use]
    pub fn challenge_backoff(mut self, max_waits: u32, base_delay_ms: u64) -> Self {
        self.settings.challenge_max_waits = max_waits;
        self.settings.challenge_base_delay_ms = base_delay_ms;
        self
    }

    #[must_use]
    pub fn results_settle_ms(mut self, ms: u64) -> Self {
        self.settings.results_settle_ms = ms;
        self
    }

    #[must_use]
    pub fn lookup_base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.lookup_base_url = url.into();
        self
    }

    #[must_use]
    pub fn lookup_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.lookup_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn capture_on_failure(mut self, capture: bool) -> Self {
        self.settings.capture_on_failure = capture;
        self
    }

    #[must_use]
    pub fn save_results_html(mut self, save: bool) -> Self {
        self.settings.save_results_html = save;
        self
    }

    /// Load the step plan from a JSON template instead of the built-in plan
    #[must_use]
    pub fn plan_path(mut self, path: Option<PathBuf>) -> Self {
        self.settings.plan_path = path;
        self
    }

    #[must_use]
    pub fn extraction_profile(mut self, profile: ExtractionProfile) -> Self {
        self.settings.extraction_profile = profile;
        self
    }
}
