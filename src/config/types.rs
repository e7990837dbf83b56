//! Core configuration type for scrape runs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::extract::ExtractionProfile;
use crate::utils::{
    DEFAULT_ACTION_DELAY_MS, DEFAULT_ACTION_JITTER_MS, DEFAULT_ACTION_TIMEOUT_SECS,
    DEFAULT_CHALLENGE_BASE_DELAY_MS, DEFAULT_CHALLENGE_MAX_WAITS, DEFAULT_KEYSTROKE_DELAY_MS,
    DEFAULT_LOOKUP_BASE_URL, DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_NAVIGATION_TIMEOUT_SECS,
    DEFAULT_PER_CANDIDATE_WAIT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESOLVE_MAX_WAIT_MS,
    DEFAULT_RESULTS_SETTLE_MS, DEFAULT_RUN_TIMEOUT_SECS, DEFAULT_START_URL,
};

/// Configuration for one or more scrape runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Directory for failure captures and saved result pages.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) artifact_dir: PathBuf,
    pub(crate) start_url: String,
    pub(crate) headless: bool,

    /// Chrome user data directory; a per-process temp dir when unset
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,

    /// Timeout for `page.goto()` and the load wait that follows
    pub(crate) navigation_timeout_secs: u64,

    /// Timeout for every other single CDP call
    pub(crate) action_timeout_secs: u64,

    /// Budget shared by all candidate locators of one control
    pub(crate) resolve_max_wait_ms: u64,
    /// Polling budget per candidate, capped by what is left of the shared budget
    pub(crate) per_candidate_wait_ms: u64,
    pub(crate) poll_interval_ms: u64,

    /// Human-like pacing between actions: `delay + rand(0..jitter)`
    pub(crate) action_delay_ms: u64,
    pub(crate) action_jitter_ms: u64,
    pub(crate) keystroke_delay_ms: u64,

    /// Bound on the whole run; expiry cancels the run
    pub(crate) run_timeout_secs: u64,

    /// Backoff while an interstitial challenge page is showing
    pub(crate) challenge_max_waits: u32,
    pub(crate) challenge_base_delay_ms: u64,

    /// Settle time before the results markup is read
    pub(crate) results_settle_ms: u64,

    pub(crate) lookup_base_url: String,
    pub(crate) lookup_timeout_secs: u64,

    pub(crate) capture_on_failure: bool,
    pub(crate) save_results_html: bool,

    /// JSON step plan template; the built-in plan is used when unset
    pub(crate) plan_path: Option<PathBuf>,

    pub(crate) extraction_profile: ExtractionProfile,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("./artifacts"),
            start_url: DEFAULT_START_URL.to_string(),
            headless: true,
            chrome_data_dir: None,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            resolve_max_wait_ms: DEFAULT_RESOLVE_MAX_WAIT_MS,
            per_candidate_wait_ms: DEFAULT_PER_CANDIDATE_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            action_delay_ms: DEFAULT_ACTION_DELAY_MS,
            action_jitter_ms: DEFAULT_ACTION_JITTER_MS,
            keystroke_delay_ms: DEFAULT_KEYSTROKE_DELAY_MS,
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
            challenge_max_waits: DEFAULT_CHALLENGE_MAX_WAITS,
            challenge_base_delay_ms: DEFAULT_CHALLENGE_BASE_DELAY_MS,
            results_settle_ms: DEFAULT_RESULTS_SETTLE_MS,
            lookup_base_url: DEFAULT_LOOKUP_BASE_URL.to_string(),
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            capture_on_failure: true,
            save_results_html: true,
            plan_path: None,
            extraction_profile: ExtractionProfile::default(),
        }
    }
}

impl ScrapeConfig {
    /// Set Chrome user data directory for browser profile isolation
    ///
    /// Concurrent runs in one process must not share a profile directory;
    /// Chrome refuses to open a profile that another instance holds.
    ///
    /// # Example
    /// ```rust
    /// # use tariffscrape::config::ScrapeConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let run_id = "run-42";
    /// let chrome_dir = std::env::temp_dir().join(format!("tariffscrape_chrome_{run_id}"));
    /// let config = ScrapeConfig::builder()
    ///     .artifact_dir("./artifacts")
    ///     .start_url("https://example.com/quote")
    ///     .build()?
    ///     .with_chrome_data_dir(chrome_dir);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_chrome_data_dir(mut self, dir: PathBuf) -> Self {
        self.chrome_data_dir = Some(dir);
        self
    }

    /// Replace the extraction profile used to read result cards
    #[must_use]
    pub fn with_extraction_profile(mut self, profile: ExtractionProfile) -> Self {
        self.extraction_profile = profile;
        self
    }
}
