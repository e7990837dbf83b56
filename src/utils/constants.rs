//! Shared defaults for the scraping engine
//!
//! Default values used by the config builder and the engine so timing and
//! naming stay consistent across modules.

/// Landing page of the comparison form
pub const DEFAULT_START_URL: &str = "https://www.moneysupermarket.com/gas-and-electricity/";

/// Base URL of the postcode lookup service (postcodes.io JSON shape)
pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://api.postcodes.io/";

/// Overall budget for resolving one control, shared by all candidate locators
pub const DEFAULT_RESOLVE_MAX_WAIT_MS: u64 = 20_000;

/// Polling budget for a single candidate locator before moving to the next
pub const DEFAULT_PER_CANDIDATE_WAIT_MS: u64 = 3_000;

/// Interval between presence/visibility probes
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Pause after each action, before jitter
pub const DEFAULT_ACTION_DELAY_MS: u64 = 1_000;

/// Upper bound (exclusive) of the random jitter added to each action delay
pub const DEFAULT_ACTION_JITTER_MS: u64 = 400;

/// Pause between typed characters
pub const DEFAULT_KEYSTROKE_DELAY_MS: u64 = 100;

/// Bound on the whole run, from session open to extraction
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Timeout for `page.goto()` and the following load wait
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Timeout for any single CDP call (click, type, screenshot, ...)
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 10;

/// Timeout for the postcode lookup HTTP request
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Number of backoff waits while a challenge page is showing
pub const DEFAULT_CHALLENGE_MAX_WAITS: u32 = 3;

/// First backoff wait while a challenge page is showing; doubles each time
pub const DEFAULT_CHALLENGE_BASE_DELAY_MS: u64 = 5_000;

/// Settle time after the final step before the results markup is read
pub const DEFAULT_RESULTS_SETTLE_MS: u64 = 5_000;

/// Browser window size used for screenshots
pub const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// Retries for a start-page navigation that failed with a transient error
pub const NAVIGATION_MAX_RETRIES: u32 = 2;

/// Base of the navigation retry backoff: `2^n * base + rand(0..base)`
pub const NAVIGATION_RETRY_BASE_MS: u64 = 1_000;
