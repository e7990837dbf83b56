//! Waiting out interstitial challenge pages and retrying transient
//! navigation failures.
//!
//! Nothing here tries to solve or evade a challenge. The run only waits, with
//! exponential backoff, for the page to clear on its own.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::pacing::{Cancelled, sleep_or_cancel};
use crate::config::ScrapeConfig;
use crate::session::{FormSession, SessionError};
use crate::utils::constants::NAVIGATION_RETRY_BASE_MS;

const CHALLENGE_MARKERS: &[&str] = &[
    "verify you are human",
    "checking your browser",
    "cf-chl-",
    "<title>just a moment",
    "attention required! | cloudflare",
];

/// Whether the markup looks like an anti-bot interstitial rather than the form
#[must_use]
pub fn looks_like_challenge(html: &str) -> bool {
    let lower = html.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// No challenge was showing
    Clear,
    /// A challenge showed and cleared after `waits` backoff periods
    Cleared { waits: u32 },
    /// Still showing after every wait; the run carries on and lets the
    /// required steps decide
    Persisting { waits: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct ChallengeBackoff {
    max_waits: u32,
    base_delay: Duration,
}

impl ChallengeBackoff {
    #[must_use]
    pub fn new(max_waits: u32, base_delay: Duration) -> Self {
        Self {
            max_waits,
            base_delay,
        }
    }

    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(config.challenge_max_waits(), config.challenge_base_delay())
    }

    /// Delay before re-checking after `attempt` previous waits: `base * 2^attempt`
    /// plus up to a quarter of the base as jitter
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let scaled = base_ms.saturating_mul(2u64.saturating_pow(attempt));
        let jitter_cap = base_ms / 4;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::rng().random_range(0..jitter_cap)
        };
        Duration::from_millis(scaled.saturating_add(jitter))
    }

    pub async fn wait_out<S: FormSession>(
        &self,
        session: &S,
        cancel: &CancellationToken,
    ) -> Result<ChallengeOutcome, Cancelled> {
        let mut waits = 0;
        loop {
            // An unreadable page is treated as clear; the steps will find out
            let showing = match session.content().await {
                Ok(html) => looks_like_challenge(&html),
                Err(e) => {
                    warn!("Could not read page while checking for a challenge: {e}");
                    false
                }
            };

            if !showing {
                if waits > 0 {
                    info!("Challenge page cleared after {waits} wait(s)");
                    return Ok(ChallengeOutcome::Cleared { waits });
                }
                return Ok(ChallengeOutcome::Clear);
            }
            if waits >= self.max_waits {
                warn!("Challenge page still showing after {waits} wait(s)");
                return Ok(ChallengeOutcome::Persisting { waits });
            }

            let delay = self.delay_for(waits);
            warn!("Challenge page detected, waiting {delay:?} before re-checking");
            sleep_or_cancel(delay, cancel).await?;
            waits += 1;
        }
    }
}

/// Classify a session error: retrying helps for timeouts and network blips,
/// not once the browser or page is gone.
#[must_use]
pub fn is_retryable_error(error: &SessionError) -> bool {
    if matches!(error, SessionError::Timeout { .. }) {
        return true;
    }
    if matches!(error, SessionError::Launch(_)) {
        return false;
    }

    let message = error.to_string().to_lowercase();

    if message.contains("browser closed")
        || message.contains("page closed")
        || message.contains("target closed")
        || message.contains("session closed")
        || message.contains("no response from the chromium instance")
        || message.contains("channel")
        || message.contains("websocket")
        || (message.contains("frame") && message.contains("not found"))
    {
        return false;
    }

    message.contains("timeout")
        || message.contains("timed out")
        || message.contains("network")
        || message.contains("net::err")
        || message.contains("connection refused")
        || message.contains("connection reset")
        || message.contains("429")
}

/// Retry `f` with exponential backoff (`2^n * 1s + rand(0..1s)`) while its
/// error is retryable.
///
/// A cancellation during the backoff returns the last error; the caller tells
/// the two apart through its token.
pub async fn retry_with_backoff<F, Fut, T>(
    mut f: F,
    max_retries: u32,
    cancel: &CancellationToken,
) -> Result<T, SessionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    let mut retries = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !is_retryable_error(&e) {
                    warn!("Non-retryable error, failing fast: {e}");
                    return Err(e);
                }
                if retries >= max_retries {
                    warn!("Max retries ({max_retries}) exceeded: {e}");
                    return Err(e);
                }

                let delay = 2u64.pow(retries) * NAVIGATION_RETRY_BASE_MS
                    + rand::rng().random_range(0..NAVIGATION_RETRY_BASE_MS);
                warn!(
                    "Retryable error, attempt {}/{max_retries}, retrying in {delay}ms: {e}",
                    retries + 1
                );
                if sleep_or_cancel(Duration::from_millis(delay), cancel)
                    .await
                    .is_err()
                {
                    return Err(e);
                }
                retries += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn detects_interstitial_markers() {
        assert!(looks_like_challenge(
            "<html><body><h1>Verify you are human</h1></body></html>"
        ));
        assert!(looks_like_challenge(
            "<html><head><title>Just a moment...</title></head></html>"
        ));
        assert!(!looks_like_challenge(
            "<html><body><form id='quote'>Enter your postcode</form></body></html>"
        ));
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let backoff = ChallengeBackoff::new(3, Duration::from_millis(1000));
        let first = backoff.delay_for(0);
        let third = backoff.delay_for(2);

        assert!(first >= Duration::from_millis(1000) && first < Duration::from_millis(1250));
        assert!(third >= Duration::from_millis(4000) && third < Duration::from_millis(4250));
    }

    #[test]
    fn classifies_session_errors() {
        assert!(is_retryable_error(&SessionError::Timeout {
            operation: "navigate",
            after: Duration::from_secs(30),
        }));
        assert!(is_retryable_error(&SessionError::Browser(
            "net::ERR_CONNECTION_RESET".to_string()
        )));
        assert!(!is_retryable_error(&SessionError::Browser(
            "target closed".to_string()
        )));
        assert!(!is_retryable_error(&SessionError::Launch(
            "no chrome".to_string()
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result = retry_with_backoff(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SessionError::Browser("network changed".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            },
            3,
            &cancel,
        )
        .await;

        assert_eq!(result.ok(), Some(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_fail_fast() {
        let attempts = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Result<(), _> = retry_with_backoff(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(SessionError::Browser("page closed".to_string())) }
            },
            3,
            &cancel,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
