//! Human-paced waits, all of them cancellable.

use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::ScrapeConfig;

/// Returned when a wait was cut short by the run's cancellation token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Sleep for `duration` unless `cancel` fires first
pub async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        () = cancel.cancelled() => Err(Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Delays between actions and between keystrokes
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    action_delay: Duration,
    action_jitter: Duration,
    keystroke_delay: Duration,
}

impl Pacing {
    #[must_use]
    pub fn new(action_delay: Duration, action_jitter: Duration, keystroke_delay: Duration) -> Self {
        Self {
            action_delay,
            action_jitter,
            keystroke_delay,
        }
    }

    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(
            config.action_delay(),
            config.action_jitter(),
            config.keystroke_delay(),
        )
    }

    /// No pauses at all
    #[must_use]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    /// `action_delay` plus uniform jitter in `[0, action_jitter)`
    #[must_use]
    pub fn action_pause(&self) -> Duration {
        let jitter_ms = u64::try_from(self.action_jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..jitter_ms)
        };
        self.action_delay + Duration::from_millis(extra)
    }

    pub async fn after_action(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        sleep_or_cancel(self.action_pause(), cancel).await
    }

    pub async fn between_keystrokes(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        sleep_or_cancel(self.keystroke_delay, cancel).await
    }
}
