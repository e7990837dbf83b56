//! Fallback element resolution over an ordered list of locator strategies.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::ScrapeConfig;
use crate::session::{FormSession, LocatorStrategy};

/// Outcome of resolving one control. Absence is a value, not an error.
#[derive(Debug)]
pub enum Resolution<E> {
    Found {
        element: E,
        strategy_used: LocatorStrategy,
    },
    NotFound,
    Cancelled,
}

impl<E> Resolution<E> {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Tries candidates in priority order, polling each for a visible and
/// interactable match.
///
/// One `max_wait` budget is shared by all candidates of a call. Each candidate
/// polls for at most `per_candidate_wait`, capped by what remains of the
/// budget; once the budget is spent the remaining candidates are skipped. The
/// first candidate is always probed at least once, as is every candidate that
/// starts before the budget runs out.
#[derive(Debug, Clone, Copy)]
pub struct ElementResolver {
    per_candidate_wait: Duration,
    poll_interval: Duration,
}

impl ElementResolver {
    #[must_use]
    pub fn new(per_candidate_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            per_candidate_wait,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(config.per_candidate_wait(), config.poll_interval())
    }

    pub async fn resolve<S: FormSession>(
        &self,
        session: &S,
        candidates: &[LocatorStrategy],
        max_wait: Duration,
        cancel: &CancellationToken,
    ) -> Resolution<S::Element> {
        let deadline = Instant::now() + max_wait;

        for (index, candidate) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                return Resolution::Cancelled;
            }
            let started = Instant::now();
            if index > 0 && started >= deadline {
                debug!(
                    "Resolve budget of {max_wait:?} spent, skipping {} remaining candidate(s)",
                    candidates.len() - index
                );
                break;
            }
            let candidate_deadline = (started + self.per_candidate_wait).min(deadline);

            loop {
                let probed = tokio::select! {
                    () = cancel.cancelled() => return Resolution::Cancelled,
                    probed = probe(session, candidate) => probed,
                };
                if let Some(element) = probed {
                    debug!("Resolved element using {candidate}");
                    return Resolution::Found {
                        element,
                        strategy_used: candidate.clone(),
                    };
                }

                let now = Instant::now();
                if now >= candidate_deadline {
                    trace!("Candidate {candidate} not found within its wait");
                    break;
                }
                let pause = self.poll_interval.min(candidate_deadline - now);
                tokio::select! {
                    () = cancel.cancelled() => return Resolution::Cancelled,
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }

        Resolution::NotFound
    }
}

/// First interactable match for one strategy; transport errors count as absent
async fn probe<S: FormSession>(session: &S, strategy: &LocatorStrategy) -> Option<S::Element> {
    let elements = match session.locate(strategy).await {
        Ok(elements) => elements,
        Err(e) => {
            trace!("Locate with {strategy} failed: {e}");
            return None;
        }
    };
    for element in elements {
        match session.is_interactable(&element).await {
            Ok(true) => return Some(element),
            Ok(false) => {}
            Err(e) => trace!("Interactability probe for {strategy} failed: {e}"),
        }
    }
    None
}
