//! The run surface: one request in, a report or a terminal error out.
//!
//! A run looks the postcode up before the browser opens, drives the step plan,
//! reads the results page and extracts records. The session is closed on every
//! exit path, and the configured run timeout cancels a child token that every
//! wait in the engine observes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::engine::pacing::sleep_or_cancel;
use crate::engine::{
    ChallengeBackoff, ChallengeOutcome, FailureCapture, NavigationSequencer, StepExecutor,
    StepResult, StepSpec, comparison_plan, load_plan, retry_with_backoff,
};
use crate::error::{ErrorKind, ScrapeError};
use crate::extract::{ExtractError, ResultExtractor};
use crate::location::{LocationEnricher, LocationRecord};
use crate::session::{ChromiumSession, FormSession};
use crate::store::{PersistReport, SaveContext, TariffSink, persist_all};
use crate::tariff::{EvStatus, FuelType, PaymentMethod, TariffRecord};
use crate::utils::NAVIGATION_MAX_RETRIES;

/// What to ask the comparison form for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub postcode: String,
    /// Zero-based option index in the address dropdown
    pub address_index: usize,
    pub fuel_type: FuelType,
    pub current_supplier: Option<String>,
    pub payment_method: PaymentMethod,
    pub ev_status: EvStatus,
    pub email: Option<String>,
}

impl ScrapeRequest {
    pub fn new(postcode: impl Into<String>) -> Self {
        Self {
            postcode: postcode.into(),
            address_index: 0,
            fuel_type: FuelType::default(),
            current_supplier: None,
            payment_method: PaymentMethod::default(),
            ev_status: EvStatus::default(),
            email: None,
        }
    }

    /// Build from loosely typed input; unrecognised answers fall back to the
    /// defaults (`Dual`, monthly direct debit, no EV)
    #[must_use]
    pub fn from_raw(postcode: &str, fuel: &str, payment: &str, ev: &str) -> Self {
        Self::new(postcode.trim())
            .with_fuel_type(FuelType::canonicalize(fuel))
            .with_payment_method(PaymentMethod::canonicalize(payment))
            .with_ev_status(EvStatus::canonicalize(ev))
    }

    #[must_use]
    pub fn with_address_index(mut self, index: usize) -> Self {
        self.address_index = index;
        self
    }

    #[must_use]
    pub fn with_fuel_type(mut self, fuel_type: FuelType) -> Self {
        self.fuel_type = fuel_type;
        self
    }

    #[must_use]
    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        let supplier = supplier.into();
        self.current_supplier = (!supplier.trim().is_empty()).then_some(supplier);
        self
    }

    #[must_use]
    pub fn with_payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    #[must_use]
    pub fn with_ev_status(mut self, ev_status: EvStatus) -> Self {
        self.ev_status = ev_status;
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.email = (!email.trim().is_empty()).then_some(email);
        self
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub records: Vec<TariffRecord>,
    pub location: Arc<LocationRecord>,
    pub step_results: Vec<StepResult>,
    /// Saved results page, when enabled
    pub artifacts: Vec<PathBuf>,
    pub elapsed_ms: u64,
}

/// Handle to a run spawned on its own task
pub struct ScrapeTask {
    handle: JoinHandle<Result<ScrapeReport, ScrapeError>>,
    cancel: CancellationToken,
}

impl ScrapeTask {
    /// Cancel the run; it still closes its session and reports `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn join(self) -> Result<ScrapeReport, ScrapeError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ScrapeError::Task(e.to_string())),
        }
    }
}

pub struct TariffScraper {
    config: ScrapeConfig,
    enricher: LocationEnricher,
    extractor: ResultExtractor,
}

impl TariffScraper {
    /// # Errors
    ///
    /// Fails when the extraction profile holds an invalid selector or the
    /// lookup URL cannot be used.
    pub fn new(config: ScrapeConfig) -> anyhow::Result<Self> {
        let extractor = ResultExtractor::new(config.extraction_profile())
            .context("Failed to compile extraction profile")?;
        let enricher =
            LocationEnricher::from_config(&config).context("Failed to create postcode lookup")?;
        Ok(Self {
            config,
            enricher,
            extractor,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Run against a freshly launched Chromium session
    pub async fn run(
        &self,
        request: &ScrapeRequest,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport, ScrapeError> {
        let started = Instant::now();
        let steps = self.plan(request).await?;
        let location = self.locate(request, cancel).await?;

        let session = ChromiumSession::open(&self.config)
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))?;

        self.drive(session, &steps, request, location, cancel, started)
            .await
    }

    /// Run against a session the caller opened; the session is consumed and
    /// closed whatever the outcome
    pub async fn run_with_session<S: FormSession>(
        &self,
        session: S,
        request: &ScrapeRequest,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport, ScrapeError> {
        let started = Instant::now();
        let prepared = match self.plan(request).await {
            Ok(steps) => self
                .locate(request, cancel)
                .await
                .map(|location| (steps, location)),
            Err(e) => Err(e),
        };

        match prepared {
            Ok((steps, location)) => {
                self.drive(session, &steps, request, location, cancel, started)
                    .await
            }
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    /// Run, then save every extracted record to `sink`
    pub async fn run_and_persist<K: TariffSink>(
        &self,
        request: &ScrapeRequest,
        sink: &K,
        cancel: &CancellationToken,
    ) -> Result<(ScrapeReport, PersistReport), ScrapeError> {
        let report = self.run(request, cancel).await?;
        let persisted = persist_all(sink, &report.records, &SaveContext::from(request)).await;
        Ok((report, persisted))
    }

    /// Run on its own task
    pub fn spawn(self: &Arc<Self>, request: ScrapeRequest, cancel: CancellationToken) -> ScrapeTask {
        let scraper = Arc::clone(self);
        let run_cancel = cancel.clone();
        let handle = tokio::spawn(async move { scraper.run(&request, &run_cancel).await });
        ScrapeTask { handle, cancel }
    }

    async fn plan(&self, request: &ScrapeRequest) -> Result<Vec<StepSpec>, ScrapeError> {
        match self.config.plan_path() {
            Some(path) => {
                info!("Loading step plan from {}", path.display());
                Ok(load_plan(path, request).await?)
            }
            None => Ok(comparison_plan(
                request,
                self.config.extraction_profile(),
            )),
        }
    }

    async fn locate(
        &self,
        request: &ScrapeRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<LocationRecord>, ScrapeError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ScrapeError::Aborted {
                step: "location".to_string(),
                kind: ErrorKind::Cancelled,
                artifacts: Vec::new(),
            }),
            location = self.enricher.lookup(&request.postcode) => Ok(Arc::new(location)),
        }
    }

    async fn drive<S: FormSession>(
        &self,
        session: S,
        steps: &[StepSpec],
        request: &ScrapeRequest,
        location: Arc<LocationRecord>,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<ScrapeReport, ScrapeError> {
        let run_cancel = cancel.child_token();
        let timer = {
            let token = run_cancel.clone();
            let limit = self.config.run_timeout();
            tokio::spawn(async move {
                tokio::select! {
                    () = token.cancelled() => {}
                    () = tokio::time::sleep(limit) => {
                        warn!("Run timeout of {limit:?} reached, cancelling");
                        token.cancel();
                    }
                }
            })
        };

        let result = self
            .drive_session(&session, steps, request, location, &run_cancel)
            .await;

        timer.abort();
        session.close().await;

        match &result {
            Ok(report) => info!(
                "Run finished with {} record(s) in {}ms",
                report.records.len(),
                started.elapsed().as_millis()
            ),
            Err(e) => warn!("Run failed at '{}': {e}", e.stage()),
        }
        result.map(|mut report| {
            report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            report
        })
    }

    async fn drive_session<S: FormSession>(
        &self,
        session: &S,
        steps: &[StepSpec],
        request: &ScrapeRequest,
        location: Arc<LocationRecord>,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport, ScrapeError> {
        let capture = FailureCapture::new(self.config.artifact_dir());
        let failure_capture = self.config.capture_on_failure().then(|| capture.clone());

        let url = self.config.start_url();
        info!("Navigating to {url}");
        let navigated = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(None),
            result = retry_with_backoff(|| session.navigate(url), NAVIGATION_MAX_RETRIES, cancel) => {
                result.map_err(Some)
            }
        };
        if let Err(error) = navigated {
            if cancel.is_cancelled() {
                return Err(ScrapeError::Aborted {
                    step: "navigation".to_string(),
                    kind: ErrorKind::Cancelled,
                    artifacts: snapshot(failure_capture.as_ref(), session, "navigation_cancelled")
                        .await,
                });
            }
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                message: error.map_or_else(|| "navigation interrupted".to_string(), |e| e.to_string()),
                artifacts: snapshot(failure_capture.as_ref(), session, "navigation_failed").await,
            });
        }

        match ChallengeBackoff::from_config(&self.config)
            .wait_out(session, cancel)
            .await
        {
            Ok(ChallengeOutcome::Persisting { waits }) => {
                warn!("Continuing with the challenge page still up after {waits} wait(s)");
            }
            Ok(_) => {}
            Err(_) => {
                return Err(ScrapeError::Aborted {
                    step: "challenge".to_string(),
                    kind: ErrorKind::Cancelled,
                    artifacts: snapshot(failure_capture.as_ref(), session, "challenge_cancelled")
                        .await,
                });
            }
        }

        let sequencer =
            NavigationSequencer::new(StepExecutor::from_config(&self.config), failure_capture.clone());
        let outcome = sequencer.run(steps, session, cancel).await;
        if !outcome.is_completed() {
            return Err(ScrapeError::Aborted {
                step: outcome.aborted_at.unwrap_or_default(),
                kind: outcome.abort_kind.unwrap_or(ErrorKind::ActionFailed),
                artifacts: outcome.artifacts,
            });
        }

        if sleep_or_cancel(self.config.results_settle(), cancel)
            .await
            .is_err()
        {
            return Err(ScrapeError::Aborted {
                step: "results".to_string(),
                kind: ErrorKind::Cancelled,
                artifacts: snapshot(failure_capture.as_ref(), session, "results_cancelled").await,
            });
        }

        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not read results page: {e}");
                return Err(ScrapeError::Aborted {
                    step: "results".to_string(),
                    kind: ErrorKind::ActionFailed,
                    artifacts: snapshot(failure_capture.as_ref(), session, "results_unreadable")
                        .await,
                });
            }
        };

        let mut artifacts = Vec::new();
        if self.config.save_results_html() {
            artifacts.extend(capture.save_markup(&html, "results").await);
        }

        let extractor = self
            .extractor
            .clone()
            .with_default_payment(request.payment_method);
        match extractor.extract_html(&html, &location) {
            Ok(records) => Ok(ScrapeReport {
                records,
                location,
                step_results: outcome.step_results,
                artifacts,
                elapsed_ms: 0,
            }),
            Err(ExtractError::NoResults) => {
                artifacts
                    .extend(snapshot(failure_capture.as_ref(), session, "results_no_results").await);
                Err(ScrapeError::NoResults { artifacts })
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn snapshot<S: FormSession>(
    capture: Option<&FailureCapture>,
    session: &S,
    label: &str,
) -> Vec<PathBuf> {
    match capture {
        Some(capture) => capture.capture(session, label).await.saved_artifacts,
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_input_is_canonicalised() {
        let request = ScrapeRequest::from_raw(" SW1A 1AA ", "steam", "cheque", "maybe");
        assert_eq!(request.postcode, "SW1A 1AA");
        assert_eq!(request.fuel_type, FuelType::Dual);
        assert_eq!(request.payment_method, PaymentMethod::MonthlyDirectDebit);
        assert_eq!(request.ev_status, EvStatus::No);

        let request = ScrapeRequest::from_raw("EC1A 1BB", "gas", "prepayment", "yes");
        assert_eq!(request.fuel_type, FuelType::Gas);
        assert_eq!(request.payment_method, PaymentMethod::Prepayment);
        assert_eq!(request.ev_status, EvStatus::Yes);
    }

    #[test]
    fn blank_supplier_and_email_are_dropped() {
        let request = ScrapeRequest::new("SW1A 1AA")
            .with_supplier("  ")
            .with_email("");
        assert_eq!(request.current_supplier, None);
        assert_eq!(request.email, None);

        let ctx = SaveContext::from(&request.with_supplier("Octopus Energy"));
        assert_eq!(ctx.current_supplier, "Octopus Energy");
    }
}
