//! End-to-end runs over the in-memory session

mod common;

use std::path::Path;
use std::time::Duration;

use common::{Behavior, FakeSession};
use tariffscrape::config::{ScrapeConfigBuilder, WithStartUrl};
use tariffscrape::error::{ErrorKind, ScrapeError};
use tariffscrape::session::LocatorStrategy;
use tariffscrape::{ScrapeConfig, ScrapeRequest, TariffScraper};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const START_URL: &str = "https://quotes.example.com/energy";

/// Fast pacing, short waits and an unreachable lookup service
fn config(artifacts: &Path) -> ScrapeConfigBuilder<WithStartUrl> {
    ScrapeConfig::builder()
        .artifact_dir(artifacts)
        .start_url(START_URL)
        .lookup_base_url("http://127.0.0.1:9/")
        .lookup_timeout_secs(1)
        .action_delay_ms(0, 0)
        .keystroke_delay_ms(0)
        .resolve_max_wait_ms(500)
        .per_candidate_wait_ms(100)
        .poll_interval_ms(50)
        .results_settle_ms(0)
        .challenge_backoff(1, 100)
}

fn scraper(artifacts: &Path) -> TariffScraper {
    TariffScraper::new(config(artifacts).build().expect("valid test config")).expect("scraper")
}

fn quote_form() -> FakeSession {
    FakeSession::new()
        .with_element(LocatorStrategy::id("postcode"), Behavior::visible())
        .with_element(LocatorStrategy::css("button[type='submit']"), Behavior::visible())
        .with_element(LocatorStrategy::css(".result-card"), Behavior::visible())
}

#[tokio::test(start_paused = true)]
async fn successful_run_returns_records_and_closes_the_session() {
    let artifacts = TempDir::new().unwrap();
    let session = quote_form().with_content(common::two_card_results());
    let probe = session.clone();

    let report = scraper(artifacts.path())
        .run_with_session(session, &ScrapeRequest::new("sw1a 1aa"), &CancellationToken::new())
        .await
        .expect("run succeeds");

    assert!(probe.is_closed());
    assert_eq!(probe.navigations(), vec![START_URL.to_string()]);
    assert_eq!(probe.typed_into(&LocatorStrategy::id("postcode")), "sw1a 1aa");

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.location.postcode, "SW1A1AA");
    assert!(report.records.iter().all(|r| r.outward_code == "SW1A"));

    let names: Vec<&str> = report.step_results.iter().map(|r| r.step_name.as_str()).collect();
    assert_eq!(
        names,
        [
            "consent_and_start",
            "postcode",
            "address",
            "fuel_type",
            "payment_method",
            "ev_status",
            "submit",
            "await_results"
        ]
    );
    assert_eq!(report.artifacts.len(), 1);
    assert!(report.artifacts[0].exists());
}

#[tokio::test(start_paused = true)]
async fn missing_submit_aborts_with_artifacts_and_closes_the_session() {
    let artifacts = TempDir::new().unwrap();
    let session = FakeSession::new()
        .with_element(LocatorStrategy::id("postcode"), Behavior::visible())
        .with_element(LocatorStrategy::css(".result-card"), Behavior::visible());
    let probe = session.clone();

    let err = scraper(artifacts.path())
        .run_with_session(session, &ScrapeRequest::new("SW1A 1AA"), &CancellationToken::new())
        .await
        .expect_err("submit is required");

    assert!(probe.is_closed());
    assert_eq!(err.stage(), "submit");
    assert_eq!(err.kind(), Some(ErrorKind::ElementNotFound));
    assert_eq!(err.artifacts().len(), 2);
    assert!(err.artifacts().iter().all(|p| p.exists()));
    assert!(
        !probe
            .locate_calls()
            .contains(&LocatorStrategy::css(".result-card"))
    );
}

#[tokio::test(start_paused = true)]
async fn results_page_without_cards_is_no_results() {
    let artifacts = TempDir::new().unwrap();
    let session = quote_form().with_content(common::empty_results());
    let probe = session.clone();

    let err = scraper(artifacts.path())
        .run_with_session(session, &ScrapeRequest::new("SW1A 1AA"), &CancellationToken::new())
        .await
        .expect_err("no cards");

    assert!(probe.is_closed());
    assert!(matches!(err, ScrapeError::NoResults { .. }));
    // saved results page plus the failure screenshot and markup
    assert_eq!(err.artifacts().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn permanent_navigation_failure_is_reported() {
    let artifacts = TempDir::new().unwrap();
    let session = quote_form().with_navigation_error("target closed");
    let probe = session.clone();

    let err = scraper(artifacts.path())
        .run_with_session(session, &ScrapeRequest::new("SW1A 1AA"), &CancellationToken::new())
        .await
        .expect_err("navigation fails");

    assert!(probe.is_closed());
    assert_eq!(probe.navigations().len(), 1, "non-retryable errors are not retried");
    match err {
        ScrapeError::Navigation { url, message, .. } => {
            assert_eq!(url, START_URL);
            assert!(message.contains("target closed"));
        }
        other => panic!("expected Navigation, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_still_closes_the_session() {
    let artifacts = TempDir::new().unwrap();
    let session = quote_form();
    let probe = session.clone();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = scraper(artifacts.path())
        .run_with_session(session, &ScrapeRequest::new("SW1A 1AA"), &cancel)
        .await
        .expect_err("cancelled");

    assert!(probe.is_closed());
    assert_eq!(err.kind(), Some(ErrorKind::Cancelled));
    assert!(probe.navigations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn run_timeout_cancels_a_stuck_run() {
    let artifacts = TempDir::new().unwrap();
    // results never appear, so the run waits on await_results until the timeout
    let session = FakeSession::new()
        .with_element(LocatorStrategy::id("postcode"), Behavior::visible())
        .with_element(LocatorStrategy::css("button[type='submit']"), Behavior::visible())
        .with_element(
            LocatorStrategy::css(".result-card"),
            Behavior::appearing_after(Duration::from_secs(3_600)),
        );
    let probe = session.clone();

    let config = config(artifacts.path())
        .resolve_max_wait_ms(600_000)
        .per_candidate_wait_ms(600_000)
        .run_timeout_secs(45)
        .build()
        .unwrap();

    let err = TariffScraper::new(config)
        .unwrap()
        .run_with_session(session, &ScrapeRequest::new("SW1A 1AA"), &CancellationToken::new())
        .await
        .expect_err("times out");

    assert!(probe.is_closed());
    assert_eq!(err.kind(), Some(ErrorKind::Cancelled));
    assert!(!err.artifacts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_plan_file_fails_before_touching_the_page() {
    let artifacts = TempDir::new().unwrap();
    let plan = artifacts.path().join("plan.json");
    std::fs::write(&plan, r#"[{"name": "x", "actions": [{"targets": [], "kind": "click", "value": "{bogus}"}]}]"#)
        .unwrap();
    let config = config(artifacts.path())
        .plan_path(Some(plan))
        .build()
        .unwrap();
    let session = quote_form();
    let probe = session.clone();

    let err = TariffScraper::new(config)
        .unwrap()
        .run_with_session(session, &ScrapeRequest::new("SW1A 1AA"), &CancellationToken::new())
        .await
        .expect_err("unknown placeholder");

    assert!(matches!(err, ScrapeError::Plan(_)));
    assert!(probe.is_closed());
    assert!(probe.navigations().is_empty());
}
