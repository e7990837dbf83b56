//! Energy tariff comparison scraper.
//!
//! Drives a multi-step quote form in Chromium through a fallback-aware step
//! engine, extracts typed tariff records from the results page, enriches them
//! with postcode location data and stores them in SQLite.

pub mod browser_setup;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod location;
pub mod runner;
pub mod session;
pub mod store;
pub mod tariff;
pub mod utils;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::ScrapeConfig;
pub use engine::{
    ElementResolver, FailureCapture, NavigationSequencer, Resolution, StepExecutor, StepResult,
    StepSpec,
};
pub use error::{ErrorKind, ScrapeError};
pub use extract::{ExtractionProfile, ResultExtractor};
pub use location::{LocationEnricher, LocationRecord};
pub use runner::{ScrapeReport, ScrapeRequest, ScrapeTask, TariffScraper};
pub use session::{ChromiumSession, FormSession, LocatorStrategy, SessionError};
pub use store::{PersistReport, SaveContext, SqliteTariffStore, StoreError, TariffSink};
pub use tariff::{EvStatus, FuelType, PaymentMethod, TariffRecord, TariffType};
