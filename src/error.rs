//! Error kinds and the terminal error of a scrape run
//!
//! Each layer keeps its own typed error (`SessionError`, `ExtractError`,
//! `LookupError`, `StoreError`, `PlanError`). `ErrorKind` is the flat
//! classification used by step results and logs, and `ScrapeError` is what a
//! caller of [`crate::TariffScraper`] sees when a run stops.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::engine::plan::PlanError;
use crate::extract::ExtractError;

/// Flat classification of everything that can go wrong during a run.
///
/// `FieldParseFailure`, `DatabaseError` and `LookupUnavailable` are always
/// recovered where they happen; they exist so logs and reports can name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ElementNotFound,
    ActionFailed,
    Cancelled,
    NoResults,
    FieldParseFailure,
    DatabaseError,
    LookupUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ElementNotFound => "element not found",
            Self::ActionFailed => "action failed",
            Self::Cancelled => "cancelled",
            Self::NoResults => "no results",
            Self::FieldParseFailure => "field parse failure",
            Self::DatabaseError => "database error",
            Self::LookupUnavailable => "lookup unavailable",
        };
        f.write_str(name)
    }
}

/// Terminal error of a scrape run.
///
/// Every variant that happens after the browser opened carries the paths of
/// the diagnostic artifacts captured at the point of failure.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The browser could not be launched or the session could not be opened
    #[error("failed to open browser session: {0}")]
    Session(String),

    /// The start page never loaded
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        url: String,
        message: String,
        artifacts: Vec<PathBuf>,
    },

    /// A required step failed, or the run was cancelled or timed out
    #[error("run aborted at step '{step}': {kind}")]
    Aborted {
        step: String,
        kind: ErrorKind,
        artifacts: Vec<PathBuf>,
    },

    /// The form completed but the results page held no result cards
    #[error("comparison returned no result cards")]
    NoResults { artifacts: Vec<PathBuf> },

    /// The extraction profile itself is broken
    #[error("result extraction failed: {0}")]
    Extract(ExtractError),

    /// The step plan could not be loaded or rendered
    #[error("invalid step plan: {0}")]
    Plan(#[from] PlanError),

    /// The spawned run task panicked or was aborted
    #[error("scrape task failed: {0}")]
    Task(String),
}

impl ScrapeError {
    /// Error kind for variants that map onto one
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Aborted { kind, .. } => Some(*kind),
            Self::NoResults { .. } => Some(ErrorKind::NoResults),
            _ => None,
        }
    }

    /// Name of the step or stage at which the run stopped
    #[must_use]
    pub fn stage(&self) -> &str {
        match self {
            Self::Session(_) => "session",
            Self::Navigation { .. } => "navigation",
            Self::Aborted { step, .. } => step,
            Self::NoResults { .. } | Self::Extract(_) => "extraction",
            Self::Plan(_) => "plan",
            Self::Task(_) => "task",
        }
    }

    /// Diagnostic artifacts captured before the run stopped
    #[must_use]
    pub fn artifacts(&self) -> &[PathBuf] {
        match self {
            Self::Navigation { artifacts, .. }
            | Self::Aborted { artifacts, .. }
            | Self::NoResults { artifacts } => artifacts,
            _ => &[],
        }
    }
}

impl From<ExtractError> for ScrapeError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::NoResults => Self::NoResults {
                artifacts: Vec::new(),
            },
            other => Self::Extract(other),
        }
    }
}
