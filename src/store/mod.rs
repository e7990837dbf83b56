//! Persistence of extracted tariffs.
//!
//! [`TariffSink`] is the seam; [`SqliteTariffStore`] writes one row per record
//! into a table shaped like the `fact_tariff_search_simple` fact table. A
//! failed insert only loses that record.

mod sqlite;

use std::future::Future;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub use sqlite::SqliteTariffStore;

use crate::error::ErrorKind;
use crate::runner::ScrapeRequest;
use crate::tariff::{EvStatus, PaymentMethod, TariffRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open tariff database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to create database directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Raised by sinks that refuse a record
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// What the quote was requested with; stored next to every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveContext {
    pub current_supplier: String,
    pub payment_method: PaymentMethod,
    pub ev_status: EvStatus,
}

impl From<&ScrapeRequest> for SaveContext {
    fn from(request: &ScrapeRequest) -> Self {
        Self {
            current_supplier: request.current_supplier.clone().unwrap_or_default(),
            payment_method: request.payment_method,
            ev_status: request.ev_status,
        }
    }
}

pub trait TariffSink: Send + Sync {
    /// Store one record, returning its row id
    fn save(
        &self,
        record: &TariffRecord,
        context: &SaveContext,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub saved_ids: Vec<i64>,
    pub failed: usize,
}

/// Save every record, logging and counting failures without stopping
pub async fn persist_all<K: TariffSink>(
    sink: &K,
    records: &[TariffRecord],
    context: &SaveContext,
) -> PersistReport {
    let mut report = PersistReport::default();
    for record in records {
        match sink.save(record, context).await {
            Ok(id) => report.saved_ids.push(id),
            Err(e) => {
                warn!(
                    "{}: failed to save '{}' from {}: {e}",
                    ErrorKind::DatabaseError,
                    record.tariff_name,
                    record.supplier_name
                );
                report.failed += 1;
            }
        }
    }
    info!(
        "Persisted {} of {} tariff record(s)",
        report.saved_ids.len(),
        records.len()
    );
    report
}
