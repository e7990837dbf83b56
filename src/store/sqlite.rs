use std::path::Path;
use std::time::Duration;

use chrono::Datelike;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use super::{SaveContext, StoreError, TariffSink};
use crate::tariff::TariffRecord;

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS fact_tariff_search_simple (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    current_supplier_name TEXT NOT NULL,
    pay_method TEXT NOT NULL,
    ev_question TEXT NOT NULL,
    new_supplier_name TEXT NOT NULL,
    tariff_name TEXT NOT NULL,
    tariff_type TEXT NOT NULL,
    payment_method TEXT,
    fixed_price_length_months INTEGER,
    is_green INTEGER NOT NULL DEFAULT 0,
    region_code TEXT,
    region_name TEXT,
    dno_name TEXT,
    dno_id TEXT,
    postcode TEXT,
    outward_code TEXT,
    latitude REAL,
    longitude REAL,
    fuel_type TEXT NOT NULL,
    search_date TEXT NOT NULL,
    month INTEGER,
    year INTEGER,
    annual_electricity_kwh INTEGER,
    annual_gas_kwh INTEGER,
    unit_rate REAL,
    standing_charge REAL,
    exit_fee REAL NOT NULL DEFAULT 0,
    annual_cost_current REAL,
    annual_cost_new REAL,
    valid_from TEXT,
    valid_to TEXT,
    created_at TEXT NOT NULL,
    last_updated TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_postcode ON fact_tariff_search_simple(postcode);
CREATE INDEX IF NOT EXISTS idx_region ON fact_tariff_search_simple(region_code);
CREATE INDEX IF NOT EXISTS idx_supplier ON fact_tariff_search_simple(new_supplier_name);
CREATE INDEX IF NOT EXISTS idx_tariff ON fact_tariff_search_simple(tariff_name);
CREATE INDEX IF NOT EXISTS idx_fuel_type ON fact_tariff_search_simple(fuel_type);
CREATE INDEX IF NOT EXISTS idx_search_date ON fact_tariff_search_simple(search_date);
CREATE INDEX IF NOT EXISTS idx_valid_dates ON fact_tariff_search_simple(valid_from, valid_to);
";

const INSERT_SQL: &str = r"
INSERT INTO fact_tariff_search_simple (
    current_supplier_name, pay_method, ev_question, new_supplier_name,
    tariff_name, tariff_type, payment_method, fixed_price_length_months,
    is_green, region_code, region_name, dno_name, dno_id, postcode,
    outward_code, latitude, longitude, fuel_type, search_date, month,
    year, annual_electricity_kwh, annual_gas_kwh, unit_rate,
    standing_charge, exit_fee, annual_cost_current, annual_cost_new,
    valid_from, valid_to, created_at, last_updated
) VALUES (
    ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
    ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
)
";

/// Tariff fact table in a SQLite file (WAL mode, schema created on open)
#[derive(Clone)]
pub struct SqliteTariffStore {
    pool: SqlitePool,
}

impl SqliteTariffStore {
    /// Open or create the database at `path`
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Directory {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        // Idempotent: CREATE ... IF NOT EXISTS
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fact_tariff_search_simple")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// `(new_supplier_name, tariff_name, tariff_type, exit_fee)` for a postcode,
    /// in insertion order
    pub async fn offers_for_postcode(
        &self,
        postcode: &str,
    ) -> Result<Vec<(String, String, String, f64)>, StoreError> {
        let rows = sqlx::query_as(
            "SELECT new_supplier_name, tariff_name, tariff_type, exit_fee
             FROM fact_tariff_search_simple WHERE postcode = ? ORDER BY id",
        )
        .bind(postcode)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl TariffSink for SqliteTariffStore {
    async fn save(&self, record: &TariffRecord, context: &SaveContext) -> Result<i64, StoreError> {
        let result = sqlx::query(INSERT_SQL)
            .bind(&context.current_supplier)
            .bind(context.payment_method.form_value())
            .bind(context.ev_status.label())
            .bind(&record.supplier_name)
            .bind(&record.tariff_name)
            .bind(record.tariff_type.as_str())
            .bind(record.payment_method.form_value())
            .bind(i64::from(record.fixed_price_length_months))
            .bind(record.is_green)
            .bind(&record.region_code)
            .bind(&record.region_name)
            .bind(&record.dno_name)
            .bind(&record.dno_id)
            .bind(&record.postcode)
            .bind(&record.outward_code)
            .bind(record.latitude)
            .bind(record.longitude)
            .bind(record.fuel_type.as_str())
            .bind(record.search_date.to_string())
            .bind(i64::from(record.search_date.month()))
            .bind(i64::from(record.search_date.year()))
            .bind(record.annual_electricity_kwh.map(i64::from))
            .bind(record.annual_gas_kwh.map(i64::from))
            .bind(record.unit_rate)
            .bind(record.standing_charge_day)
            .bind(record.exit_fee)
            .bind(record.annual_cost_current)
            .bind(record.annual_cost_new)
            .bind(record.valid_from.map(|d| d.to_string()))
            .bind(record.valid_to.map(|d| d.to_string()))
            .bind(record.created_at.to_rfc3339())
            .bind(record.last_updated.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }
}
