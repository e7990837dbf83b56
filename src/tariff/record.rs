//! The flat record produced for every result card.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::options::{FuelType, PaymentMethod, TariffType};

/// One comparable tariff offer as read from the results page.
///
/// Records are only created by [`crate::extract::ResultExtractor`]. Every
/// numeric field falls back to `0` / `0.0` / `None` when the card does not
/// carry it, so a record always exists for a non-blank card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffRecord {
    pub supplier_name: String,
    pub tariff_name: String,
    pub tariff_type: TariffType,
    pub payment_method: PaymentMethod,
    /// Contract length; always 0 unless `tariff_type` is `Fixed`
    pub fixed_price_length_months: u32,
    pub is_green: bool,

    pub region_code: String,
    pub region_name: String,
    pub dno_id: String,
    pub dno_name: String,
    pub postcode: String,
    pub outward_code: String,
    pub latitude: f64,
    pub longitude: f64,

    pub fuel_type: FuelType,

    pub annual_electricity_kwh: Option<u32>,
    pub annual_gas_kwh: Option<u32>,
    /// Pence per kWh
    pub unit_rate: f64,
    /// Pence per day
    pub standing_charge_day: f64,
    pub exit_fee: f64,
    pub annual_cost_current: f64,
    pub annual_cost_new: f64,

    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,

    pub search_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl TariffRecord {
    /// Projected saving against the current tariff; negative when the offer costs more
    #[must_use]
    pub fn annual_saving(&self) -> f64 {
        self.annual_cost_current - self.annual_cost_new
    }
}
