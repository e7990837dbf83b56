//! Tariff domain types: the canonical option enums and the extracted record.

pub mod options;
pub mod record;

pub use options::{EvStatus, FuelType, PaymentMethod, TariffType};
pub use record::TariffRecord;
