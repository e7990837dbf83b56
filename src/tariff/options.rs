//! Canonical option enums.
//!
//! Free-form user input (CLI flags, plan templates) is canonicalised here once,
//! at the boundary. Unrecognised input maps to a documented default variant:
//! fuel to [`FuelType::Dual`], payment to [`PaymentMethod::MonthlyDirectDebit`]
//! and EV answers to [`EvStatus::No`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fuels covered by a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Gas,
    Electricity,
    #[default]
    Dual,
    /// Only produced by extraction when a card names no fuel
    Unknown,
}

impl FuelType {
    /// Canonicalise free-form input; anything unrecognised becomes `Dual`
    #[must_use]
    pub fn canonicalize(input: &str) -> Self {
        match normalize_token(input).as_str() {
            "gas" => Self::Gas,
            "electricity" | "electric" | "elec" => Self::Electricity,
            "dual" | "both" | "dual_fuel" | "gas_electricity" => Self::Dual,
            other => {
                tracing::debug!("Unrecognised fuel type '{other}', using dual");
                Self::Dual
            }
        }
    }

    /// Value the comparison form uses for this fuel's radio button
    #[must_use]
    pub fn form_value(self) -> &'static str {
        match self {
            Self::Gas => "gas",
            Self::Electricity => "electricity",
            Self::Dual | Self::Unknown => "both",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gas => "gas",
            Self::Electricity => "electricity",
            Self::Dual => "dual",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tariff pricing structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffType {
    Fixed,
    Variable,
    #[default]
    Unknown,
}

impl TariffType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Variable => "variable",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TariffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    MonthlyDirectDebit,
    QuarterlyDirectDebit,
    PayOnReceiptOfBill,
    Prepayment,
}

impl PaymentMethod {
    /// Canonicalise free-form input; anything unrecognised becomes `MonthlyDirectDebit`
    #[must_use]
    pub fn canonicalize(input: &str) -> Self {
        Self::from_label(input).unwrap_or_else(|| {
            tracing::debug!("Unrecognised payment method '{input}', using monthly direct debit");
            Self::MonthlyDirectDebit
        })
    }

    /// Recognise a payment method in a slug or a human label such as
    /// "Monthly Direct Debit" or "Pay as you go".
    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        let token = normalize_token(text);
        if token.contains("prepay") || token.contains("pay_as_you_go") || token.contains("prepayment")
        {
            Some(Self::Prepayment)
        } else if token.contains("quarterly") {
            Some(Self::QuarterlyDirectDebit)
        } else if token.contains("receipt") || token.contains("cash_cheque") || token == "on_demand"
        {
            Some(Self::PayOnReceiptOfBill)
        } else if token.contains("monthly") || token.contains("direct_debit") || token == "dd" {
            Some(Self::MonthlyDirectDebit)
        } else {
            None
        }
    }

    /// Value the comparison form uses in the payment radio's id and value
    #[must_use]
    pub fn form_value(self) -> &'static str {
        match self {
            Self::MonthlyDirectDebit => "monthly_direct_debit",
            Self::QuarterlyDirectDebit => "quarterly_direct_debit",
            Self::PayOnReceiptOfBill => "pay_on_receipt",
            Self::Prepayment => "prepayment",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_value())
    }
}

/// Answer to the comparison form's electric-vehicle question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvStatus {
    Yes,
    #[default]
    No,
    NoButInterested,
}

impl EvStatus {
    /// Canonicalise free-form input; anything unrecognised becomes `No`
    #[must_use]
    pub fn canonicalize(input: &str) -> Self {
        match normalize_token(input).as_str() {
            "yes" | "y" | "true" | "1" => Self::Yes,
            "no" | "n" | "false" | "0" => Self::No,
            "interested" | "no_but_interested" | "maybe" => Self::NoButInterested,
            other => {
                tracing::debug!("Unrecognised EV answer '{other}', using no");
                Self::No
            }
        }
    }

    #[must_use]
    pub fn form_value(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::NoButInterested => "interested",
        }
    }

    /// Label stored alongside persisted records
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::NoButInterested => "No but interested",
        }
    }
}

impl fmt::Display for EvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercase, trim, and join words with `_` so "Gas & Electricity",
/// "gas-electricity" and "GAS_ELECTRICITY" compare equal.
fn normalize_token(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty() && *part != "and")
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_canonicalisation_defaults_to_dual() {
        assert_eq!(FuelType::canonicalize("Gas"), FuelType::Gas);
        assert_eq!(FuelType::canonicalize(" electricity "), FuelType::Electricity);
        assert_eq!(FuelType::canonicalize("both"), FuelType::Dual);
        assert_eq!(FuelType::canonicalize("Gas & Electricity"), FuelType::Dual);
        assert_eq!(FuelType::canonicalize("coal"), FuelType::Dual);
        assert_eq!(FuelType::canonicalize(""), FuelType::Dual);
    }

    #[test]
    fn payment_canonicalisation_defaults_to_monthly() {
        assert_eq!(
            PaymentMethod::canonicalize("quarterly_direct_debit"),
            PaymentMethod::QuarterlyDirectDebit
        );
        assert_eq!(
            PaymentMethod::canonicalize("Pay as you go"),
            PaymentMethod::Prepayment
        );
        assert_eq!(
            PaymentMethod::canonicalize("Pay on receipt of bill"),
            PaymentMethod::PayOnReceiptOfBill
        );
        assert_eq!(
            PaymentMethod::canonicalize("bitcoin"),
            PaymentMethod::MonthlyDirectDebit
        );
        assert_eq!(PaymentMethod::from_label("bitcoin"), None);
    }

    #[test]
    fn ev_canonicalisation_defaults_to_no() {
        assert_eq!(EvStatus::canonicalize("YES"), EvStatus::Yes);
        assert_eq!(
            EvStatus::canonicalize("No but interested"),
            EvStatus::NoButInterested
        );
        assert_eq!(EvStatus::canonicalize("perhaps"), EvStatus::No);
    }

    #[test]
    fn form_values_match_radio_ids() {
        assert_eq!(FuelType::Unknown.form_value(), "both");
        assert_eq!(
            PaymentMethod::MonthlyDirectDebit.form_value(),
            "monthly_direct_debit"
        );
        assert_eq!(EvStatus::Yes.form_value(), "yes");
    }
}
