//! Selector cascades used to read result cards.
//!
//! Every field has an ordered list of CSS selectors; the first selector that
//! matches inside the card wins. The default profile follows the result markup
//! of the common comparison sites and can be replaced wholesale from JSON.

use serde::{Deserialize, Serialize};

fn list(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionProfile {
    /// One match per offer
    pub card: Vec<String>,
    pub supplier_name: Vec<String>,
    pub tariff_name: Vec<String>,
    /// Text such as "Fixed 12 months" or "Variable"
    pub rate_label: Vec<String>,
    pub rate_value: Vec<String>,
    /// Labelled cells: each row holds one label and one value
    pub detail_row: Vec<String>,
    pub detail_label: Vec<String>,
    pub detail_value: Vec<String>,
    /// Badges checked for "green" or "renewable"
    pub decal: Vec<String>,
    /// Table with fuel column headers and standing charge / unit rate rows
    pub rates_table: Vec<String>,
    pub payment_method: Vec<String>,
    pub valid_from: Vec<String>,
    pub valid_to: Vec<String>,
    /// Read once per document, not per card
    pub electricity_kwh: Vec<String>,
    pub gas_kwh: Vec<String>,
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        Self {
            card: list(&[
                ".result-card",
                "[data-testid='result-card']",
                ".tariff-card",
                "[class*='ResultCard']",
            ]),
            supplier_name: list(&[
                ".supplier-name",
                "[data-testid='supplier-name']",
                "[class*='supplier']",
            ]),
            tariff_name: list(&[
                ".tariff-name",
                "[data-testid='tariff-name']",
                "[class*='tariff-name']",
                "h3",
            ]),
            rate_label: list(&[".rate-label", ".tariff-type", "[data-testid='rate-label']"]),
            rate_value: list(&[".rate-value", ".fixed-length", "[data-testid='rate-value']"]),
            detail_row: list(&[".detail-row", "dl > div", ".details li"]),
            detail_label: list(&[".detail-label", "dt", ".label"]),
            detail_value: list(&[".detail-value", "dd", ".value"]),
            decal: list(&[".decal", ".badge", "[class*='decal']", ".is-green"]),
            rates_table: list(&["table.rates", "table"]),
            payment_method: list(&[".payment-method", "[data-testid='payment-method']"]),
            valid_from: list(&[".valid-from"]),
            valid_to: list(&[".valid-to"]),
            electricity_kwh: list(&[".electricity-kwh", "[data-testid='electricity-usage']"]),
            gas_kwh: list(&[".gas-kwh", "[data-testid='gas-usage']"]),
        }
    }
}

impl ExtractionProfile {
    /// Load a profile from JSON; fields left out keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let profile =
            ExtractionProfile::from_json(r#"{"card": [".offer"]}"#).expect("valid profile");
        assert_eq!(profile.card, vec![".offer".to_string()]);
        assert_eq!(profile.supplier_name, ExtractionProfile::default().supplier_name);
    }
}
