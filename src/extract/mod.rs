//! Result extraction: result-page markup to typed `TariffRecord`s.
//!
//! Extraction is tolerant by construction. A field that is missing or does
//! not parse takes its default and never stops the remaining fields or cards.
//! Only a page with no usable result card is an error.

pub mod fields;
pub mod profile;

use chrono::Utc;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use profile::ExtractionProfile;

use crate::error::ErrorKind;
use crate::location::LocationRecord;
use crate::tariff::{FuelType, PaymentMethod, TariffRecord, TariffType};
use crate::utils::{collapse_whitespace, safe_truncate_chars};
use fields::{
    classify_tariff_type, first_decimal, first_int, fuel_from_headers, parse_currency, parse_date,
    parse_quantity,
};

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document holds no usable result card
    #[error("no result cards found")]
    NoResults,

    /// A profile selector does not parse; the profile is broken, not the page
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// A single card that could not become a record
#[derive(Debug, Error)]
pub enum CardError {
    #[error("result card {index} has no text (placeholder or still loading)")]
    Blank { index: usize },
}

static TR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("BUG: hardcoded CSS selector 'tr' is invalid"));

static THEAD_CELLS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("thead th, thead td")
        .expect("BUG: hardcoded CSS selector 'thead th, thead td' is invalid")
});

static IMG_ALT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img[alt]").expect("BUG: hardcoded CSS selector 'img[alt]' is invalid")
});

/// An ordered list of compiled selectors
#[derive(Debug, Clone)]
struct Cascade(Vec<Selector>);

impl Cascade {
    fn compile(selectors: &[String]) -> Result<Self, ExtractError> {
        selectors
            .iter()
            .map(|selector| {
                Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
                    selector: selector.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// All matches of the first selector that matches anything
    fn all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.0
            .iter()
            .map(|selector| scope.select(selector).collect::<Vec<_>>())
            .find(|matches| !matches.is_empty())
            .unwrap_or_default()
    }

    /// Whether any selector matches an element satisfying `pred`
    fn any_match(&self, scope: ElementRef<'_>, pred: impl FnMut(ElementRef<'_>) -> bool) -> bool {
        self.0
            .iter()
            .flat_map(|selector| scope.select(selector))
            .any(pred)
    }

    fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.0
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// Text of the first match with non-blank text
    fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.0.iter().find_map(|selector| {
            scope
                .select(selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text directly inside `element`, without its child elements
fn own_text(element: ElementRef<'_>) -> String {
    let parts: Vec<&str> = element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect();
    collapse_whitespace(&parts.join(" "))
}

/// Parse an optional field text, logging texts that are present but unparseable
fn parse_field<T>(field: &str, text: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let text = text?;
    let parsed = parse(text);
    if parsed.is_none() {
        debug!(
            "{}: {field} text '{}' did not parse, using default",
            ErrorKind::FieldParseFailure,
            safe_truncate_chars(text, 80)
        );
    }
    parsed
}

/// One labelled cell of a card, label lowercased
struct DetailRow {
    label: String,
    value: String,
}

/// Standing charge, unit rate and fuel read from a card's rates table
struct RatesTable {
    fuel: FuelType,
    standing_charge: Option<f64>,
    unit_rate: Option<f64>,
}

/// Compiled extraction profile
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    card: Cascade,
    supplier_name: Cascade,
    tariff_name: Cascade,
    rate_label: Cascade,
    rate_value: Cascade,
    detail_row: Cascade,
    detail_label: Cascade,
    detail_value: Cascade,
    decal: Cascade,
    rates_table: Cascade,
    payment_method: Cascade,
    valid_from: Cascade,
    valid_to: Cascade,
    electricity_kwh: Cascade,
    gas_kwh: Cascade,
    default_payment: PaymentMethod,
}

impl ResultExtractor {
    /// Compile every selector of `profile`
    ///
    /// # Errors
    ///
    /// `ExtractError::InvalidSelector` naming the first selector that does not parse.
    pub fn new(profile: &ExtractionProfile) -> Result<Self, ExtractError> {
        Ok(Self {
            card: Cascade::compile(&profile.card)?,
            supplier_name: Cascade::compile(&profile.supplier_name)?,
            tariff_name: Cascade::compile(&profile.tariff_name)?,
            rate_label: Cascade::compile(&profile.rate_label)?,
            rate_value: Cascade::compile(&profile.rate_value)?,
            detail_row: Cascade::compile(&profile.detail_row)?,
            detail_label: Cascade::compile(&profile.detail_label)?,
            detail_value: Cascade::compile(&profile.detail_value)?,
            decal: Cascade::compile(&profile.decal)?,
            rates_table: Cascade::compile(&profile.rates_table)?,
            payment_method: Cascade::compile(&profile.payment_method)?,
            valid_from: Cascade::compile(&profile.valid_from)?,
            valid_to: Cascade::compile(&profile.valid_to)?,
            electricity_kwh: Cascade::compile(&profile.electricity_kwh)?,
            gas_kwh: Cascade::compile(&profile.gas_kwh)?,
            default_payment: PaymentMethod::default(),
        })
    }

    /// Payment method recorded for cards that do not name one; normally the
    /// method the quote was requested with
    #[must_use]
    pub fn with_default_payment(mut self, payment: PaymentMethod) -> Self {
        self.default_payment = payment;
        self
    }

    /// Parse `html` and extract from it
    pub fn extract_html(
        &self,
        html: &str,
        location: &LocationRecord,
    ) -> Result<Vec<TariffRecord>, ExtractError> {
        self.extract(&Html::parse_document(html), location)
    }

    /// One record per non-blank result card.
    ///
    /// # Errors
    ///
    /// `ExtractError::NoResults` when the document has no result card, or only
    /// blank ones.
    pub fn extract(
        &self,
        document: &Html,
        location: &LocationRecord,
    ) -> Result<Vec<TariffRecord>, ExtractError> {
        let root = document.root_element();
        let cards = self.card.all(root);
        if cards.is_empty() {
            warn!("No result cards matched the extraction profile");
            return Err(ExtractError::NoResults);
        }

        let electricity_kwh = parse_field(
            "electricity_kwh",
            self.electricity_kwh.first_text(root).as_deref(),
            parse_quantity,
        );
        let gas_kwh = parse_field("gas_kwh", self.gas_kwh.first_text(root).as_deref(), parse_quantity);

        let mut records = Vec::with_capacity(cards.len());
        for (index, card) in cards.into_iter().enumerate() {
            match self.extract_card(index, card, location, electricity_kwh, gas_kwh) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping card: {e}"),
            }
        }

        if records.is_empty() {
            warn!("Every result card was blank");
            return Err(ExtractError::NoResults);
        }
        info!("Extracted {} tariff record(s)", records.len());
        Ok(records)
    }

    fn extract_card(
        &self,
        index: usize,
        card: ElementRef<'_>,
        location: &LocationRecord,
        annual_electricity_kwh: Option<u32>,
        annual_gas_kwh: Option<u32>,
    ) -> Result<TariffRecord, CardError> {
        if element_text(card).is_empty() {
            return Err(CardError::Blank { index });
        }

        let supplier_name = self
            .supplier_name
            .first(card)
            .and_then(|el| {
                let text = element_text(el);
                if text.is_empty() {
                    el.select(&IMG_ALT)
                        .find_map(|img| img.value().attr("alt").map(collapse_whitespace))
                        .filter(|alt| !alt.is_empty())
                } else {
                    Some(text)
                }
            })
            .unwrap_or_else(|| "Unknown Supplier".to_string());
        let tariff_name = self
            .tariff_name
            .first_text(card)
            .unwrap_or_else(|| "Unknown Tariff".to_string());

        let label = self.rate_label.first_text(card).unwrap_or_default();
        let value = self.rate_value.first_text(card).unwrap_or_default();
        let tariff_type = classify_tariff_type(&label)
            .or_else(|| classify_tariff_type(&value))
            .unwrap_or(TariffType::Unknown);
        let fixed_price_length_months = if tariff_type == TariffType::Fixed {
            first_int(&label).or_else(|| first_int(&value)).unwrap_or(0)
        } else {
            0
        };

        let rows = self.detail_rows(card);
        let row_value = |needles: &[&str]| {
            rows.iter()
                .find(|row| needles.iter().any(|n| row.label.contains(n)))
                .map(|row| row.value.as_str())
        };

        let exit_fee = parse_field(
            "exit_fee",
            row_value(&["exit fee", "cancellation fee"]),
            parse_currency,
        )
        .unwrap_or(0.0);

        let (annual_cost_current, annual_cost_new) = annual_costs(card);

        let rates = self.rates(card);

        let is_green = self.decal.any_match(card, |decal| {
            let text = element_text(decal).to_lowercase();
            text.contains("green") || text.contains("renewable")
        });

        let payment_method = self
            .payment_method
            .first_text(card)
            .and_then(|text| PaymentMethod::from_label(&text))
            .unwrap_or(self.default_payment);

        let valid_from = parse_field(
            "valid_from",
            self.valid_from
                .first_text(card)
                .as_deref()
                .or_else(|| row_value(&["valid from", "starts"])),
            parse_date,
        );
        let valid_to = parse_field(
            "valid_to",
            self.valid_to
                .first_text(card)
                .as_deref()
                .or_else(|| row_value(&["valid to", "valid until", "ends"])),
            parse_date,
        );

        let now = Utc::now();
        Ok(TariffRecord {
            supplier_name,
            tariff_name,
            tariff_type,
            payment_method,
            fixed_price_length_months,
            is_green,
            region_code: location.region_code.clone(),
            region_name: location.region_name.clone(),
            dno_id: location.dno_id.clone(),
            dno_name: location.dno_name.clone(),
            postcode: location.postcode.clone(),
            outward_code: location.outward_code.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            fuel_type: rates.fuel,
            annual_electricity_kwh,
            annual_gas_kwh,
            unit_rate: rates.unit_rate.unwrap_or(0.0),
            standing_charge_day: rates.standing_charge.unwrap_or(0.0),
            exit_fee,
            annual_cost_current: annual_cost_current.unwrap_or(0.0),
            annual_cost_new: annual_cost_new.unwrap_or(0.0),
            valid_from,
            valid_to,
            search_date: now.date_naive(),
            created_at: now,
            last_updated: now,
        })
    }

    fn detail_rows(&self, card: ElementRef<'_>) -> Vec<DetailRow> {
        self.detail_row
            .all(card)
            .into_iter()
            .filter_map(|row| {
                let cells: Vec<ElementRef<'_>> = row.children().filter_map(ElementRef::wrap).collect();
                let label = self
                    .detail_label
                    .first_text(row)
                    .or_else(|| cells.first().map(|c| element_text(*c)))?;
                let value = self
                    .detail_value
                    .first_text(row)
                    .or_else(|| cells.last().map(|c| element_text(*c)))?;
                Some(DetailRow {
                    label: label.to_lowercase(),
                    value,
                })
            })
            .collect()
    }

    fn rates(&self, card: ElementRef<'_>) -> RatesTable {
        let mut rates = RatesTable {
            fuel: FuelType::Unknown,
            standing_charge: None,
            unit_rate: None,
        };
        let Some(table) = self.rates_table.first(card) else {
            return rates;
        };

        let mut headers: Vec<String> = table.select(&THEAD_CELLS).map(element_text).collect();
        let mut skip_first_row = false;
        if headers.is_empty() {
            if let Some(first_row) = table.select(&TR).next() {
                headers = row_cells(first_row).into_iter().map(element_text).collect();
                skip_first_row = true;
            }
        }
        rates.fuel = fuel_from_headers(&headers);
        let dual = rates.fuel == FuelType::Dual;

        let body_rows = table
            .select(&TR)
            .filter(|row| {
                row.parent()
                    .and_then(ElementRef::wrap)
                    .is_none_or(|parent| parent.value().name() != "thead")
            })
            .skip(usize::from(skip_first_row));

        for row in body_rows {
            let cells = row_cells(row);
            let Some((label_cell, values)) = cells.split_first() else {
                continue;
            };
            let label = element_text(*label_cell).to_lowercase();
            let cell = if dual { values.last() } else { values.first() };
            let text = cell.map(|c| element_text(*c));

            if label.contains("standing") && rates.standing_charge.is_none() {
                rates.standing_charge = parse_field("standing_charge", text.as_deref(), first_decimal);
            } else if label.contains("unit rate") && rates.unit_rate.is_none() {
                rates.unit_rate = parse_field("unit_rate", text.as_deref(), first_decimal);
            }
        }
        rates
    }
}

fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .collect()
}

/// Amounts labelled "annual cost"; labels that also say "current" are the
/// current-tariff cost, all others the new one. The amount is read from the
/// rest of the label's own text, else from the next non-blank sibling.
fn annual_costs(card: ElementRef<'_>) -> (Option<f64>, Option<f64>) {
    const LABEL: &str = "annual cost";
    let mut current = None;
    let mut new = None;

    for element in card.descendants().filter_map(ElementRef::wrap) {
        let own = own_text(element).to_lowercase();
        let Some(at) = own.find(LABEL) else {
            continue;
        };
        let is_current = own.contains("current");
        let slot = if is_current { &mut current } else { &mut new };
        if slot.is_some() {
            continue;
        }

        let inline = parse_currency(&own[at + LABEL.len()..]);
        let amount = inline.or_else(|| following_amount(element));
        if amount.is_none() {
            debug!(
                "{}: annual cost label '{own}' has no amount",
                ErrorKind::FieldParseFailure
            );
        }
        *slot = amount;
    }
    (current, new)
}

fn following_amount(label: ElementRef<'_>) -> Option<f64> {
    for sibling in label.next_siblings() {
        let text = match sibling.value() {
            Node::Text(text) => collapse_whitespace(text),
            Node::Element(_) => ElementRef::wrap(sibling).map(element_text).unwrap_or_default(),
            _ => continue,
        };
        if !text.is_empty() {
            return parse_currency(&text);
        }
    }
    None
}
