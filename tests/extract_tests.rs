//! Result-page extraction

mod common;

use chrono::NaiveDate;
use tariffscrape::extract::{ExtractError, ExtractionProfile, ResultExtractor};
use tariffscrape::location::LocationRecord;
use tariffscrape::tariff::{FuelType, PaymentMethod, TariffType};

fn location() -> LocationRecord {
    LocationRecord {
        postcode: "SW1A1AA".to_string(),
        outward_code: "SW1A".to_string(),
        latitude: 51.501,
        longitude: -0.1416,
        region_name: "London".to_string(),
        region_code: "Westminster".to_string(),
        country: "England".to_string(),
        dno_id: "UKPN_LPN".to_string(),
        dno_name: "UKPN_1".to_string(),
    }
}

fn extractor() -> ResultExtractor {
    ResultExtractor::new(&ExtractionProfile::default()).expect("default profile compiles")
}

#[test]
fn extracts_one_record_per_card() {
    let records = extractor()
        .extract_html(&common::two_card_results(), &location())
        .expect("records");

    assert_eq!(records.len(), 2);

    let fixed = &records[0];
    assert_eq!(fixed.supplier_name, "Octopus Energy");
    assert_eq!(fixed.tariff_name, "Octopus 12M Fixed");
    assert_eq!(fixed.tariff_type, TariffType::Fixed);
    assert_eq!(fixed.fixed_price_length_months, 12);
    assert!(fixed.is_green);
    assert_eq!(fixed.exit_fee, 75.0);
    assert_eq!(fixed.fuel_type, FuelType::Dual);
    assert_eq!(fixed.standing_charge_day, 53.35);
    assert_eq!(fixed.unit_rate, 24.50);
    assert_eq!(fixed.annual_cost_current, 1850.40);
    assert_eq!(fixed.annual_cost_new, 1612.10);
    assert!((fixed.annual_saving() - 238.30).abs() < 1e-9);
    assert_eq!(fixed.valid_from, NaiveDate::from_ymd_opt(2026, 10, 1));
    assert_eq!(fixed.valid_to, None);

    let variable = &records[1];
    assert_eq!(variable.supplier_name, "British Gas");
    assert_eq!(variable.tariff_type, TariffType::Variable);
    assert_eq!(variable.fixed_price_length_months, 0);
    assert!(!variable.is_green);
    assert_eq!(variable.fuel_type, FuelType::Electricity);
    assert_eq!(variable.standing_charge_day, 60.99);
    assert_eq!(variable.unit_rate, 27.03);
}

#[test]
fn missing_exit_fee_and_costs_default_to_zero() {
    let records = extractor()
        .extract_html(&common::two_card_results(), &location())
        .unwrap();
    let variable = &records[1];

    assert_eq!(variable.exit_fee, 0.0);
    assert_eq!(variable.annual_cost_current, 0.0);
    assert_eq!(variable.annual_cost_new, 0.0);
    assert_eq!(variable.valid_from, None);
}

#[test]
fn every_record_carries_the_run_location_and_usage() {
    let records = extractor()
        .extract_html(&common::two_card_results(), &location())
        .unwrap();

    for record in &records {
        assert_eq!(record.postcode, "SW1A1AA");
        assert_eq!(record.outward_code, "SW1A");
        assert_eq!(record.region_name, "London");
        assert_eq!(record.dno_id, "UKPN_LPN");
        assert_eq!(record.latitude, 51.501);
        assert_eq!(record.annual_electricity_kwh, Some(2700));
        assert_eq!(record.annual_gas_kwh, Some(11500));
        assert_eq!(record.search_date, record.created_at.date_naive());
    }
}

#[test]
fn page_without_cards_is_no_results() {
    let result = extractor().extract_html(&common::empty_results(), &location());
    assert!(matches!(result, Err(ExtractError::NoResults)));
}

#[test]
fn blank_cards_are_skipped_and_all_blank_is_no_results() {
    let only_blank = r#"<div class="result-card">  </div><div class="result-card"></div>"#;
    assert!(matches!(
        extractor().extract_html(only_blank, &location()),
        Err(ExtractError::NoResults)
    ));

    let mixed = r#"<div class="result-card"></div>
        <div class="result-card"><span class="supplier-name">EDF</span></div>"#;
    let records = extractor().extract_html(mixed, &location()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].supplier_name, "EDF");
}

#[test]
fn garbled_fields_fall_back_without_losing_the_card() {
    let html = r#"
        <div class="result-card">
          <span class="supplier-name"><img src="logo.png" alt="Ovo Energy"></span>
          <div class="rate-label">Price promise</div>
          <div class="detail-row"><span class="detail-label">Exit fee</span><span class="detail-value">ask us</span></div>
          <div class="detail-row"><span class="detail-label">Valid to</span><span class="detail-value">soon</span></div>
          <table class="rates"><tr><td>Standing charge</td><td>n/a</td></tr></table>
        </div>"#;

    let records = extractor().extract_html(html, &location()).unwrap();
    let record = &records[0];

    assert_eq!(record.supplier_name, "Ovo Energy");
    assert_eq!(record.tariff_name, "Unknown Tariff");
    assert_eq!(record.tariff_type, TariffType::Unknown);
    assert_eq!(record.exit_fee, 0.0);
    assert_eq!(record.valid_to, None);
    assert_eq!(record.standing_charge_day, 0.0);
    assert_eq!(record.fuel_type, FuelType::Unknown);
    assert_eq!(record.annual_electricity_kwh, None);
}

#[test]
fn card_payment_label_overrides_the_request_default() {
    let html = r#"
        <div class="result-card"><span class="supplier-name">EDF</span>
          <span class="payment-method">Pay on receipt of bill</span></div>
        <div class="result-card"><span class="supplier-name">Eon</span></div>"#;

    let records = ResultExtractor::new(&ExtractionProfile::default())
        .unwrap()
        .with_default_payment(PaymentMethod::Prepayment)
        .extract_html(html, &location())
        .unwrap();

    assert_eq!(records[0].payment_method, PaymentMethod::PayOnReceiptOfBill);
    assert_eq!(records[1].payment_method, PaymentMethod::Prepayment);
}

#[test]
fn custom_profile_reads_other_markup() {
    let profile = ExtractionProfile::from_json(
        r#"{"card": ["article.offer"], "supplier_name": ["h2"], "tariff_name": ["h3"]}"#,
    )
    .unwrap();
    let html = "<article class='offer'><h2>So Energy</h2><h3>So Fixed</h3></article>";

    let records = ResultExtractor::new(&profile)
        .unwrap()
        .extract_html(html, &location())
        .unwrap();

    assert_eq!(records[0].supplier_name, "So Energy");
    assert_eq!(records[0].tariff_name, "So Fixed");
    // Type comes from the rate label or value, never the tariff name
    assert_eq!(records[0].tariff_type, TariffType::Unknown);
}

#[test]
fn invalid_profile_selector_is_reported() {
    let profile = ExtractionProfile {
        card: vec!["div[".to_string()],
        ..ExtractionProfile::default()
    };
    match ResultExtractor::new(&profile) {
        Err(ExtractError::InvalidSelector { selector, .. }) => assert_eq!(selector, "div["),
        other => panic!("expected InvalidSelector, got {:?}", other.err()),
    }
}

#[test]
fn green_badge_counts_even_when_another_decal_kind_is_present() {
    let html = r#"
        <div class="result-card">
          <h3 class="supplier-name">Good Energy</h3>
          <span class="tariff-name">Good Fixed</span>
          <span class="decal">Best price</span>
          <span class="badge">100% renewable</span>
        </div>
        <div class="result-card">
          <h3 class="supplier-name">EDF</h3>
          <span class="tariff-name">Simply Fixed</span>
          <span class="decal">Best price</span>
        </div>"#;

    let records = extractor().extract_html(html, &location()).unwrap();

    assert!(records[0].is_green);
    assert!(!records[1].is_green);
}
