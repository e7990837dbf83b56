//! Postcode enrichment against a mock lookup service

use std::time::Duration;

use tariffscrape::location::{LocationEnricher, LookupError, PostcodeClient};

const SW1A_BODY: &str = r#"{
    "status": 200,
    "result": {
        "postcode": "SW1A 1AA",
        "outcode": "SW1A",
        "latitude": 51.501009,
        "longitude": -0.141588,
        "region": "London",
        "country": "England",
        "codes": {"admin_district": "E09000033"}
    }
}"#;

fn enricher(base_url: &str) -> LocationEnricher {
    LocationEnricher::new(
        PostcodeClient::new(base_url, Duration::from_secs(5)).expect("valid lookup URL"),
    )
}

#[tokio::test]
async fn lookup_maps_region_coordinates_and_operator() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/postcodes/SW1A1AA")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SW1A_BODY)
        .create_async()
        .await;

    let record = enricher(&server.url()).try_lookup("sw1a 1aa").await.unwrap();

    mock.assert_async().await;
    assert_eq!(record.postcode, "SW1A1AA");
    assert_eq!(record.outward_code, "SW1A");
    assert_eq!(record.region_name, "London");
    assert_eq!(record.region_code, "E09000033");
    assert_eq!(record.country, "England");
    assert_eq!(record.dno_id, "UKPN_LPN");
    assert_eq!(record.dno_name, "UKPN_1");
    assert!((record.latitude - 51.501009).abs() < 1e-9);
}

#[tokio::test]
async fn lookup_is_idempotent_across_case_and_spacing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/postcodes/SW1A1AA")
        .with_status(200)
        .with_body(SW1A_BODY)
        .expect(3)
        .create_async()
        .await;
    let enricher = enricher(&server.url());

    let a = enricher.lookup("sw1a 1aa").await;
    let b = enricher.lookup("SW1A1AA").await;
    let c = enricher.lookup("  Sw1A   1Aa ").await;

    mock.assert_async().await;
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn unknown_postcode_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/postcodes/ZZ99ZZ")
        .with_status(404)
        .with_body(r#"{"status": 404, "error": "Invalid postcode"}"#)
        .create_async()
        .await;

    let result = enricher(&server.url()).try_lookup("ZZ9 9ZZ").await;
    assert!(matches!(result, Err(LookupError::NotFound(_))));
}

#[tokio::test]
async fn server_error_degrades_to_an_offline_record() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/postcodes/EC1A1BB")
        .with_status(500)
        .create_async()
        .await;
    let enricher = enricher(&server.url());

    assert!(matches!(
        enricher.try_lookup("EC1A 1BB").await,
        Err(LookupError::Unavailable(_))
    ));

    let record = enricher.lookup("EC1A 1BB").await;
    assert_eq!(record.postcode, "EC1A1BB");
    assert_eq!(record.outward_code, "EC1A");
    assert_eq!(record.dno_id, "UKPN_LPN");
    assert!(record.region_name.is_empty());
    assert_eq!(record.latitude, 0.0);
    assert_eq!(record.longitude, 0.0);
}

#[tokio::test]
async fn malformed_body_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/postcodes/M11AE")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let result = enricher(&server.url()).try_lookup("M1 1AE").await;
    assert!(matches!(result, Err(LookupError::Unavailable(_))));
}

#[tokio::test]
async fn missing_region_falls_back_to_country() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/postcodes/EH11YZ")
        .with_status(200)
        .with_body(r#"{"status": 200, "result": {"outcode": "EH1", "latitude": 55.95, "longitude": -3.19, "region": null, "country": "Scotland"}}"#)
        .create_async()
        .await;

    let record = enricher(&server.url()).try_lookup("EH1 1YZ").await.unwrap();
    assert_eq!(record.region_name, "Scotland");
    assert_eq!(record.region_code, "");
    assert_eq!(record.outward_code, "EH1");
}

#[tokio::test]
async fn empty_postcode_never_reaches_the_service() {
    let server = mockito::Server::new_async().await;
    let result = enricher(&server.url()).try_lookup("   ").await;
    assert!(matches!(result, Err(LookupError::NotFound(_))));
}
