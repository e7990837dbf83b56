//! Postcode enrichment: region, coordinates and network operator.

pub mod client;
pub mod operators;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use client::{LookupError, PostcodeClient, PostcodeResult};
pub use operators::operator_for;

use crate::config::ScrapeConfig;
use crate::error::ErrorKind;

/// Where a scrape was run for. Produced once per run and shared read-only by
/// every record extracted in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Uppercase, no whitespace
    pub postcode: String,
    pub outward_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region_name: String,
    /// Administrative district code, e.g. `E09000033`
    pub region_code: String,
    pub country: String,
    pub dno_id: String,
    pub dno_name: String,
}

impl LocationRecord {
    /// Record built without the remote service: normalised postcode, locally
    /// derived outward code and the prefix-table operator
    #[must_use]
    pub fn offline(postcode: &str) -> Self {
        let postcode = normalize_postcode(postcode);
        let outward_code = outward_code(&postcode);
        let (dno_id, dno_name) = operator_for(&outward_code);
        Self {
            postcode,
            outward_code,
            dno_id: dno_id.to_string(),
            dno_name: dno_name.to_string(),
            ..Self::default()
        }
    }
}

/// Uppercase with all whitespace removed
#[must_use]
pub fn normalize_postcode(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A normalised postcode minus its three-character inward code
#[must_use]
pub fn outward_code(normalized: &str) -> String {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() > 3 {
        chars[..chars.len() - 3].iter().collect()
    } else {
        normalized.to_string()
    }
}

pub struct LocationEnricher {
    client: PostcodeClient,
}

impl LocationEnricher {
    #[must_use]
    pub fn new(client: PostcodeClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns [`LookupError::Unavailable`] when the configured lookup URL is unusable.
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, LookupError> {
        PostcodeClient::new(config.lookup_base_url(), config.lookup_timeout()).map(Self::new)
    }

    /// Strict lookup
    ///
    /// # Errors
    ///
    /// [`LookupError::NotFound`] for unknown or empty postcodes,
    /// [`LookupError::Unavailable`] when the service cannot answer.
    pub async fn try_lookup(&self, postcode: &str) -> Result<LocationRecord, LookupError> {
        let normalized = normalize_postcode(postcode);
        if normalized.is_empty() {
            return Err(LookupError::NotFound(postcode.to_string()));
        }

        let result = self.client.fetch(&normalized).await?;

        let outward = result
            .outcode
            .clone()
            .filter(|code| !code.is_empty())
            .map(|code| normalize_postcode(&code))
            .unwrap_or_else(|| outward_code(&normalized));
        let (dno_id, dno_name) = operator_for(&outward);
        let country = result.country.clone().unwrap_or_default();

        Ok(LocationRecord {
            postcode: normalized,
            outward_code: outward,
            latitude: result.latitude.unwrap_or(0.0),
            longitude: result.longitude.unwrap_or(0.0),
            region_name: result.region.clone().unwrap_or_else(|| country.clone()),
            region_code: result
                .codes
                .and_then(|codes| codes.admin_district)
                .unwrap_or_default(),
            country,
            dno_id: dno_id.to_string(),
            dno_name: dno_name.to_string(),
        })
    }

    /// Best-effort lookup; a failed remote lookup degrades to
    /// [`LocationRecord::offline`]
    pub async fn lookup(&self, postcode: &str) -> LocationRecord {
        match self.try_lookup(postcode).await {
            Ok(record) => {
                info!(
                    "Located {} in {} ({})",
                    record.postcode, record.region_name, record.dno_id
                );
                record
            }
            Err(e) => {
                warn!("{}: {e}, using offline location", ErrorKind::LookupUnavailable);
                LocationRecord::offline(postcode)
            }
        }
    }
}
