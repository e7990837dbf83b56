//! HTTP client for a postcodes.io-compatible lookup service.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum LookupError {
    /// The service does not know the postcode
    #[error("postcode '{0}' not found")]
    NotFound(String),

    /// The service could not be reached or answered with something unusable
    #[error("postcode lookup unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    result: Option<PostcodeResult>,
}

/// The subset of a postcodes.io result the enricher uses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostcodeResult {
    #[serde(default)]
    pub outcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub codes: Option<PostcodeCodes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostcodeCodes {
    #[serde(default)]
    pub admin_district: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostcodeClient {
    client: reqwest::Client,
    base_url: Url,
}

impl PostcodeClient {
    /// Create a client for `base_url`, e.g. `https://api.postcodes.io/`
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Unavailable`] when the URL does not parse or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LookupError::Unavailable(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::Unavailable(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn postcode_url(&self, postcode: &str) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base() was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("postcodes").push(postcode);
        }
        url
    }

    /// GET `{base}/postcodes/{postcode}`
    ///
    /// # Errors
    ///
    /// [`LookupError::NotFound`] for a 404 or an empty result,
    /// [`LookupError::Unavailable`] for transport failures, other non-success
    /// statuses and malformed bodies.
    pub async fn fetch(&self, postcode: &str) -> Result<PostcodeResult, LookupError> {
        let url = self.postcode_url(postcode);
        debug!("Looking up postcode at {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(postcode.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!("HTTP {status}")));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Unavailable(format!("malformed response: {e}")))?;
        body.result
            .ok_or_else(|| LookupError::NotFound(postcode.to_string()))
    }
}
