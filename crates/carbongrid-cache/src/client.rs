//! Electricity Maps API client.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Production endpoint of the emissions service.
pub const DEFAULT_BASE_URL: &str = "https://api.electricitymap.org";

/// Per-zone request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A single zone request failed. All variants are absorbed within a
/// poll cycle; the zone is skipped and retried next cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: StatusCode },

    #[error("zone {zone}: response missing carbonIntensity")]
    MissingIntensity { zone: String },
}

/// One successful reading from `/v3/carbon-intensity/latest`.
///
/// Fields beyond the intensity pass through to the snapshot record
/// unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneReading {
    #[serde(rename = "carbonIntensity")]
    pub carbon_intensity: Option<f64>,
    pub datetime: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "emissionFactorType")]
    pub emission_factor_type: Option<String>,
    #[serde(rename = "isEstimated", default)]
    pub is_estimated: bool,
    #[serde(rename = "estimationMethod")]
    pub estimation_method: Option<String>,
}

/// Authenticated HTTP client for the emissions service.
pub struct EmissionsClient {
    http: Client,
    base_url: String,
    api_token: String,
}

impl EmissionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            api_token: api_token.into(),
        })
    }

    /// Latest carbon intensity for a zone. A payload without a
    /// `carbonIntensity` field is a per-zone schema failure; a reported
    /// zero is written as-is and left to reader-side fallback.
    pub async fn latest(&self, zone: &str) -> Result<ZoneReading, FetchError> {
        let url = format!("{}/v3/carbon-intensity/latest", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("zone", zone)])
            .header("auth-token", &self.api_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                endpoint: format!("carbon-intensity/latest?zone={zone}"),
                status: response.status(),
            });
        }

        let reading: ZoneReading = response.json().await?;
        if reading.carbon_intensity.is_none() {
            return Err(FetchError::MissingIntensity {
                zone: zone.to_string(),
            });
        }
        Ok(reading)
    }

    /// Available zone codes, used to log a helpful sample when every
    /// configured zone keeps failing.
    pub async fn list_zones(&self) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/v3/zones", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("auth-token", &self.api_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                endpoint: "zones".to_string(),
                status: response.status(),
            });
        }

        let zones: BTreeMap<String, serde_json::Value> = response.json().await?;
        Ok(zones.into_keys().collect())
    }
}
