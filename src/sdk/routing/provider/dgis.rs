use super::types::{DgisMatrixRequest, DgisMatrixResponse, DgisPoint};
use crate::sdk::geo::GeoPoint;
use crate::sdk::routing::batch::BatchLimits;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::matrix::DurationMatrix;
use crate::sdk::routing::profile::TransportProfile;
use crate::sdk::routing::service::MatrixProvider;
use reqwest::blocking::Client;
use std::time::Duration;

pub const DGIS_MATRIX_URL: &str = "https://routing.api.2gis.com/get_dist_matrix";

/// Synchronous 2GIS matrix requests are limited to 10 x 10 points.
pub const DGIS_LIMITS: BatchLimits = BatchLimits {
    max_sources: 10,
    max_targets: 10,
    max_pairs: 100,
};

impl From<GeoPoint> for DgisPoint {
    fn from(p: GeoPoint) -> Self {
        DgisPoint { lat: p.lat, lon: p.lon }
    }
}

/// 2GIS distance-matrix API.
pub struct DgisMatrixProvider {
    client: Client,
    api_key: String,
    url: String,
}

impl DgisMatrixProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, RoutingError> {
        if api_key.trim().is_empty() {
            return Err(RoutingError::MissingCredentials(
                "GIS2_API_KEY is not configured".to_string(),
            ));
        }
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            url: DGIS_MATRIX_URL.to_string(),
        })
    }
}

impl MatrixProvider for DgisMatrixProvider {
    fn name(&self) -> &'static str {
        "2gis"
    }

    fn limits(&self) -> BatchLimits {
        DGIS_LIMITS
    }

    fn matrix(
        &self,
        sources: &[GeoPoint],
        targets: &[GeoPoint],
        profile: TransportProfile,
    ) -> Result<DurationMatrix, RoutingError> {
        if !DGIS_LIMITS.admits(sources.len(), targets.len()) {
            return Err(RoutingError::BatchLimit(format!(
                "{}x{} exceeds 10x10",
                sources.len(),
                targets.len()
            )));
        }

        let body = DgisMatrixRequest {
            points: sources
                .iter()
                .chain(targets.iter())
                .map(|p| DgisPoint::from(*p))
                .collect(),
            sources: (0..sources.len()).collect(),
            targets: (sources.len()..sources.len() + targets.len()).collect(),
            transport: profile.dgis_name(),
        };
        log::debug!(
            "[PROVIDER] Calling 2GIS matrix {} for {}x{}",
            profile.dgis_name(),
            sources.len(),
            targets.len()
        );

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str()), ("version", "2.0")])
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RoutingError::from_response(status.as_u16(), &text));
        }

        let parsed: DgisMatrixResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse DgisMatrixResponse. URL: {}\nError: {}. Body: {}",
                self.url,
                e,
                text
            );
            e
        })?;
        parsed.into_durations(sources.len(), targets.len())
    }
}
