use super::types::{OrsMatrixRequest, OrsMatrixResponse};
use crate::sdk::geo::GeoPoint;
use crate::sdk::routing::batch::BatchLimits;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::matrix::DurationMatrix;
use crate::sdk::routing::profile::TransportProfile;
use crate::sdk::routing::service::MatrixProvider;
use reqwest::blocking::Client;
use std::time::Duration;

pub const ORS_BASE_URL: &str = "https://api.openrouteservice.org";

/// Public ORS plans cap a matrix call at 3500 source x destination routes.
pub const ORS_MAX_PAIRS: usize = 3500;

/// OpenRouteService `/v2/matrix`, hosted or self-hosted.
pub struct OrsMatrixProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OrsMatrixProvider {
    pub fn new(api_key: Option<String>, base_url: String, timeout: Duration) -> Result<Self, RoutingError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl MatrixProvider for OrsMatrixProvider {
    fn name(&self) -> &'static str {
        "openrouteservice"
    }

    fn limits(&self) -> BatchLimits {
        BatchLimits::pairs(ORS_MAX_PAIRS)
    }

    fn matrix(
        &self,
        sources: &[GeoPoint],
        targets: &[GeoPoint],
        profile: TransportProfile,
    ) -> Result<DurationMatrix, RoutingError> {
        if !self.limits().admits(sources.len(), targets.len()) {
            return Err(RoutingError::BatchLimit(format!(
                "{}x{} exceeds {} pairs",
                sources.len(),
                targets.len(),
                ORS_MAX_PAIRS
            )));
        }

        let url = format!("{}/v2/matrix/{}", self.base_url, profile.ors_name());
        let body = OrsMatrixRequest {
            locations: sources
                .iter()
                .chain(targets.iter())
                .map(|p| [p.lon, p.lat])
                .collect(),
            sources: (0..sources.len()).collect(),
            destinations: (sources.len()..sources.len() + targets.len()).collect(),
            metrics: ["duration"],
        };
        log::debug!(
            "[PROVIDER] Calling ORS matrix {} for {}x{}",
            profile,
            sources.len(),
            targets.len()
        );

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", key);
        }
        let response = match request.send() {
            Ok(resp) => resp,
            Err(e) => {
                log::error!("Failed to send POST request. URL: {}\nError: {}", url, e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RoutingError::from_response(status.as_u16(), &text));
        }

        let parsed: OrsMatrixResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse OrsMatrixResponse. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })?;
        parsed.into_durations(sources.len(), targets.len())
    }
}
