use serde::{Deserialize, Serialize};

use super::optimizer::Criterion;
use crate::sdk::geo::{GeoPoint, GridStep, LatLng};
use crate::sdk::routing::error::MeetpointError;
use crate::sdk::routing::profile::TransportProfile;
use crate::sdk::transit::TransitStop;

/// One traveller as received at the request boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonInput {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, alias = "transport")]
    pub transport_mode: Option<String>,
}

/// The shared place everyone continues to after meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationInput {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, alias = "transport")]
    pub transport_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetpointRequest {
    pub people: Vec<PersonInput>,
    #[serde(default)]
    pub destination: Option<DestinationInput>,
    #[serde(default = "default_criterion")]
    pub criterion: String,
}

fn default_criterion() -> String {
    Criterion::default().to_string()
}

/// A request after boundary validation: points are (lon, lat) from here on.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub people: Vec<GeoPoint>,
    pub profiles: Vec<TransportProfile>,
    pub destination: Option<(GeoPoint, TransportProfile)>,
    pub criterion: Criterion,
}

impl MeetpointRequest {
    /// Checks the criterion first so a bad value fails before any other work.
    pub fn validate(&self) -> Result<ValidatedRequest, MeetpointError> {
        let criterion: Criterion = self.criterion.parse()?;
        if self.people.is_empty() {
            return Err(MeetpointError::InvalidInput(
                "at least one person is required".to_string(),
            ));
        }

        let mut people = Vec::with_capacity(self.people.len());
        let mut profiles = Vec::with_capacity(self.people.len());
        for (i, person) in self.people.iter().enumerate() {
            let point = GeoPoint::from_lat_lng(person.lat, person.lng).map_err(|e| {
                MeetpointError::InvalidInput(format!("person {}: {}", i, e))
            })?;
            people.push(point);
            profiles.push(TransportProfile::from_mode(person.transport_mode.as_deref()));
        }

        let destination = match &self.destination {
            Some(dest) => Some((
                GeoPoint::from_lat_lng(dest.lat, dest.lng)
                    .map_err(|e| MeetpointError::InvalidInput(format!("destination: {}", e)))?,
                TransportProfile::from_mode(dest.transport_mode.as_deref()),
            )),
            None => None,
        };

        Ok(ValidatedRequest {
            people,
            profiles,
            destination,
            criterion,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    RoutedOptimum,
    GeometricMedianFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetpointMetadata {
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub participant_count: usize,
    pub criterion: Criterion,
    pub candidate_count: usize,
    pub coarse_candidate_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_step: Option<GridStep>,
    pub destination_included: bool,
    /// Travel time from the chosen point on to the destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_cost: Option<f64>,
    /// Set when no candidate was reachable by everyone; the point is then
    /// an arbitrary grid candidate.
    pub all_unreachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_stop: Option<TransitStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetpointResult {
    pub point: LatLng,
    pub metadata: MeetpointMetadata,
}

impl MeetpointResult {
    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.point.lng, self.point.lat)
    }
}
