use serde::{Deserialize, Serialize};
use std::fmt;

/// Travel-time semantics requested from a routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportProfile {
    Walking,
    Cycling,
    Driving,
    HeavyVehicle,
}

impl TransportProfile {
    /// Maps a free-form transport mode. Unknown or missing modes drive.
    pub fn from_mode(mode: Option<&str>) -> Self {
        let Some(mode) = mode.map(str::trim).filter(|m| !m.is_empty()) else {
            return TransportProfile::Driving;
        };
        match mode.to_ascii_lowercase().as_str() {
            "walking" | "pedestrian" | "foot" | "foot-walking" => TransportProfile::Walking,
            "bicycle" | "bike" | "cycling" | "scooter" | "cycling-regular" => {
                TransportProfile::Cycling
            }
            "truck" | "hgv" | "driving-hgv" => TransportProfile::HeavyVehicle,
            "car" | "driving" | "taxi" | "public_transport" | "motorcycle" | "emergency"
            | "driving-car" => TransportProfile::Driving,
            other => {
                log::debug!("Unknown transport mode '{}', using driving", other);
                TransportProfile::Driving
            }
        }
    }

    /// Profile path segment of the OpenRouteService API.
    pub fn ors_name(&self) -> &'static str {
        match self {
            TransportProfile::Walking => "foot-walking",
            TransportProfile::Cycling => "cycling-regular",
            TransportProfile::Driving => "driving-car",
            TransportProfile::HeavyVehicle => "driving-hgv",
        }
    }

    /// `transport` value of the 2GIS routing API.
    pub fn dgis_name(&self) -> &'static str {
        match self {
            TransportProfile::Walking => "walking",
            TransportProfile::Cycling => "bicycle",
            TransportProfile::Driving => "driving",
            TransportProfile::HeavyVehicle => "truck",
        }
    }
}

impl fmt::Display for TransportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ors_name())
    }
}
