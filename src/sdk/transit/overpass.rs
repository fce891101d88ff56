use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{nearest_first, StopCategory, TransitStop, TransitStopLookup};
use crate::sdk::geo::GeoPoint;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::util::rate_limit::{wait_for, Pacer};

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

const UNNAMED_STOP: &str = "Остановка";

#[derive(Deserialize, Default)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Deserialize)]
pub struct OverpassElement {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Bus stops from OpenStreetMap via the Overpass API.
pub struct OverpassStopLookup {
    client: Client,
    url: String,
    pacer: Pacer,
}

impl OverpassStopLookup {
    pub fn new(timeout: Duration, pacer: Pacer) -> Result<Self, RoutingError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: OVERPASS_URL.to_string(),
            pacer,
        })
    }
}

fn bus_stop_query(center: GeoPoint, radius_m: f64) -> String {
    let (lat, lon, r) = (center.lat, center.lon, radius_m.round() as i64);
    format!(
        "[out:json][timeout:25];\n(\n  node[\"highway\"=\"bus_stop\"](around:{r},{lat},{lon});\n  node[\"public_transport\"=\"stop_position\"][\"bus\"=\"yes\"](around:{r},{lat},{lon});\n);\nout body;"
    )
}

pub fn stops_from_overpass(
    response: OverpassResponse,
    center: GeoPoint,
    radius_m: f64,
) -> Vec<TransitStop> {
    let stops = response
        .elements
        .into_iter()
        .filter_map(|el| {
            let point = GeoPoint::new(el.lon?, el.lat?);
            Some(TransitStop {
                distance_m: center.haversine_m(&point),
                point,
                name: el
                    .tags
                    .get("name")
                    .cloned()
                    .unwrap_or_else(|| UNNAMED_STOP.to_string()),
                category: StopCategory::Surface,
            })
        })
        .collect();
    nearest_first(stops, radius_m)
}

impl TransitStopLookup for OverpassStopLookup {
    fn category(&self) -> StopCategory {
        StopCategory::Surface
    }

    fn find_stops(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<TransitStop>, RoutingError> {
        wait_for(&self.pacer);
        log::debug!("[TRANSIT] Searching Overpass bus stops near {:?}", center);

        let response = self
            .client
            .post(&self.url)
            .body(bus_stop_query(center, radius_m))
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RoutingError::from_response(status.as_u16(), &text));
        }
        let parsed: OverpassResponse = serde_json::from_str(&text)?;
        Ok(stops_from_overpass(parsed, center, radius_m))
    }
}
