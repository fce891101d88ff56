use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{nearest_first, StopCategory, TransitStop, TransitStopLookup};
use crate::sdk::geo::GeoPoint;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::util::rate_limit::{wait_for, Pacer};

pub const DGIS_CATALOG_URL: &str = "https://catalog.api.2gis.com/3.0/items";

const STATION_TYPES: [&str; 3] = ["station", "station.metro", "station_entrance"];
const NON_STATION_WORDS: [&str; 4] = ["компания", "фирма", "агентство", "тур"];

#[derive(Deserialize, Default)]
pub struct CatalogResponse {
    pub result: Option<CatalogResult>,
}

#[derive(Deserialize, Default)]
pub struct CatalogResult {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

#[derive(Deserialize)]
pub struct CatalogItem {
    pub point: Option<CatalogPoint>,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct CatalogPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Metro stations from the 2GIS catalog. The catalog answers a free-text
/// query, so matches are screened by name and type.
pub struct DgisStationLookup {
    client: Client,
    api_key: String,
    pacer: Pacer,
}

impl DgisStationLookup {
    pub fn new(api_key: String, timeout: Duration, pacer: Pacer) -> Result<Self, RoutingError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            pacer,
        })
    }
}

fn is_station(item: &CatalogItem) -> bool {
    let name = item.name.to_lowercase();
    let looks_like_station = (name.contains("станция") && name.contains("метро"))
        || STATION_TYPES.contains(&item.item_type.as_str());
    let is_business = NON_STATION_WORDS.iter().any(|w| name.contains(w));
    looks_like_station && !is_business
}

/// Converts a catalog answer into stations within `radius_m`, nearest first.
pub fn stations_from_catalog(
    response: CatalogResponse,
    center: GeoPoint,
    radius_m: f64,
) -> Vec<TransitStop> {
    let items = response.result.map(|r| r.items).unwrap_or_default();
    let stops = items
        .into_iter()
        .filter(is_station)
        .filter_map(|item| {
            let p = item.point?;
            let point = GeoPoint::new(p.lon, p.lat);
            Some(TransitStop {
                distance_m: center.haversine_m(&point),
                point,
                name: item.name,
                category: StopCategory::Rail,
            })
        })
        .collect();
    nearest_first(stops, radius_m)
}

impl TransitStopLookup for DgisStationLookup {
    fn category(&self) -> StopCategory {
        StopCategory::Rail
    }

    fn find_stops(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<TransitStop>, RoutingError> {
        wait_for(&self.pacer);
        log::debug!("[TRANSIT] Searching 2GIS metro stations near {:?}", center);

        let location = format!("{},{}", center.lon, center.lat);
        let radius = format!("{}", radius_m.round() as i64);
        let response = self
            .client
            .get(DGIS_CATALOG_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", "станция метро"),
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("page_size", "10"),
                ("fields", "items.point,items.type,items.name"),
                ("sort", "distance"),
                ("search_type", "discovery"),
            ])
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(RoutingError::from_response(status.as_u16(), &text));
        }
        let parsed: CatalogResponse = serde_json::from_str(&text)?;
        Ok(stations_from_catalog(parsed, center, radius_m))
    }
}
