pub mod dgis;
pub mod overpass;
pub mod snap;

use serde::{Serialize, Serializer};

use crate::sdk::geo::GeoPoint;
use crate::sdk::routing::error::RoutingError;

pub use dgis::DgisStationLookup;
pub use overpass::OverpassStopLookup;
pub use snap::{SnapOutcome, TransitSnap, SNAP_PLACEHOLDER_OFFSET_DEG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCategory {
    Rail,
    Surface,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitStop {
    #[serde(serialize_with = "as_lat_lng")]
    pub point: GeoPoint,
    pub name: String,
    pub category: StopCategory,
    /// Great-circle distance from the search center.
    pub distance_m: f64,
}

fn as_lat_lng<S: Serializer>(point: &GeoPoint, serializer: S) -> Result<S::Ok, S::Error> {
    point.to_lat_lng().serialize(serializer)
}

/// A directory of transit stops of one category.
pub trait TransitStopLookup: Send + Sync {
    fn category(&self) -> StopCategory;

    /// Stops within `radius_m` of `center`, nearest first.
    fn find_stops(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<TransitStop>, RoutingError>;
}

/// Keeps stops inside the radius and orders them by distance.
pub(crate) fn nearest_first(mut stops: Vec<TransitStop>, radius_m: f64) -> Vec<TransitStop> {
    stops.retain(|s| s.distance_m <= radius_m);
    stops.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    stops
}
