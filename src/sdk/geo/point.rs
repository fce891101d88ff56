use geo::{Distance, Haversine};
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::sdk::routing::error::MeetpointError;

/// A WGS84 position. Internally always (longitude, latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// The `{lat, lng}` shape used at the request/response boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Converts a boundary `{lat, lng}` pair, rejecting non-finite or
    /// out-of-range values.
    pub fn from_lat_lng(lat: f64, lng: f64) -> Result<Self, MeetpointError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(MeetpointError::InvalidInput(format!(
                "coordinate is not a finite number: lat={}, lng={}",
                lat, lng
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(MeetpointError::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(MeetpointError::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                lng
            )));
        }
        Ok(Self { lon: lng, lat })
    }

    pub fn to_lat_lng(self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lon,
        }
    }

    /// Great-circle distance in metres.
    pub fn haversine_m(&self, other: &GeoPoint) -> f64 {
        Haversine.distance(Point::from(*self), Point::from(*other))
    }

    pub fn offset(&self, d_lon: f64, d_lat: f64) -> Self {
        Self::new(self.lon + d_lon, self.lat + d_lat)
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.lon, p.lat)
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(p: Point<f64>) -> Self {
        GeoPoint::new(p.x(), p.y())
    }
}

impl TryFrom<LatLng> for GeoPoint {
    type Error = MeetpointError;

    fn try_from(value: LatLng) -> Result<Self, Self::Error> {
        GeoPoint::from_lat_lng(value.lat, value.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_boundary_swaps_axes() {
        let p = GeoPoint::from_lat_lng(55.75, 37.61).unwrap();
        assert_eq!(p.lon, 37.61);
        assert_eq!(p.lat, 55.75);

        let back = p.to_lat_lng();
        assert_eq!(back, LatLng { lat: 55.75, lng: 37.61 });

        let geo: Point<f64> = p.into();
        assert_eq!(geo.x(), 37.61);
        assert_eq!(geo.y(), 55.75);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        // a (lng, lat) pair passed in the wrong order is caught when lng > 90
        assert!(GeoPoint::from_lat_lng(120.0, 45.0).is_err());
        assert!(GeoPoint::from_lat_lng(45.0, 190.0).is_err());
        assert!(GeoPoint::from_lat_lng(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::try_from(LatLng { lat: 0.0, lng: f64::INFINITY }).is_err());
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        let d = a.haversine_m(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }
}
