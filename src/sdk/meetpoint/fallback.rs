use crate::sdk::geo::GeoPoint;
use crate::sdk::routing::error::MeetpointError;

pub const MEDIAN_MAX_ITERATIONS: usize = 80;
/// Convergence threshold on the update step, in degrees.
pub const MEDIAN_TOLERANCE: f64 = 1e-6;
const COINCIDENT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianEstimate {
    pub point: GeoPoint,
    pub iterations: usize,
}

/// Geometric median of the points by Weiszfeld's iteration, treating
/// longitude/latitude as planar coordinates.
///
/// Starts from the arithmetic mean. A point sitting on the current estimate
/// contributes with weight 1 instead of 1/0.
pub fn geometric_median(points: &[GeoPoint]) -> Result<MedianEstimate, MeetpointError> {
    match points {
        [] => Err(MeetpointError::InvalidInput(
            "geometric median requires at least one point".to_string(),
        )),
        [only] => Ok(MedianEstimate {
            point: *only,
            iterations: 0,
        }),
        _ => Ok(weiszfeld(points)),
    }
}

fn weiszfeld(points: &[GeoPoint]) -> MedianEstimate {
    let n = points.len() as f64;
    let mut current = GeoPoint::new(
        points.iter().map(|p| p.lon).sum::<f64>() / n,
        points.iter().map(|p| p.lat).sum::<f64>() / n,
    );

    let mut iterations = 0;
    while iterations < MEDIAN_MAX_ITERATIONS {
        iterations += 1;

        let (mut num_lon, mut num_lat, mut denom) = (0.0, 0.0, 0.0);
        for p in points {
            let distance = (current.lon - p.lon).hypot(current.lat - p.lat);
            let weight = if distance < COINCIDENT_EPSILON {
                1.0
            } else {
                1.0 / distance
            };
            num_lon += p.lon * weight;
            num_lat += p.lat * weight;
            denom += weight;
        }
        if denom == 0.0 {
            break;
        }

        let next = GeoPoint::new(num_lon / denom, num_lat / denom);
        let step = (next.lon - current.lon).hypot(next.lat - current.lat);
        current = next;
        if step < MEDIAN_TOLERANCE {
            break;
        }
    }

    MedianEstimate {
        point: current,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_point_is_returned_unchanged() {
        let p = GeoPoint::new(37.123456789, 55.987654321);
        let est = geometric_median(&[p]).unwrap();
        assert_eq!(est.point, p);
        assert_eq!(est.iterations, 0);
    }

    #[test]
    fn test_coincident_points_converge_in_one_iteration() {
        let origin = GeoPoint::new(0.0, 0.0);
        let est = geometric_median(&[origin, origin, origin]).unwrap();
        assert_eq!(est.point, origin);
        assert_eq!(est.iterations, 1);
    }

    #[test]
    fn test_median_resists_outlier() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(10.0, 10.0),
        ];
        let est = geometric_median(&points).unwrap();
        // the mean would be (2.5, 2.5); the median stays on the cluster
        assert!(est.point.lon.abs() < 1e-3 && est.point.lat.abs() < 1e-3, "{:?}", est);
    }

    #[test]
    fn test_square_median_is_center() {
        let points = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(2.0, 0.0),
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(0.0, 2.0),
        ];
        let est = geometric_median(&points).unwrap();
        assert!((est.point.lon - 1.0).abs() < 1e-9);
        assert!((est.point.lat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(geometric_median(&[]).is_err());
    }
}
