use geo::{Area, BoundingRect, ConvexHull};
use geo_types::{coord, Coord, MultiPoint, Point, Polygon, Rect};
use serde::Serialize;

use super::point::GeoPoint;
use crate::sdk::routing::error::MeetpointError;

/// Mean earth radius, matching the haversine used elsewhere.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Outward margin around the people, in metres.
pub const AREA_BUFFER_M: f64 = 1000.0;

/// Pre-buffer for a lone point or a collinear group, in degrees.
pub const DEGENERATE_BUFFER_DEG: f64 = 0.01;

/// Grid spacing in metres of the local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridStep {
    pub x: f64,
    pub y: f64,
}

impl GridStep {
    pub fn max(&self) -> f64 {
        self.x.max(self.y)
    }
}

/// Equirectangular projection around an origin. Metric and close to
/// conformal within the few tens of kilometres a search area spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    origin: GeoPoint,
    cos_lat: f64,
}

impl LocalFrame {
    pub fn centered_on(origin: GeoPoint) -> Self {
        Self {
            origin,
            cos_lat: origin.lat.to_radians().cos().max(1e-6),
        }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn project(&self, p: GeoPoint) -> Coord<f64> {
        coord! {
            x: EARTH_RADIUS_M * (p.lon - self.origin.lon).to_radians() * self.cos_lat,
            y: EARTH_RADIUS_M * (p.lat - self.origin.lat).to_radians(),
        }
    }

    /// Latitude is clamped to the poles; buffered areas can reach past them.
    pub fn unproject(&self, c: Coord<f64>) -> GeoPoint {
        GeoPoint::new(
            self.origin.lon + (c.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
            (self.origin.lat + (c.y / EARTH_RADIUS_M).to_degrees()).clamp(-90.0, 90.0),
        )
    }
}

/// Rectangular search polygon in a local metric frame.
#[derive(Debug, Clone)]
pub struct SearchArea {
    pub polygon: Polygon<f64>,
    pub frame: LocalFrame,
    /// Grid spacing the area was sized from; set for local (refinement) areas.
    pub step: Option<GridStep>,
}

impl SearchArea {
    pub fn bounds(&self) -> Rect<f64> {
        // every SearchArea polygon is built from a Rect, so it is never empty
        self.polygon
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 }))
    }
}

/// Builds the buffered envelope of the people's convex hull.
pub fn build_search_area(points: &[GeoPoint]) -> Result<SearchArea, MeetpointError> {
    if points.is_empty() {
        return Err(MeetpointError::InvalidInput(
            "search area requires at least one point".to_string(),
        ));
    }

    let n = points.len() as f64;
    let centroid = GeoPoint::new(
        points.iter().map(|p| p.lon).sum::<f64>() / n,
        points.iter().map(|p| p.lat).sum::<f64>() / n,
    );
    let frame = LocalFrame::centered_on(centroid);

    let multi: MultiPoint<f64> = points.iter().map(|p| Point::from(*p)).collect();
    let hull = multi.convex_hull();
    let extent = multi.bounding_rect().ok_or_else(|| {
        MeetpointError::InvalidInput("could not compute extent of input points".to_string())
    })?;

    // A point or a line has no area to envelope; widen it in degrees first.
    let pad = if hull.unsigned_area() == 0.0 {
        DEGENERATE_BUFFER_DEG
    } else {
        0.0
    };
    let min = frame.project(GeoPoint::new(extent.min().x - pad, extent.min().y - pad));
    let max = frame.project(GeoPoint::new(extent.max().x + pad, extent.max().y + pad));

    let rect = Rect::new(
        coord! { x: min.x - AREA_BUFFER_M, y: min.y - AREA_BUFFER_M },
        coord! { x: max.x + AREA_BUFFER_M, y: max.y + AREA_BUFFER_M },
    );
    log::debug!(
        "Search area for {} points: {:.0} m x {:.0} m",
        points.len(),
        rect.width(),
        rect.height()
    );

    Ok(SearchArea {
        polygon: rect.to_polygon(),
        frame,
        step: None,
    })
}

/// Builds the refinement square of half-width `ceil(2 * max(step))` around `center`.
pub fn build_local_search_area(
    center: GeoPoint,
    step: GridStep,
) -> Result<SearchArea, MeetpointError> {
    let reach = step.max();
    if !reach.is_finite() || reach <= 0.0 {
        return Err(MeetpointError::InvalidInput(format!(
            "local search area needs a positive grid step, got ({}, {})",
            step.x, step.y
        )));
    }
    let half = (reach * 2.0).ceil();
    let frame = LocalFrame::centered_on(center);
    let rect = Rect::new(coord! { x: -half, y: -half }, coord! { x: half, y: half });

    Ok(SearchArea {
        polygon: rect.to_polygon(),
        frame,
        step: Some(step),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_near_pole_unprojects_to_valid_latitudes() {
        let people = [GeoPoint::new(10.0, 89.995), GeoPoint::new(10.1, 89.999)];
        let area = build_search_area(&people).unwrap();
        let b = area.bounds();
        for c in [b.min(), b.max()] {
            let p = area.frame.unproject(c);
            assert!(p.lat <= 90.0 && p.lat >= -90.0, "{:?}", p);
        }
        assert_eq!(area.frame.unproject(b.max()).lat, 90.0);

        let south = LocalFrame::centered_on(GeoPoint::new(0.0, -89.99));
        let p = south.unproject(coord! { x: 0.0, y: -5000.0 });
        assert_eq!(p.lat, -90.0);
    }

    fn moscow_people() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(37.802357, 55.668757),
            GeoPoint::new(37.527237, 55.644621),
            GeoPoint::new(37.531429, 55.790507),
            GeoPoint::new(37.700379, 55.903512),
        ]
    }

    fn assert_inside_with_margin(area: &SearchArea, points: &[GeoPoint], margin: f64) {
        let b = area.bounds();
        for p in points {
            let c = area.frame.project(*p);
            assert!(c.x - b.min().x >= margin - 1e-6, "left margin for {:?}", p);
            assert!(b.max().x - c.x >= margin - 1e-6, "right margin for {:?}", p);
            assert!(c.y - b.min().y >= margin - 1e-6, "bottom margin for {:?}", p);
            assert!(b.max().y - c.y >= margin - 1e-6, "top margin for {:?}", p);
        }
    }

    #[test]
    fn test_area_contains_points_with_buffer() {
        let people = moscow_people();
        let area = build_search_area(&people).unwrap();
        assert_inside_with_margin(&area, &people, AREA_BUFFER_M);
        assert!(area.step.is_none());
    }

    #[test]
    fn test_single_point_area_is_padded() {
        let people = vec![GeoPoint::new(30.3, 59.95)];
        let area = build_search_area(&people).unwrap();
        assert_inside_with_margin(&area, &people, AREA_BUFFER_M);
        // 0.01 deg of latitude is ~1.1 km on top of the 1 km buffer
        assert!(area.bounds().height() > 4000.0);
    }

    #[test]
    fn test_collinear_points_area_is_padded() {
        let people = vec![
            GeoPoint::new(10.0, 50.0),
            GeoPoint::new(10.0, 50.05),
            GeoPoint::new(10.0, 50.1),
        ];
        let area = build_search_area(&people).unwrap();
        assert_inside_with_margin(&area, &people, AREA_BUFFER_M);
        assert!(area.bounds().width() > 2.0 * AREA_BUFFER_M);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            build_search_area(&[]),
            Err(MeetpointError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_frame_round_trip_is_stable() {
        let frame = LocalFrame::centered_on(GeoPoint::new(37.6, 55.7));
        let p = GeoPoint::new(37.75, 55.81);
        let back = frame.unproject(frame.project(p));
        assert!((back.lon - p.lon).abs() < 1e-9);
        assert!((back.lat - p.lat).abs() < 1e-9);
    }

    #[test]
    fn test_local_area_spans_twice_the_larger_step() {
        let center = GeoPoint::new(37.6, 55.7);
        let area = build_local_search_area(center, GridStep { x: 480.2, y: 610.7 }).unwrap();
        let b = area.bounds();
        assert_eq!(b.max().x, 1222.0);
        assert_eq!(b.min().y, -1222.0);
        assert_eq!(area.frame.origin(), center);
        assert!(build_local_search_area(center, GridStep { x: 0.0, y: 0.0 }).is_err());
    }
}
