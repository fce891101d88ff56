use super::{StopCategory, TransitStop, TransitStopLookup};
use crate::sdk::geo::GeoPoint;

/// Shift applied when no stop is found, in degrees on both axes.
pub const SNAP_PLACEHOLDER_OFFSET_DEG: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct SnapOutcome {
    pub point: GeoPoint,
    pub stop: Option<TransitStop>,
}

/// Moves a computed meeting point onto the nearest transit stop, rail first.
pub struct TransitSnap {
    rail: Option<Box<dyn TransitStopLookup>>,
    surface: Box<dyn TransitStopLookup>,
    radius_m: f64,
}

impl TransitSnap {
    pub fn new(
        rail: Box<dyn TransitStopLookup>,
        surface: Box<dyn TransitStopLookup>,
        radius_m: f64,
    ) -> Self {
        Self {
            rail: Some(rail),
            surface,
            radius_m,
        }
    }

    /// Snap without a rail directory, e.g. when no catalog key is configured.
    pub fn surface_only(surface: Box<dyn TransitStopLookup>, radius_m: f64) -> Self {
        Self {
            rail: None,
            surface,
            radius_m,
        }
    }

    pub fn snap(&self, raw: GeoPoint) -> SnapOutcome {
        for lookup in self.rail.iter().chain(std::iter::once(&self.surface)) {
            if let Some(stop) = self.nearest(lookup.as_ref(), raw) {
                log::info!(
                    "Snapped meet point to {:?} stop '{}' ({:.0} m away)",
                    stop.category,
                    stop.name,
                    stop.distance_m
                );
                return SnapOutcome {
                    point: stop.point,
                    stop: Some(stop),
                };
            }
        }

        log::info!("No transit stop within {:.0} m, using offset placeholder", self.radius_m);
        SnapOutcome {
            point: raw.offset(SNAP_PLACEHOLDER_OFFSET_DEG, SNAP_PLACEHOLDER_OFFSET_DEG),
            stop: None,
        }
    }

    fn nearest(&self, lookup: &dyn TransitStopLookup, raw: GeoPoint) -> Option<TransitStop> {
        match lookup.find_stops(raw, self.radius_m) {
            Ok(stops) => stops
                .into_iter()
                .map(|mut s| {
                    s.distance_m = raw.haversine_m(&s.point);
                    s
                })
                .filter(|s| s.distance_m <= self.radius_m)
                .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m)),
            Err(e) => {
                let kind = match lookup.category() {
                    StopCategory::Rail => "rail",
                    StopCategory::Surface => "surface",
                };
                log::warn!("{} stop lookup failed, treating as no stops: {}", kind, e);
                None
            }
        }
    }
}
