use geo::Contains;
use geo_types::{coord, Point};

use super::area::{GridStep, SearchArea};
use super::point::GeoPoint;
use crate::sdk::routing::error::MeetpointError;

/// Default upper bound on people x candidates per matrix stage.
pub const MAX_MATRIX_CELLS: usize = 3500;

const MIN_STEP_FRACTION: f64 = 0.01;
const MAX_STEP_FRACTION: f64 = 0.2;

/// Grid candidates in column order, plus the spacing that produced them.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub points: Vec<GeoPoint>,
    pub step: GridStep,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Lays a regular grid over `area`, sized so `people_count * candidates`
/// stays within `cell_budget`.
///
/// The step is a fraction of the area's width/height, `sqrt(people / budget)`
/// clipped to `[0.01, 0.2]`. Grid points on the polygon boundary are dropped,
/// which is what keeps the grid inside the budget.
pub fn generate_candidates(
    area: &SearchArea,
    people_count: usize,
    cell_budget: usize,
) -> Result<CandidateSet, MeetpointError> {
    if people_count == 0 {
        return Err(MeetpointError::InvalidInput(
            "candidate generation requires at least one person".to_string(),
        ));
    }
    if cell_budget == 0 {
        return Err(MeetpointError::InvalidInput(
            "matrix cell budget must be positive".to_string(),
        ));
    }

    let bounds = area.bounds();
    let (width, height) = (bounds.width(), bounds.height());

    let max_points = cell_budget as f64 / people_count as f64;
    let fraction = (1.0 / max_points)
        .sqrt()
        .clamp(MIN_STEP_FRACTION, MAX_STEP_FRACTION);
    let step = GridStep {
        x: width * fraction,
        y: height * fraction,
    };
    if step.x <= 0.0 || step.y <= 0.0 {
        return Err(MeetpointError::InvalidInput(
            "search area has zero extent".to_string(),
        ));
    }

    let columns = grid_count(width, step.x);
    let rows = grid_count(height, step.y);

    let mut points = Vec::with_capacity(columns * rows);
    for i in 0..columns {
        let x = bounds.min().x + i as f64 * step.x;
        for j in 0..rows {
            let y = bounds.min().y + j as f64 * step.y;
            let c = coord! { x: x, y: y };
            if area.polygon.contains(&Point::from(c)) {
                points.push(area.frame.unproject(c));
            }
        }
    }

    log::debug!(
        "Generated {} candidates ({}x{} grid, step {:.1} m x {:.1} m) for {} people",
        points.len(),
        columns,
        rows,
        step.x,
        step.y,
        people_count
    );

    Ok(CandidateSet { points, step })
}

/// Number of lattice values in `[0, extent)`; tolerant of `extent / step`
/// landing a hair above an integer.
fn grid_count(extent: f64, step: f64) -> usize {
    ((extent / step) - 1e-9).ceil().max(0.0) as usize
}
