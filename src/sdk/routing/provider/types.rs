use serde::{Deserialize, Serialize};

use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::matrix::{DurationMatrix, UNREACHABLE};

// --- OpenRouteService matrix ---

#[derive(Serialize)]
pub struct OrsMatrixRequest {
    pub locations: Vec<[f64; 2]>,
    pub sources: Vec<usize>,
    pub destinations: Vec<usize>,
    pub metrics: [&'static str; 1],
}

#[derive(Deserialize)]
pub struct OrsMatrixResponse {
    pub durations: Option<Vec<Vec<Option<f64>>>>,
}

impl OrsMatrixResponse {
    /// `null` cells are routes ORS could not find.
    pub fn into_durations(self, rows: usize, cols: usize) -> Result<DurationMatrix, RoutingError> {
        let durations = self.durations.ok_or_else(|| {
            RoutingError::MalformedResponse("ORS response has no 'durations' field".to_string())
        })?;
        if durations.len() != rows {
            return Err(RoutingError::MalformedResponse(format!(
                "ORS returned {} duration rows, expected {}",
                durations.len(),
                rows
            )));
        }
        DurationMatrix::from_rows(
            durations
                .into_iter()
                .map(|row| row.into_iter().map(|d| d.unwrap_or(UNREACHABLE)).collect())
                .collect(),
        )
        .and_then(|m| {
            if m.cols() == cols || rows == 0 {
                Ok(m)
            } else {
                Err(RoutingError::MalformedResponse(format!(
                    "ORS returned {} duration columns, expected {}",
                    m.cols(),
                    cols
                )))
            }
        })
    }
}

// --- 2GIS distance matrix ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DgisPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize)]
pub struct DgisMatrixRequest {
    pub points: Vec<DgisPoint>,
    pub sources: Vec<usize>,
    pub targets: Vec<usize>,
    pub transport: &'static str,
}

#[derive(Deserialize)]
pub struct DgisMatrixResponse {
    #[serde(default)]
    pub routes: Vec<DgisRoute>,
}

#[derive(Deserialize)]
pub struct DgisRoute {
    pub source_id: usize,
    /// Index into the request's `points`, i.e. offset by the source count.
    pub target_id: usize,
    pub status: Option<String>,
    pub duration: Option<f64>,
}

impl DgisMatrixResponse {
    /// Only `status == "OK"` routes carry a usable duration; everything the
    /// response leaves out stays unreachable.
    pub fn into_durations(self, rows: usize, cols: usize) -> Result<DurationMatrix, RoutingError> {
        let mut matrix = DurationMatrix::unreachable(rows, cols);
        for route in self.routes {
            if route.status.as_deref() != Some("OK") {
                continue;
            }
            let Some(duration) = route.duration else {
                continue;
            };
            let target = route.target_id.checked_sub(rows);
            match target {
                Some(t) if route.source_id < rows && t < cols => {
                    matrix.set(route.source_id, t, duration)
                }
                _ => {
                    return Err(RoutingError::MalformedResponse(format!(
                        "2GIS route ({}, {}) is outside a {}x{} request",
                        route.source_id, route.target_id, rows, cols
                    )))
                }
            }
        }
        Ok(matrix)
    }
}
