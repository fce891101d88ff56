use super::fallback::geometric_median;
use super::optimizer::{select_best, Selection};
use super::result::{
    MeetpointMetadata, MeetpointRequest, MeetpointResult, Provenance, ValidatedRequest,
};
use crate::sdk::geo::{
    build_local_search_area, build_search_area, generate_candidates, CandidateSet, GeoPoint,
    SearchArea, MAX_MATRIX_CELLS,
};
use crate::sdk::routing::client::TravelTimeMatrixClient;
use crate::sdk::routing::error::MeetpointError;
use crate::sdk::routing::matrix::{DurationMatrix, DurationVector};
use crate::sdk::transit::TransitSnap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Upper bound on people x candidates per stage.
    pub cell_budget: usize,
    /// Propagate provider failures instead of falling back to the median.
    pub strict: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cell_budget: MAX_MATRIX_CELLS,
            strict: false,
        }
    }
}

/// Everything one grid pass produced.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub candidates: CandidateSet,
    pub matrix: DurationMatrix,
    pub destination: Option<DurationVector>,
    pub selection: Selection,
}

impl StageOutcome {
    pub fn best_point(&self) -> GeoPoint {
        self.candidates.points[self.selection.index]
    }
}

#[derive(Debug, Clone)]
pub struct RefinedSearch {
    pub provider: &'static str,
    pub coarse: StageOutcome,
    pub fine: StageOutcome,
}

/// Runs the meet-point search: coarse grid, local refinement, provider
/// failover, median fallback and transit snap.
pub struct MeetpointService {
    clients: Vec<TravelTimeMatrixClient>,
    unavailable: Vec<String>,
    snap: Option<TransitSnap>,
    options: PipelineOptions,
}

impl MeetpointService {
    /// `clients` are tried in order until one completes the search.
    pub fn new(clients: Vec<TravelTimeMatrixClient>, options: PipelineOptions) -> Self {
        Self {
            clients,
            unavailable: Vec::new(),
            snap: None,
            options,
        }
    }

    /// Reasons providers were left out at startup, reported if the search
    /// has to fall back because nothing was available.
    pub fn with_unavailable(mut self, reasons: Vec<String>) -> Self {
        self.unavailable = reasons;
        self
    }

    pub fn with_snap(mut self, snap: TransitSnap) -> Self {
        self.snap = Some(snap);
        self
    }

    pub fn compute_best_meetpoint(
        &self,
        request: &MeetpointRequest,
    ) -> Result<MeetpointResult, MeetpointError> {
        let validated = request.validate()?;
        self.compute(&validated)
    }

    pub fn compute(&self, request: &ValidatedRequest) -> Result<MeetpointResult, MeetpointError> {
        let mut result = match self.routed_search(request) {
            Ok(search) => routed_result(request, &search),
            Err(MeetpointError::ProviderUnavailable(reason)) if !self.options.strict => {
                log::warn!("Routed search unavailable, using geometric median: {}", reason);
                median_result(request, reason)?
            }
            Err(e) => return Err(e),
        };

        if let Some(snap) = &self.snap {
            let outcome = snap.snap(result.geo_point());
            result.point = outcome.point.to_lat_lng();
            result.metadata.transit_stop = outcome.stop;
        }

        log::info!(
            "Meet point ({:?}) at lat={:.6}, lng={:.6}",
            result.metadata.provenance,
            result.point.lat,
            result.point.lng
        );
        Ok(result)
    }

    /// Tries each provider in turn. Rate-limit and input errors stop the
    /// chain; only provider failures move on to the next one.
    pub fn routed_search(&self, request: &ValidatedRequest) -> Result<RefinedSearch, MeetpointError> {
        if self.clients.is_empty() {
            let reason = if self.unavailable.is_empty() {
                "no travel-time provider configured".to_string()
            } else {
                self.unavailable.join("; ")
            };
            return Err(MeetpointError::ProviderUnavailable(reason));
        }

        let mut failures = Vec::new();
        for client in &self.clients {
            match self.two_stage(client, request) {
                Ok(search) => return Ok(search),
                Err(MeetpointError::ProviderUnavailable(reason)) => {
                    log::warn!("[{}] provider failed: {}", client.provider_name(), reason);
                    failures.push(format!("{}: {}", client.provider_name(), reason));
                }
                Err(e) => return Err(e),
            }
        }
        Err(MeetpointError::ProviderUnavailable(failures.join("; ")))
    }

    /// Coarse pass over the whole area, then a denser pass around its winner.
    pub fn two_stage(
        &self,
        client: &TravelTimeMatrixClient,
        request: &ValidatedRequest,
    ) -> Result<RefinedSearch, MeetpointError> {
        let area = build_search_area(&request.people)?;
        let coarse = self.run_stage(client, &area, request)?;
        log::info!(
            "[{}] Coarse stage: {} candidates, best #{} (cost {:.0} s)",
            client.provider_name(),
            coarse.candidates.len(),
            coarse.selection.index,
            coarse.selection.cost
        );

        let local = build_local_search_area(coarse.best_point(), coarse.candidates.step)?;
        let fine = self.run_stage(client, &local, request)?;
        log::info!(
            "[{}] Refined stage: {} candidates, best #{} (cost {:.0} s)",
            client.provider_name(),
            fine.candidates.len(),
            fine.selection.index,
            fine.selection.cost
        );

        Ok(RefinedSearch {
            provider: client.provider_name(),
            coarse,
            fine,
        })
    }

    fn run_stage(
        &self,
        client: &TravelTimeMatrixClient,
        area: &SearchArea,
        request: &ValidatedRequest,
    ) -> Result<StageOutcome, MeetpointError> {
        let candidates = generate_candidates(area, request.people.len(), self.options.cell_budget)?;
        let matrix = client.duration_matrix(&request.people, &request.profiles, &candidates.points)?;
        let destination = match request.destination {
            Some((point, profile)) => {
                Some(client.destination_vector(&candidates.points, point, profile)?)
            }
            None => None,
        };
        let selection = select_best(&matrix, destination.as_ref(), request.criterion)?;
        if selection.all_unreachable() {
            log::warn!(
                "[{}] No candidate is reachable by everyone; keeping candidate #{}",
                client.provider_name(),
                selection.index
            );
        }

        Ok(StageOutcome {
            candidates,
            matrix,
            destination,
            selection,
        })
    }
}

fn routed_result(request: &ValidatedRequest, search: &RefinedSearch) -> MeetpointResult {
    let fine = &search.fine;
    MeetpointResult {
        point: fine.best_point().to_lat_lng(),
        metadata: MeetpointMetadata {
            provenance: Provenance::RoutedOptimum,
            provider: Some(search.provider.to_string()),
            participant_count: request.people.len(),
            criterion: request.criterion,
            candidate_count: fine.candidates.len(),
            coarse_candidate_count: search.coarse.candidates.len(),
            grid_step: Some(fine.candidates.step),
            destination_included: request.destination.is_some(),
            destination_seconds: fine
                .destination
                .as_ref()
                .map(|v| v.get(fine.selection.index))
                .filter(|s| s.is_finite()),
            best_cost: Some(fine.selection.cost).filter(|c| c.is_finite()),
            all_unreachable: fine.selection.all_unreachable(),
            fallback_reason: None,
            median_iterations: None,
            transit_stop: None,
        },
    }
}

fn median_result(request: &ValidatedRequest, reason: String) -> Result<MeetpointResult, MeetpointError> {
    let estimate = geometric_median(&request.people)?;
    Ok(MeetpointResult {
        point: estimate.point.to_lat_lng(),
        metadata: MeetpointMetadata {
            provenance: Provenance::GeometricMedianFallback,
            provider: None,
            participant_count: request.people.len(),
            criterion: request.criterion,
            candidate_count: 0,
            coarse_candidate_count: 0,
            grid_step: None,
            destination_included: request.destination.is_some(),
            destination_seconds: None,
            best_cost: None,
            all_unreachable: false,
            fallback_reason: Some(reason),
            median_iterations: Some(estimate.iterations),
            transit_stop: None,
        },
    })
}
