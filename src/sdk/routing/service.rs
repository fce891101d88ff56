use super::batch::BatchLimits;
use super::error::RoutingError;
use super::matrix::DurationMatrix;
use super::profile::TransportProfile;
use crate::sdk::geo::GeoPoint;

/// One routing vendor's travel-time matrix endpoint.
///
/// Implementations issue exactly one network call per invocation and never
/// split requests themselves; batching and quota checks belong to
/// [`TravelTimeMatrixClient`](super::client::TravelTimeMatrixClient).
pub trait MatrixProvider: Send + Sync {
    /// Short vendor tag used in logs and result metadata.
    fn name(&self) -> &'static str;

    /// Largest request shape accepted in a single call.
    fn limits(&self) -> BatchLimits;

    /// Durations in seconds for every (source, target) pair, shaped
    /// `sources.len() x targets.len()`. Pairs the vendor could not route are
    /// left unreachable.
    fn matrix(
        &self,
        sources: &[GeoPoint],
        targets: &[GeoPoint],
        profile: TransportProfile,
    ) -> Result<DurationMatrix, RoutingError>;
}
