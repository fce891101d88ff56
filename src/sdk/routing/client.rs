use std::collections::BTreeMap;
use std::sync::Arc;

use super::batch::{plan_batches, BatchWindow};
use super::error::RoutingError;
use super::matrix::{DurationMatrix, DurationVector};
use super::profile::TransportProfile;
use super::service::MatrixProvider;
use crate::sdk::geo::GeoPoint;
use crate::sdk::util::rate_limit::Limiter;

/// Builds full duration matrices from a provider that only accepts small
/// requests, under a shared call quota.
pub struct TravelTimeMatrixClient {
    provider: Arc<dyn MatrixProvider>,
    limiter: Limiter,
}

impl TravelTimeMatrixClient {
    pub fn new(provider: Arc<dyn MatrixProvider>, limiter: Limiter) -> Self {
        Self { provider, limiter }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// People x candidates travel times. People sharing a profile are
    /// queried together; rows stay in input order.
    pub fn duration_matrix(
        &self,
        people: &[GeoPoint],
        profiles: &[TransportProfile],
        candidates: &[GeoPoint],
    ) -> Result<DurationMatrix, RoutingError> {
        if people.len() != profiles.len() {
            return Err(RoutingError::MalformedRequest {
                code: 0,
                message: format!(
                    "{} people but {} transport profiles",
                    people.len(),
                    profiles.len()
                ),
            });
        }

        let mut groups: BTreeMap<TransportProfile, Vec<usize>> = BTreeMap::new();
        for (i, profile) in profiles.iter().enumerate() {
            groups.entry(*profile).or_default().push(i);
        }

        let mut durations = DurationMatrix::unreachable(people.len(), candidates.len());
        for (profile, indices) in &groups {
            log::debug!(
                "[{}] Querying {} people with profile {} against {} candidates",
                self.provider.name(),
                indices.len(),
                profile,
                candidates.len()
            );
            let sources: Vec<GeoPoint> = indices.iter().map(|&i| people[i]).collect();
            self.run_query(&sources, candidates, *profile, |window, block| {
                durations.place_block(block, &indices[window.sources.clone()], window.targets.start);
            })?;
        }
        Ok(durations)
    }

    /// Candidates -> destination travel times.
    pub fn destination_vector(
        &self,
        candidates: &[GeoPoint],
        destination: GeoPoint,
        profile: TransportProfile,
    ) -> Result<DurationVector, RoutingError> {
        let mut vector = DurationVector::unreachable(candidates.len());
        self.run_query(candidates, &[destination], profile, |window, block| {
            for (i, global) in window.sources.clone().enumerate() {
                vector.set(global, block.get(i, 0));
            }
        })?;
        Ok(vector)
    }

    /// Issues one call per batch window. A transient failure only loses that
    /// window's cells; the query fails if no window succeeded or on the
    /// first non-transient error.
    fn run_query<F>(
        &self,
        sources: &[GeoPoint],
        targets: &[GeoPoint],
        profile: TransportProfile,
        mut merge: F,
    ) -> Result<(), RoutingError>
    where
        F: FnMut(&BatchWindow, &DurationMatrix),
    {
        let windows = plan_batches(sources.len(), targets.len(), self.provider.limits());
        let total = windows.len();
        let mut succeeded = 0;
        let mut last_error = None;

        for (n, window) in windows.iter().enumerate() {
            self.limiter.acquire()?;
            log::debug!(
                "[{}] Batch {}/{}: sources {:?} x targets {:?} ({})",
                self.provider.name(),
                n + 1,
                total,
                window.sources,
                window.targets,
                profile
            );

            let result = self
                .provider
                .matrix(
                    &sources[window.sources.clone()],
                    &targets[window.targets.clone()],
                    profile,
                )
                .and_then(|block| {
                    if block.rows() == window.sources.len() && block.cols() == window.targets.len() {
                        Ok(block)
                    } else {
                        Err(RoutingError::MalformedResponse(format!(
                            "expected {}x{} durations, got {}x{}",
                            window.sources.len(),
                            window.targets.len(),
                            block.rows(),
                            block.cols()
                        )))
                    }
                });

            match result {
                Ok(block) => {
                    merge(window, &block);
                    succeeded += 1;
                }
                Err(e) if e.is_transient() => {
                    log::warn!(
                        "[{}] Batch {}/{} failed, its cells stay unreachable: {}",
                        self.provider.name(),
                        n + 1,
                        total,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::routing::batch::BatchLimits;
    use crate::sdk::routing::matrix::UNREACHABLE;
    use crate::sdk::util::rate_limit::{QuotaLimits, SlidingWindowLimiter};
    use std::sync::Mutex;

    /// Duration = 1000 * |source index| + |target index| encoded from the
    /// points themselves so merged cells can be checked.
    struct GridProvider {
        limits: BatchLimits,
        calls: Mutex<Vec<(usize, usize, TransportProfile)>>,
        fail_call: Option<usize>,
        fatal: bool,
    }

    impl GridProvider {
        fn new(limits: BatchLimits) -> Self {
            Self {
                limits,
                calls: Mutex::new(Vec::new()),
                fail_call: None,
                fatal: false,
            }
        }
    }

    impl MatrixProvider for GridProvider {
        fn name(&self) -> &'static str {
            "grid"
        }

        fn limits(&self) -> BatchLimits {
            self.limits
        }

        fn matrix(
            &self,
            sources: &[GeoPoint],
            targets: &[GeoPoint],
            profile: TransportProfile,
        ) -> Result<DurationMatrix, RoutingError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((sources.len(), targets.len(), profile));
            if self.fail_call == Some(calls.len()) {
                return Err(if self.fatal {
                    RoutingError::Unauthorized("revoked".into())
                } else {
                    RoutingError::MalformedResponse("timeout".into())
                });
            }
            Ok(DurationMatrix::from_rows(
                sources
                    .iter()
                    .map(|s| targets.iter().map(|t| s.lon * 1000.0 + t.lon).collect())
                    .collect(),
            )
            .unwrap())
        }
    }

    fn points(n: usize) -> Vec<GeoPoint> {
        (0..n).map(|i| GeoPoint::new(i as f64, 0.0)).collect()
    }

    fn unlimited() -> Limiter {
        Arc::new(SlidingWindowLimiter::new(QuotaLimits::unlimited()))
    }

    fn small_limits() -> BatchLimits {
        BatchLimits {
            max_sources: 10,
            max_targets: 10,
            max_pairs: 100,
        }
    }

    #[test]
    fn test_batched_matrix_reassembles_every_cell() {
        let provider = Arc::new(GridProvider::new(small_limits()));
        let client = TravelTimeMatrixClient::new(provider.clone(), unlimited());
        let people = points(25);
        let profiles = vec![TransportProfile::Driving; 25];
        let candidates = points(25);

        let m = client.duration_matrix(&people, &profiles, &candidates).unwrap();
        for r in 0..25 {
            for c in 0..25 {
                assert_eq!(m.get(r, c), r as f64 * 1000.0 + c as f64);
            }
        }
        let calls = provider.calls.lock().unwrap();
        assert!(calls.iter().all(|(s, t, _)| *s <= 10 && *t <= 10 && s * t <= 100));
        assert_eq!(calls.iter().map(|(s, t, _)| s * t).sum::<usize>(), 625);
    }

    #[test]
    fn test_profiles_are_grouped_and_rows_keep_input_order() {
        let provider = Arc::new(GridProvider::new(BatchLimits::pairs(3500)));
        let client = TravelTimeMatrixClient::new(provider.clone(), unlimited());
        let people = points(4);
        let profiles = vec![
            TransportProfile::Walking,
            TransportProfile::Driving,
            TransportProfile::Walking,
            TransportProfile::Driving,
        ];
        let m = client.duration_matrix(&people, &profiles, &points(3)).unwrap();
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
        for r in 0..4 {
            assert_eq!(m.get(r, 2), r as f64 * 1000.0 + 2.0);
        }
    }

    #[test]
    fn test_transient_batch_failure_leaves_cells_unreachable() {
        let mut provider = GridProvider::new(small_limits());
        provider.fail_call = Some(2);
        let client = TravelTimeMatrixClient::new(Arc::new(provider), unlimited());
        let m = client
            .duration_matrix(&points(5), &[TransportProfile::Driving; 5], &points(15))
            .unwrap();
        // second window covers targets 10..15
        assert_eq!(m.get(0, 12), UNREACHABLE);
        assert_eq!(m.get(0, 3), 3.0);
        assert_eq!(m.reachable_cells(), 50);
    }

    #[test]
    fn test_fatal_failure_propagates() {
        let mut provider = GridProvider::new(small_limits());
        provider.fail_call = Some(2);
        provider.fatal = true;
        let client = TravelTimeMatrixClient::new(Arc::new(provider), unlimited());
        let err = client
            .duration_matrix(&points(5), &[TransportProfile::Driving; 5], &points(15))
            .unwrap_err();
        assert!(matches!(err, RoutingError::Unauthorized(_)));
    }

    #[test]
    fn test_only_batch_failing_is_an_error_not_an_empty_matrix() {
        let mut provider = GridProvider::new(BatchLimits::pairs(3500));
        provider.fail_call = Some(1);
        let client = TravelTimeMatrixClient::new(Arc::new(provider), unlimited());
        assert!(client
            .duration_matrix(&points(2), &[TransportProfile::Cycling; 2], &points(3))
            .is_err());
    }

    #[test]
    fn test_quota_is_checked_before_each_call() {
        let provider = Arc::new(GridProvider::new(small_limits()));
        let limiter = Arc::new(SlidingWindowLimiter::new(QuotaLimits {
            per_minute: 2,
            per_day: 0,
        }));
        let client = TravelTimeMatrixClient::new(provider.clone(), limiter);
        let err = client
            .duration_matrix(&points(5), &[TransportProfile::Driving; 5], &points(25))
            .unwrap_err();
        assert!(matches!(err, RoutingError::RateLimitExceeded { .. }));
        // the rejected third call never reached the provider
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_destination_vector_in_candidate_order() {
        let provider = Arc::new(GridProvider::new(small_limits()));
        let client = TravelTimeMatrixClient::new(provider, unlimited());
        let v = client
            .destination_vector(&points(23), GeoPoint::new(7.0, 0.0), TransportProfile::Driving)
            .unwrap();
        assert_eq!(v.len(), 23);
        for i in 0..23 {
            assert_eq!(v.get(i), i as f64 * 1000.0 + 7.0);
        }
    }
}
