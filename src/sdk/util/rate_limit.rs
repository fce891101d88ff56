use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Duration, Utc};
use governor::clock::{Clock as _, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::sdk::routing::error::RoutingError;

/// Source of "now" for the quota windows. Swappable so tests can move time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitWindow {
    Minute,
    Day,
}

impl fmt::Display for LimitWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitWindow::Minute => write!(f, "per-minute"),
            LimitWindow::Day => write!(f, "per-day"),
        }
    }
}

/// Call quotas for one provider. A zero disables that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub per_minute: u32,
    pub per_day: u32,
}

impl QuotaLimits {
    pub fn unlimited() -> Self {
        Self {
            per_minute: 0,
            per_day: 0,
        }
    }
}

#[derive(Default)]
struct Windows {
    minute: VecDeque<DateTime<Utc>>,
    day: VecDeque<DateTime<Utc>>,
}

/// Process-wide quota guard for outbound routing calls.
///
/// Keeps the timestamps of admitted calls in two sliding windows. A call is
/// admitted only if both windows have room, and admission records the call
/// in both windows under the same lock, so concurrent pipelines sharing one
/// limiter can never overshoot a quota.
pub struct SlidingWindowLimiter {
    limits: QuotaLimits,
    clock: Arc<dyn Clock>,
    windows: Mutex<Windows>,
}

pub type Limiter = Arc<SlidingWindowLimiter>;

impl SlidingWindowLimiter {
    pub fn new(limits: QuotaLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: QuotaLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            windows: Mutex::new(Windows::default()),
        }
    }

    /// Admits one call if both quotas allow it.
    pub fn try_acquire(&self) -> bool {
        self.check().is_ok()
    }

    /// Admits one call or names the exhausted window.
    pub fn check(&self) -> Result<(), LimitWindow> {
        if self.limits.per_minute == 0 && self.limits.per_day == 0 {
            return Ok(());
        }

        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if self.limits.per_day > 0 {
            prune(&mut windows.day, now - Duration::days(1));
        }
        if self.limits.per_minute > 0 {
            prune(&mut windows.minute, now - Duration::minutes(1));
        }

        if self.limits.per_day > 0 && windows.day.len() >= self.limits.per_day as usize {
            return Err(LimitWindow::Day);
        }
        if self.limits.per_minute > 0 && windows.minute.len() >= self.limits.per_minute as usize {
            return Err(LimitWindow::Minute);
        }

        if self.limits.per_day > 0 {
            windows.day.push_back(now);
        }
        if self.limits.per_minute > 0 {
            windows.minute.push_back(now);
        }
        Ok(())
    }

    /// Same as [`check`](Self::check), mapped into the provider error type.
    pub fn acquire(&self) -> Result<(), RoutingError> {
        self.check().map_err(|window| {
            log::warn!("Routing call rejected: {} quota exhausted", window);
            RoutingError::RateLimitExceeded { window }
        })
    }
}

fn prune(window: &mut VecDeque<DateTime<Utc>>, threshold: DateTime<Utc>) {
    while window.front().is_some_and(|t| *t < threshold) {
        window.pop_front();
    }
}

/// Spacing for stop-lookup calls. Unlike the routing quota this waits
/// instead of rejecting.
pub type Pacer = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

pub fn lookup_pacer(per_second: u32) -> Pacer {
    let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Blocks the calling thread until the pacer admits one request.
pub fn wait_for(pacer: &Pacer) {
    let clock = DefaultClock::default();
    while let Err(not_until) = pacer.check() {
        thread::sleep(not_until.wait_time_from(clock.now()));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Mutex::new(Utc::now()),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn test_sixth_call_in_a_minute_is_rejected_until_window_elapses() {
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowLimiter::with_clock(
            QuotaLimits {
                per_minute: 5,
                per_day: 0,
            },
            clock.clone(),
        );

        for _ in 0..5 {
            assert!(limiter.try_acquire());
            clock.advance(Duration::seconds(5));
        }
        assert_eq!(limiter.check(), Err(LimitWindow::Minute));
        assert!(matches!(
            limiter.acquire(),
            Err(RoutingError::RateLimitExceeded {
                window: LimitWindow::Minute
            })
        ));

        clock.advance(Duration::seconds(61));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_rejected_calls_are_not_counted() {
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowLimiter::with_clock(
            QuotaLimits {
                per_minute: 2,
                per_day: 0,
            },
            clock.clone(),
        );
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        for _ in 0..10 {
            assert!(!limiter.try_acquire());
        }
        clock.advance(Duration::seconds(61));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_daily_quota_outlives_minute_window() {
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowLimiter::with_clock(
            QuotaLimits {
                per_minute: 5,
                per_day: 3,
            },
            clock.clone(),
        );
        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        clock.advance(Duration::minutes(10));
        assert_eq!(limiter.check(), Err(LimitWindow::Day));
        clock.advance(Duration::hours(24));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_disabled_window_records_nothing() {
        let limiter = SlidingWindowLimiter::new(QuotaLimits {
            per_minute: 0,
            per_day: 100_000,
        });
        for _ in 0..5000 {
            assert!(limiter.try_acquire());
        }
        let windows = limiter.windows.lock().unwrap();
        assert!(windows.minute.is_empty());
        assert_eq!(windows.day.len(), 5000);
    }

    #[test]
    fn test_unlimited_always_admits() {
        let limiter = SlidingWindowLimiter::new(QuotaLimits::unlimited());
        for _ in 0..1000 {
            assert!(limiter.try_acquire());
        }
    }
}
