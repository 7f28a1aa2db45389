use std::sync::Arc;
use std::time::Duration;

use governor::clock::Clock as GovernorClock;
use governor::middleware::NoOpMiddleware;
use governor::nanos::Nanos;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::Quota;
use tokio::time::Instant;
use tracing::trace;

use crate::clock::Clock;

/// Request class drawing on the shared upstream quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Listing and snapshot endpoints.
    Reference,
    /// Historical aggregates behind the price chart; stricter upstream quota.
    Chart,
}

impl Lane {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Chart => "chart",
        }
    }
}

/// Minimum spacing between dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Spacing between any two dispatches.
    pub min_interval: Duration,
    /// Additional spacing between two `Chart` dispatches.
    pub chart_min_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(2_000),
            chart_min_interval: Duration::from_millis(12_000),
        }
    }
}

/// Feeds the injected [`Clock`] to governor as nanoseconds since the limiter
/// was built, so paused tokio time drives the quota.
#[derive(Debug, Clone)]
struct QuotaClock {
    clock: Arc<dyn Clock>,
    origin: Instant,
}

impl GovernorClock for QuotaClock {
    type Instant = Nanos;

    fn now(&self) -> Self::Instant {
        Nanos::from(self.clock.now().saturating_duration_since(self.origin))
    }
}

type DirectLimiter =
    governor::RateLimiter<NotKeyed, InMemoryState, QuotaClock, NoOpMiddleware<Nanos>>;

fn direct(interval: Duration, clock: &QuotaClock) -> Option<DirectLimiter> {
    Quota::with_period(interval)
        .map(|quota| DirectLimiter::direct_with_clock(quota, clock))
}

/// Single gate enforcing request cadence against the upstream API.
///
/// Every dispatch takes a cell from the global quota; `Chart` dispatches
/// also take one from the chart quota. A zero interval disables its quota.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: QuotaClock,
    global: Option<DirectLimiter>,
    chart: Option<DirectLimiter>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let clock = QuotaClock {
            origin: clock.now(),
            clock,
        };
        Self {
            global: direct(config.min_interval, &clock),
            chart: direct(config.chart_min_interval, &clock),
            config,
            clock,
        }
    }

    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Resolves once `lane` may dispatch; returns the dispatch instant.
    ///
    /// The global cell is taken first. When the chart check then fails, the
    /// early global cell can only push the next turn later, never closer.
    pub async fn await_turn(&self, lane: Lane) -> Instant {
        loop {
            let wait = match self.check(lane) {
                Ok(()) => return self.clock.clock.now(),
                Err(wait) => wait,
            };
            trace!(
                lane = lane.as_str(),
                wait_ms = wait.as_millis() as u64,
                "rate limiter delaying dispatch"
            );
            self.clock.clock.sleep(wait).await;
        }
    }

    fn check(&self, lane: Lane) -> Result<(), Duration> {
        let limiters = match lane {
            Lane::Reference => [self.global.as_ref(), None],
            Lane::Chart => [self.global.as_ref(), self.chart.as_ref()],
        };

        for limiter in limiters.into_iter().flatten() {
            if let Err(not_until) = limiter.check() {
                return Err(not_until.wait_time_from(self.clock.now()));
            }
        }
        Ok(())
    }
}
