//! Time source shared by the cache, the rate limiter, and retry backoff.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::Instant;

/// Injectable clock.
///
/// `now` is monotonic and drives every expiry and spacing decision; `now_utc`
/// is only used to derive calendar dates for upstream queries.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> Instant;

    fn now_utc(&self) -> OffsetDateTime;

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Clock backed by the tokio timer, so paused-time tests see virtual time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_advances_virtual_time() {
        let clock = TokioClock;
        let started = clock.now();

        clock.sleep(Duration::from_secs(12)).await;

        assert_eq!(clock.now() - started, Duration::from_secs(12));
    }
}
