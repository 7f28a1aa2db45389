//! Bounded retry around single upstream attempts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::classifier::ErrorClassifier;
use crate::clock::Clock;
use crate::error::{AppError, RawError};

/// Wait inserted before each retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed { delay: Duration },
    /// `base * factor^attempt`. No jitter and no cap; the retry count bounds
    /// the total wait.
    Exponential { base: Duration, factor: f64 },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(2_000),
            factor: 2.0,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, factor } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let scale = factor.powi(exponent);
                Duration::try_from_secs_f64(base.as_secs_f64() * scale)
                    .unwrap_or(Duration::MAX)
            }
        }
    }
}

/// How many retries, and how far apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    /// Doubling backoff starting at `initial_delay`.
    pub fn exponential(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential {
                base: initial_delay,
                factor: 2.0,
            },
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Sum of every backoff delay before the final failure.
    pub fn worst_case_wait(&self) -> Duration {
        (0..self.max_retries)
            .map(|attempt| self.delay_for_attempt(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Wraps single attempts with bounded retry, consulting the classifier.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    classifier: ErrorClassifier,
    clock: Arc<dyn Clock>,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig, classifier: ErrorClassifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            classifier,
            clock,
        }
    }

    pub const fn config(&self) -> RetryConfig {
        self.config
    }

    /// Runs `attempt` until it succeeds, fails terminally, or retries run out.
    /// The error is always the classified one.
    pub async fn with_retry<T, E, F, Fut>(&self, attempt: F) -> Result<T, AppError>
    where
        E: Into<RawError>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.with_retry_until(attempt, |_| false).await
    }

    /// Like [`Self::with_retry`], but `give_up` may end the loop early on an
    /// otherwise retryable error.
    pub async fn with_retry_until<T, E, F, Fut, G>(
        &self,
        mut attempt: F,
        give_up: G,
    ) -> Result<T, AppError>
    where
        E: Into<RawError>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        G: Fn(&AppError) -> bool,
    {
        let mut retries_left = self.config.max_retries;
        let mut retry = 0_u32;

        loop {
            let error = match attempt().await {
                Ok(value) => return Ok(value),
                Err(raw) => self.classifier.classify(raw),
            };

            if !self.classifier.is_retryable(&error) || retries_left == 0 || give_up(&error) {
                return Err(error);
            }

            let delay = self.config.delay_for_attempt(retry);
            warn!(
                kind = %error.kind(),
                delay_ms = delay.as_millis() as u64,
                retries_left,
                "retrying upstream request"
            );
            self.clock.sleep(delay).await;

            retries_left -= 1;
            retry += 1;
        }
    }
}
