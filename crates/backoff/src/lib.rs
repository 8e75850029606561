//! Bounded exponential backoff with an async retry driver.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Default delay before the second attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default cap on a single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Retry schedule: `initial * multiplier^n`, capped at `max_delay`, for at most `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max_delay: Duration,
    multiplier: u32,
    max_attempts: usize,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: 2,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Backoff {
    /// Constant delay between attempts.
    pub fn fixed(delay: Duration, max_attempts: usize) -> Self {
        Self {
            initial: delay,
            max_delay: delay,
            multiplier: 1,
            max_attempts,
        }
    }

    pub fn with_initial(mut self, initial: Duration) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay to wait after the given failed attempt (0-based).
    pub fn delay(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt).unwrap_or(u32::MAX);
        let factor = self.multiplier.saturating_pow(exp);
        self.initial.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds or attempts are exhausted, returning the last error.
    ///
    /// `op` receives the 0-based attempt index. At least one attempt is always made.
    pub async fn retry<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(what, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt + 1 >= attempts => return Err(err),
                Err(err) => {
                    let delay = self.delay(attempt);
                    warn!(what, attempt, ?delay, %err, "attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
