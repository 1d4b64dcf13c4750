//! Fixed-delay bounded retry.

use std::future::Future;
use std::time::Duration;

use error_stack::Context;
use error_stack::Report;
use tracing::debug;
use tracing::warn;

/// Number of attempts made when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Pause between two attempts when none is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Retries an operation a fixed number of times with a constant pause.
///
/// There is no backoff growth and no jitter. The delay is only waited between
/// attempts, never after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl RetryPolicy {
    /// `max_attempts` of zero is treated as a single attempt.
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
        }
    }

    /// Policy without any pause between attempts.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Time spent pausing when every attempt fails.
    pub fn total_delay(&self) -> Duration {
        self.delay * (self.max_attempts - 1)
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// On exhaustion the report of the last attempt is returned with the
    /// attempt count attached.
    pub async fn run<T, C, F, Fut>(&self, mut operation: F) -> Result<T, Report<C>>
    where
        C: Context,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Report<C>>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(report) if attempt >= self.max_attempts => {
                    return Err(report.attach_printable(format!(
                        "giving up after {attempt} attempt(s)"
                    )));
                }
                Err(report) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_sec = self.delay.as_secs_f32(),
                        "Attempt failed, retrying after delay: {report}"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
