use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// Attempt bound plus the interval the pause between attempts is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        let (lo, hi) = if min_delay_ms <= max_delay_ms {
            (min_delay_ms, max_delay_ms)
        } else {
            (max_delay_ms, min_delay_ms)
        };
        Self {
            max_attempts: max_attempts.max(1),
            min_delay: Duration::from_millis(lo),
            max_delay: Duration::from_millis(hi),
        }
    }

    /// No pause between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, 0, 0)
    }

    pub fn with_delay_secs(mut self, min_secs: u64, max_secs: u64) -> Self {
        let delays = Self::new(self.max_attempts, min_secs * 1000, max_secs * 1000);
        self.min_delay = delays.min_delay;
        self.max_delay = delays.max_delay;
        self
    }

    /// Uniform draw from `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let ms = rand::thread_rng()
            .gen_range(self.min_delay.as_millis() as u64..=self.max_delay.as_millis() as u64);
        Duration::from_millis(ms)
    }
}

/// Run `operation` until it succeeds or `max_attempts` is exhausted.
///
/// The whole operation is re-run on every attempt. After the last failed
/// attempt the final error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                warn!(
                    "{} attempt {}/{} failed: {}",
                    operation_name, attempt, max_attempts, e
                );

                if attempt >= max_attempts {
                    error!(
                        "{} failed after {} attempts. Last error: {}",
                        operation_name, max_attempts, e
                    );
                    return Err(e);
                }

                let delay = config.next_delay();
                info!("Retrying {} in {:?}...", operation_name, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
