use std::{future::Future, time::Duration};

use crate::error::{AppError, AppResult};

/// How many times to repeat a failed upstream call, and how long to wait in between
///
/// Only `AppError::Upstream` is retried. A reply that arrived but could not be used is a
/// content problem, so repeating the same prompt is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    /// Runs `operation` until it succeeds, fails with a non-upstream error, or retries run out
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Err(AppError::Upstream(msg)) if retry < self.max_retries => {
                    retry += 1;
                    let delay = self.backoff_for(retry);
                    tracing::warn!(
                        attempt = retry,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %msg,
                        "Upstream call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}
