//! Retrying invoker shared by every remote call.
//!
//! One policy covers both the inference endpoint and object storage: a fixed
//! attempt budget with exponential backoff between failures. After the k-th
//! failed attempt the delay is `backoff_base * 2^k`, and no sleep happens
//! once the budget is spent. Exhaustion surfaces as a terminal
//! [`FlexionError::RetriesExhausted`] carrying the operation name, the
//! attempt count, and the last underlying error.

use crate::models::{FlexionError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sleep seam, swapped for a recorder in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Runs fallible async operations under a retry budget.
pub struct Invoker {
    max_attempts: u32,
    backoff_base: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl Invoker {
    /// Invoker with the tokio sleeper.
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self::with_sleeper(max_attempts, backoff_base, Arc::new(TokioSleeper))
    }

    /// Invoker with a custom sleeper.
    pub fn with_sleeper(
        max_attempts: u32,
        backoff_base: Duration,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            max_attempts,
            backoff_base,
            sleeper,
        }
    }

    /// Run `attempt_fn` until it succeeds or the attempt budget is spent.
    ///
    /// Only transient failures (network, timeout, bad status) are absorbed
    /// and retried. Anything else propagates out on first occurrence.
    /// `operation` names the call in logs and in the terminal error.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts: u32 = 0;
        let mut last_error: Option<FlexionError> = None;

        while attempts < self.max_attempts {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => {
                    warn!(operation, error = %e, "Non-retryable failure");
                    return Err(e);
                }
                Err(e) => {
                    attempts += 1;
                    warn!(
                        operation,
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Attempt failed"
                    );
                    last_error = Some(e);

                    if attempts < self.max_attempts {
                        let delay = self
                            .backoff_base
                            .saturating_mul(2u32.saturating_pow(attempts));
                        debug!(
                            operation,
                            delay_secs = delay.as_secs_f64(),
                            "Backing off before retry"
                        );
                        self.sleeper.sleep(delay).await;
                    }
                }
            }
        }

        Err(FlexionError::RetriesExhausted {
            operation: operation.to_string(),
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts were made".to_string()),
        })
    }
}
