//! Retry policy for upstream calls
//!
//! Rate limiting backs off exponentially, transient unavailability backs off
//! linearly, everything else fails on the first attempt.

use crate::errors::{ErrorKind, SourceError};
use backoff::backoff::Stop;
use paperweb_common::config::RetryConfig;
use paperweb_common::metrics;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffShape {
    /// `base * 2^(attempt - 1)`
    Exponential,
    /// `base * attempt`
    Linear,
}

impl BackoffShape {
    fn delay(&self, base: Duration, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            BackoffShape::Exponential => base.saturating_mul(1u32 << (attempt - 1).min(16)),
            BackoffShape::Linear => base.saturating_mul(attempt),
        }
    }
}

/// Retry policy shared by every upstream call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Retryable error kinds and their backoff shape
    pub retryable: Vec<(ErrorKind, BackoffShape)>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            retryable: vec![
                (ErrorKind::RateLimited, BackoffShape::Exponential),
                (ErrorKind::UpstreamUnavailable, BackoffShape::Linear),
            ],
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            retryable: Vec::new(),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retrying after `attempt` failed, `None` when terminal
    pub fn delay_for(&self, err: &SourceError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let kind = err.kind();
        self.retryable
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, shape)| shape.delay(self.base_delay, attempt))
    }

    /// Run `operation` until it succeeds, fails terminally or attempts run out.
    /// The last error is surfaced.
    pub async fn run<T, F, Fut>(&self, service: &str, mut operation: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0u32;

        backoff::future::retry_notify(
            Stop {},
            || {
                attempt += 1;
                let current = attempt;
                let call = operation();
                async move {
                    call.await.map_err(|err| match self.delay_for(&err, current) {
                        Some(delay) => backoff::Error::retry_after(err, delay),
                        None => backoff::Error::permanent(err),
                    })
                }
            },
            |err: SourceError, delay: Duration| {
                warn!(
                    service,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Upstream call failed, retrying"
                );
                metrics::record_retry(service, err.kind().as_str());
            },
        )
        .await
    }
}
