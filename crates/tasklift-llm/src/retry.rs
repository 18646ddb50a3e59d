//! Retry policy and the model client
//!
//! `ModelClient` is the single call path from the pipeline to a model
//! capability. One logical call covers the request, the per-call timeout,
//! degenerate-response detection and JSON parsing; any of those failing
//! counts as one failed attempt under the retry policy.

use crate::response::parse_json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tasklift_domain::{
    CompletionOptions, EventSink, ModelCapability, ModelError, PipelineEvent, TracingSink,
};
use tracing::debug;

/// Exponential backoff settings for model calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per logical call
    pub max_attempts: u32,

    /// Delay after the first failed attempt (milliseconds)
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each failure
    pub backoff_factor: f64,

    /// Upper bound on any single delay (milliseconds)
    pub max_delay_ms: u64,

    /// Deadline for one attempt (seconds)
    pub call_timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 5000,
            call_timeout_secs: 60,
        }
    }
}

impl RetryPolicy {
    /// Policy without delays, for tests and batch tools
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let raw = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Per-attempt timeout
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be greater than 0".to_string());
        }
        if self.backoff_factor < 1.0 {
            return Err("retry.backoff_factor must be at least 1.0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("retry.call_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Run an operation under a retry policy
///
/// Non-retryable errors are returned as they are. When every attempt fails
/// the last error is wrapped in [`ModelError::RetriesExhausted`]. The
/// callback `on_attempt` runs before every attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sink: &dyn EventSink,
    mut on_attempt: impl FnMut(),
    mut op: F,
) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        on_attempt();

        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            return Err(err);
        }

        if attempt >= max_attempts {
            return Err(ModelError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = policy.delay_after(attempt);
        sink.emit(PipelineEvent::ModelRetry {
            attempt,
            delay_ms: delay.as_millis() as u64,
            error: err.to_string(),
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Call counters for one client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStats {
    /// Logical calls made
    pub calls: u64,
    /// Attempts made, including retries
    pub attempts: u64,
}

/// Model capability wrapped with retry, timeout and JSON parsing
///
/// Create one client per run so its counters describe that run alone.
pub struct ModelClient {
    model: Arc<dyn ModelCapability>,
    policy: RetryPolicy,
    sink: Arc<dyn EventSink>,
    calls: AtomicU64,
    attempts: AtomicU64,
}

impl ModelClient {
    /// Create a client with the tracing sink
    pub fn new(model: Arc<dyn ModelCapability>, policy: RetryPolicy) -> Self {
        Self::with_sink(model, policy, Arc::new(TracingSink))
    }

    /// Create a client reporting retries to the given sink
    pub fn with_sink(
        model: Arc<dyn ModelCapability>,
        policy: RetryPolicy,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            model,
            policy,
            sink,
            calls: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
        }
    }

    /// Backend label
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Counters so far
    pub fn stats(&self) -> CallStats {
        CallStats {
            calls: self.calls.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
        }
    }

    /// Complete a prompt and parse the response as JSON
    pub async fn complete_json(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Value, ModelError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let timeout = self.policy.call_timeout();

        with_retry(
            &self.policy,
            self.sink.as_ref(),
            || {
                self.attempts.fetch_add(1, Ordering::Relaxed);
            },
            || async move {
                let raw = tokio::time::timeout(timeout, self.model.complete(prompt, options))
                    .await
                    .map_err(|_| ModelError::Timeout(timeout.as_secs()))??;
                debug!(
                    model = self.model.name(),
                    chars = raw.len(),
                    "Model responded"
                );
                parse_json(&raw)
            },
        )
        .await
    }
}
