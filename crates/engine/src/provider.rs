use std::future::Future;
use std::time::{Duration, Instant};

use reflectgate_common::config::CallPolicyConfig;
use reflectgate_common::GateError;

use crate::llm::LlmError;

/// Hard cap on attempts per provider call: the first try plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Timeout and retry applied to every call to an external provider.
#[derive(Clone, Debug)]
pub struct CallPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl CallPolicy {
    pub fn from_config(config: &CallPolicyConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_attempts: config.max_attempts.clamp(1, MAX_ATTEMPTS),
            initial_backoff_ms: config.initial_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
            backoff_multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }
}

/// Why a provider call produced no usable value.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("evaluation service error: {0}")]
    Http(String),

    #[error("malformed provider output: {0}")]
    Malformed(String),

    #[error("provider task aborted: {0}")]
    Aborted(String),
}

impl ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Llm(e) => !e.is_non_retryable(),
            Self::Aborted(_) => false,
            Self::Timeout(_) | Self::Http(_) | Self::Malformed(_) => true,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<ProviderError> for GateError {
    fn from(e: ProviderError) -> Self {
        if e.is_timeout() {
            GateError::ProviderTimeout(e.to_string())
        } else {
            GateError::Provider(e.to_string())
        }
    }
}

/// Run a provider call under `policy`.
///
/// Each attempt runs on its own task: if the caller is dropped mid-call the
/// attempt still runs to completion or timeout, and its result is discarded.
pub async fn call_with_policy<T, F, Fut>(
    provider_name: &'static str,
    policy: &CallPolicy,
    mut attempt_fn: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    T: Send + 'static,
{
    let mut attempt = 0u32;
    let mut backoff_ms = policy.initial_backoff_ms;

    loop {
        attempt += 1;
        let start = Instant::now();

        let handle = tokio::spawn(tokio::time::timeout(policy.timeout, attempt_fn()));
        let result = match handle.await {
            Ok(Ok(inner)) => inner,
            Ok(Err(_elapsed)) => Err(ProviderError::Timeout(policy.timeout)),
            Err(join_err) => Err(ProviderError::Aborted(join_err.to_string())),
        };

        metrics::histogram!("provider.call.latency", "provider" => provider_name)
            .record(start.elapsed().as_secs_f64());

        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_retryable() || attempt >= policy.max_attempts {
            metrics::counter!("provider.call.failures", "provider" => provider_name).increment(1);
            return Err(error);
        }

        let wait = match &error {
            ProviderError::Llm(LlmError::RateLimited {
                retry_after: Some(secs),
            }) => secs.saturating_mul(1000).min(policy.max_backoff_ms),
            _ => {
                let jitter = if policy.jitter {
                    compute_jitter(attempt, backoff_ms)
                } else {
                    0
                };
                backoff_ms + jitter
            }
        };

        tracing::warn!(
            provider = provider_name,
            attempt,
            wait_ms = wait,
            error = %error,
            "Provider call failed, retrying"
        );
        tokio::time::sleep(Duration::from_millis(wait)).await;

        backoff_ms = (backoff_ms as f64 * policy.backoff_multiplier) as u64;
        backoff_ms = backoff_ms.min(policy.max_backoff_ms);
    }
}

/// Compute jitter for retry backoff using simple hash-based approach.
fn compute_jitter(attempt: u32, backoff_ms: u64) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::hash::DefaultHasher::new();
    attempt.hash(&mut hasher);
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos()
        .hash(&mut hasher);
    hasher.finish() % (backoff_ms / 2 + 1)
}
