//! Resilient invocation of a [`CaptionBackend`].
//!
//! The policy is deliberately dumb: every failure is retried the same way,
//! whether it was a network error, an "invalid argument" the endpoint
//! sometimes returns for valid requests, or an empty answer. There is no
//! backoff, no jitter and no retryable/non-retryable split.
//!
//! Cancellation comes for free: `caption` is an ordinary future, and dropping
//! it (axum does when the client disconnects) abandons the in-flight call and
//! any pending wait.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{error, info, warn};

use super::{CaptionAnswer, CaptionBackend, CaptionRequest};
use crate::error::{GuessError, GuessResult};

/// Encoding of every image the client sends.
pub const IMAGE_FORMAT: &str = "jpeg";

/// Fixed retry policy for model calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait between a failed attempt and the next one.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Sends encoded images to a backend, retrying per [`RetryPolicy`].
#[derive(Clone)]
pub struct InferenceClient {
    backend: Arc<dyn CaptionBackend>,
    policy: RetryPolicy,
    temperature: f32,
}

impl InferenceClient {
    pub fn new(backend: Arc<dyn CaptionBackend>, temperature: f32) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            temperature,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Ask the model about one JPEG and return its first answer.
    ///
    /// A success returns immediately. Each failure is logged, followed by a
    /// fixed wait, except after the last attempt, where it becomes
    /// [`GuessError::Inference`]. The same payload is resent every time.
    pub async fn caption(&self, jpeg: &[u8], prompt: &str) -> GuessResult<CaptionAnswer> {
        let max_attempts = self.policy.max_attempts.max(1);
        let request = CaptionRequest {
            image: jpeg,
            format: IMAGE_FORMAT,
            prompt,
            temperature: self.temperature,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match self.backend.generate(&request).await {
                Ok(candidates) => match candidates.into_iter().next() {
                    Some(answer) => {
                        info!(backend = self.backend.name(), attempt, "Model answered");
                        return Ok(answer);
                    }
                    None => anyhow!("model returned no candidates"),
                },
                Err(e) => e,
            };

            warn!(
                backend = self.backend.name(),
                attempt,
                max_attempts,
                error = %format!("{failure:#}"),
                "Error calling model"
            );
            if attempt >= max_attempts {
                error!(attempts = attempt, "Giving up on guess after {} attempts", attempt);
                return Err(GuessError::inference(attempt, failure));
            }
            info!(attempt, "Attempt failed, retrying model call");
            tokio::time::sleep(self.policy.delay).await;
        }
    }
}
