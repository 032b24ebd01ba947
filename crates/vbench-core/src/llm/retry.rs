//! Rate-limit retry policy.
//!
//! A rate-limited call is retried exactly once after a fixed backoff.
//! Every other failure, and a second rate limit, propagates unchanged.

use super::provider::{ModelClient, ModelRequest, ModelResponse};
use crate::error::ModelError;
use std::time::Duration;

/// Hard ceiling on calls per combination: the first attempt plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Where a combination is in its retry lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    FirstAttempt,
    Retried,
}

impl AttemptState {
    fn for_attempt(attempt: u32) -> Self {
        if attempt <= 1 {
            Self::FirstAttempt
        } else {
            Self::Retried
        }
    }
}

/// Wraps a [`ModelClient`] call with the single-retry backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// Issue the call, retrying the identical request once after a rate limit.
    pub async fn invoke(
        &self,
        client: &dyn ModelClient,
        model: &str,
        request: &ModelRequest<'_>,
    ) -> Result<ModelResponse, ModelError> {
        let mut attempt = 1;
        loop {
            let state = AttemptState::for_attempt(attempt);
            match client.generate(model, request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_quota_exceeded() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        "{} rate limited {model} (attempt {attempt}/{MAX_ATTEMPTS}): {e}",
                        client.name()
                    );
                    tracing::info!("Sleeping for {} seconds.", self.backoff.as_secs());
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    if state == AttemptState::Retried {
                        tracing::debug!("{model} failed after retry");
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}
