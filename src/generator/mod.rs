//! Suggestion generation against the generative service
//!
//! [`ContentGenerator`] owns the retry loop: each attempt uses the key pool's
//! active key, failures are reported back to the pool (which may rotate), and
//! attempts are spaced by a linear backoff.

pub mod parse;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::client::{ClientFactory, ContentApi};
use crate::config::RetrySettings;
use crate::error::{ApiError, GenerateError};
use crate::keys::{ActiveCredential, KeyPool};
use crate::models::{RequestParameters, Suggestion};

pub use parse::parse_suggestions;
pub use prompt::build_prompt;

/// Anything that can produce suggestions for a request
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn generate(&self, params: &RequestParameters)
    -> Result<Vec<Suggestion>, GenerateError>;
}

/// Attempt budget and spacing
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries.max(1),
            backoff_base: settings.backoff_base(),
            attempt_timeout: settings.attempt_timeout(),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }
}

/// Generates suggestions with key rotation and retries
pub struct ContentGenerator<F: ClientFactory> {
    factory: F,
    pool: Arc<KeyPool>,
    policy: RetryPolicy,
}

impl<F: ClientFactory> ContentGenerator<F> {
    pub fn new(factory: F, pool: Arc<KeyPool>, policy: RetryPolicy) -> Self {
        Self {
            factory,
            pool,
            policy,
        }
    }

    pub fn pool(&self) -> &Arc<KeyPool> {
        &self.pool
    }

    /// One upstream call plus parsing
    async fn attempt(
        &self,
        client: &F::Client,
        credential: &ActiveCredential,
        prompt: &str,
        params: &RequestParameters,
    ) -> Result<Vec<Suggestion>, GenerateError> {
        let limit = self.policy.attempt_timeout;
        let text = tokio::time::timeout(limit, client.generate_content(prompt))
            .await
            .map_err(|_| ApiError::Timeout(self.policy.attempt_timeout))??;

        self.pool.record_success(credential);
        parse_suggestions(&text, params.duration)
    }

    /// Run up to `max_retries` attempts.
    ///
    /// Returns `NoCredentials` without calling out when the pool is empty and
    /// `AllAttemptsExhausted` with the last failure once the budget is spent.
    pub async fn generate(
        &self,
        params: &RequestParameters,
    ) -> Result<Vec<Suggestion>, GenerateError> {
        let prompt = build_prompt(params);
        let max = self.policy.max_retries;
        let mut bound: Option<(ActiveCredential, F::Client)> = None;
        let mut last_error = GenerateError::NoCredentials;

        for attempt in 1..=max {
            let credential = self.pool.current()?;

            let rebind = bound.as_ref().is_none_or(|(c, _)| *c != credential);
            if rebind {
                debug!("Binding client to API key {}", credential.masked());
                match self.factory.connect(&credential.secret) {
                    Ok(client) => bound = Some((credential.clone(), client)),
                    Err(err) => {
                        bound = None;
                        warn!("Attempt {}/{}: could not build client: {}", attempt, max, err);
                        self.pool.record_failure(&credential)?;
                        last_error = err.into();
                        if attempt < max {
                            tokio::time::sleep(self.policy.backoff(attempt)).await;
                        }
                        continue;
                    }
                }
            }
            let Some((credential, client)) = bound.as_ref() else {
                continue;
            };

            info!("Generation attempt {}/{} using API key {}", attempt, max, credential.index);
            match self.attempt(client, credential, &prompt, params).await {
                Ok(suggestions) => {
                    info!("Generated {} suggestions on attempt {}", suggestions.len(), attempt);
                    return Ok(suggestions);
                }
                Err(err) => {
                    warn!("Attempt {}/{} failed: {}", attempt, max, err);
                    let next = match &err {
                        GenerateError::Upstream(ApiError::RateLimit(_)) => {
                            self.pool.record_rate_limited(credential)?
                        }
                        _ => self.pool.record_failure(credential)?,
                    };
                    if next != *credential {
                        info!("Switched to API key {}", next.index);
                    }
                    last_error = err;
                }
            }

            if attempt < max {
                let wait = self.policy.backoff(attempt);
                debug!("Waiting {:?} before retrying", wait);
                tokio::time::sleep(wait).await;
            }
        }

        Err(GenerateError::AllAttemptsExhausted {
            attempts: max,
            last: Box::new(last_error),
        })
    }
}

#[async_trait]
impl<F> SuggestionSource for ContentGenerator<F>
where
    F: ClientFactory,
{
    async fn generate(
        &self,
        params: &RequestParameters,
    ) -> Result<Vec<Suggestion>, GenerateError> {
        ContentGenerator::generate(self, params).await
    }
}
