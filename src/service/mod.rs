//! Request orchestration
//!
//! [`SuggestionService`] runs the degradation chain for one request:
//! cache, then generation, then the curated pool for the request, then the
//! baseline bucket. Callers only see an error when the baseline itself fails.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use log::{debug, error, info, warn};

use crate::cache::{ResponseCache, cache_key};
use crate::error::Result;
use crate::fallback::FallbackProvider;
use crate::generator::SuggestionSource;
use crate::models::{
    RawRequest, RequestParameters, SUGGESTION_COUNT, Source, Suggestion, SuggestionResponse,
};

/// Default budget for the generation step of a request
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(45);

pub struct SuggestionService {
    generator: Arc<dyn SuggestionSource>,
    cache: Arc<ResponseCache>,
    fallback: Arc<FallbackProvider>,
    request_deadline: Duration,
    cache_enabled: bool,
}

impl SuggestionService {
    pub fn new(
        generator: Arc<dyn SuggestionSource>,
        cache: Arc<ResponseCache>,
        fallback: Arc<FallbackProvider>,
    ) -> Self {
        Self {
            generator,
            cache,
            fallback,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
            cache_enabled: true,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    /// Skip cache lookups and writes entirely
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Answer a request. Always yields three suggestions unless the baseline
    /// fallback bucket is unusable.
    pub async fn handle(&self, raw: &RawRequest) -> Result<SuggestionResponse> {
        match AssertUnwindSafe(self.respond(raw)).catch_unwind().await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                error!("Request failed unexpectedly, serving baseline suggestions: {}", err);
                self.error_fallback()
            }
            Err(payload) => {
                error!(
                    "Request handling panicked, serving baseline suggestions: {}",
                    panic_message(payload.as_ref())
                );
                self.error_fallback()
            }
        }
    }

    async fn respond(&self, raw: &RawRequest) -> Result<SuggestionResponse> {
        let params = RequestParameters::normalize(raw);
        let key = cache_key(&params);

        if self.cache_enabled {
            if let Some(suggestions) = self.cache.get(&key) {
                info!("Serving cached suggestions for {}", key);
                return Ok(self.response(&params, suggestions, Source::Cache));
            }
        }

        let outcome =
            tokio::time::timeout(self.request_deadline, self.generator.generate(&params)).await;
        match outcome {
            Ok(Ok(generated)) => {
                let suggestions = self.fill_to_count(generated, &params)?;
                if self.cache_enabled {
                    self.cache.set(&key, suggestions.clone());
                }
                return Ok(self.response(&params, suggestions, Source::Generator));
            }
            Ok(Err(err)) => {
                warn!("Generation failed for {}, serving fallback: {}", key, err);
            }
            Err(_) => {
                warn!(
                    "Generation for {} exceeded {:?}, serving fallback",
                    key, self.request_deadline
                );
            }
        }

        let suggestions = self.fallback.select(&params)?;
        Ok(self.response(&params, suggestions, Source::Fallback))
    }

    /// Top up a short generated list from the curated pool, skipping titles
    /// already present.
    fn fill_to_count(
        &self,
        mut suggestions: Vec<Suggestion>,
        params: &RequestParameters,
    ) -> Result<Vec<Suggestion>> {
        suggestions.truncate(SUGGESTION_COUNT);
        if suggestions.len() == SUGGESTION_COUNT {
            return Ok(suggestions);
        }

        debug!(
            "Generator returned {} suggestions, topping up from the curated pool",
            suggestions.len()
        );
        for extra in self.fallback.select(params)? {
            if suggestions.len() == SUGGESTION_COUNT {
                break;
            }
            if !suggestions.iter().any(|s| s.title == extra.title) {
                suggestions.push(extra);
            }
        }
        Ok(suggestions)
    }

    fn error_fallback(&self) -> Result<SuggestionResponse> {
        let params = RequestParameters::baseline();
        let suggestions = self.fallback.select(&params)?;
        Ok(self.response(&params, suggestions, Source::ErrorFallback))
    }

    fn response(
        &self,
        params: &RequestParameters,
        suggestions: Vec<Suggestion>,
        source: Source,
    ) -> SuggestionResponse {
        SuggestionResponse::new(params, suggestions, source, self.cache.stats())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
