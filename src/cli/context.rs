//! Command execution context
//!
//! Builds the suggestion pipeline from configuration so command handlers
//! only deal with input and output.

use std::sync::Arc;

use log::{debug, warn};

use crate::cache::ResponseCache;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::GeminiConnector;
use crate::config::Config;
use crate::error::Result;
use crate::fallback::FallbackProvider;
use crate::generator::{ContentGenerator, RetryPolicy};
use crate::keys::KeyPool;
use crate::service::SuggestionService;

/// Everything a command needs: config, the shared pool and the service
pub struct CommandContext {
    /// Loaded configuration with environment credentials merged
    pub config: Config,
    /// Key pool shared with the generator
    pub key_pool: Arc<KeyPool>,
    /// The request pipeline
    pub service: SuggestionService,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config and wire up the pipeline.
    ///
    /// A missing API key is not an error here: the service degrades to
    /// curated suggestions and says so in the response metadata.
    ///
    /// # Errors
    /// Returns error if the config is unreadable or invalid, the HTTP client
    /// cannot be built, or the embedded fallback table is corrupt.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_at(opts.config_ref())?;
        if let Some(base) = opts.api_base_ref() {
            config.generation.api_base = base.to_string();
        }

        if config.api_keys.is_empty() {
            warn!("No API keys configured; suggestions will come from the curated pool");
        }
        debug!(
            "Building pipeline with {} API key(s) against {}",
            config.api_keys.len(),
            config.generation.api_base
        );

        let key_pool = Arc::new(KeyPool::new(
            config.api_keys.clone(),
            config.keys.pool_settings(),
        ));
        let connector = GeminiConnector::new(&config.generation)?;
        let generator = ContentGenerator::new(
            connector,
            Arc::clone(&key_pool),
            RetryPolicy::from(&config.retry),
        );

        let cache = Arc::new(ResponseCache::new(config.cache.ttl(), config.cache.max_size));
        let fallback = Arc::new(FallbackProvider::embedded()?);

        let service = SuggestionService::new(Arc::new(generator), cache, fallback)
            .with_deadline(config.retry.request_deadline())
            .with_cache_enabled(!opts.no_cache);

        Ok(Self {
            config,
            key_pool,
            service,
            format: opts.format,
        })
    }
}
