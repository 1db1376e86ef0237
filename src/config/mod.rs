//! Configuration management for Respite

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::keys::KeyPoolSettings;

/// Numbered credential variables, checked in order
pub const NUMBERED_KEY_VARS: [&str; 3] =
    ["GEMINI_API_KEY_1", "GEMINI_API_KEY_2", "GEMINI_API_KEY_3"];

/// Single-key variable, appended last when not already present
pub const LEGACY_KEY_VAR: &str = "GEMINI_API_KEY";

/// Overrides `generation.api_base`
pub const API_BASE_VAR: &str = "RESPITE_API_BASE";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys, tried after any keys found in the environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_keys: Vec<String>,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub keys: KeySettings,
}

/// Generative service endpoint and sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Retry and deadline tuning for generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before attempt `n + 1` is `n * backoff_base_ms`
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Budget for the whole generation step of one request
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_attempt_timeout_secs() -> u64 {
    20
}

fn default_request_deadline_secs() -> u64 {
    45
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            request_deadline_secs: default_request_deadline_secs(),
        }
    }
}

impl RetrySettings {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}

/// Response cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
}

fn default_cache_ttl_secs() -> u64 {
    crate::cache::DEFAULT_TTL.as_secs()
}

fn default_cache_max_size() -> usize {
    crate::cache::DEFAULT_MAX_SIZE
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_size: default_cache_max_size(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Key pool failure handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

fn default_failure_threshold() -> u32 {
    crate::keys::DEFAULT_FAILURE_THRESHOLD
}

fn default_cooldown_secs() -> u64 {
    crate::keys::DEFAULT_COOLDOWN.as_secs()
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl KeySettings {
    pub fn pool_settings(&self) -> KeyPoolSettings {
        KeyPoolSettings {
            failure_threshold: self.failure_threshold,
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }
}

/// Ordered, de-duplicated credentials from the environment: the numbered
/// variables first, then the legacy variable if it holds a new key.
pub fn env_credentials<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut keys: Vec<String> = Vec::new();
    for var in NUMBERED_KEY_VARS.iter().chain(std::iter::once(&LEGACY_KEY_VAR)) {
        if let Some(value) = lookup(var) {
            let value = value.trim().to_string();
            if !value.is_empty() && !keys.contains(&value) {
                keys.push(value);
            }
        }
    }
    keys
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".respite").join("config.yaml"))
    }

    /// Load from an explicit path or the default one, then merge the
    /// process environment.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_path()?,
        };

        let mut config = Self::load_from(&path)?;
        config.apply_env(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path. A missing file yields the
    /// defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        debug!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Merge environment overrides. Environment keys go first; keys from the
    /// file follow, skipping duplicates.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(API_BASE_VAR).filter(|b| !b.trim().is_empty()) {
            debug!("API base overridden by {}", API_BASE_VAR);
            self.generation.api_base = base;
        }

        let mut keys = env_credentials(&lookup);
        for key in self.api_keys.drain(..) {
            let key = key.trim().to_string();
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        self.api_keys = keys;
    }

    /// Reject values that would leave the pipeline unable to operate
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_retries == 0 {
            return Err(
                ConfigError::Invalid("retry.max_retries must be at least 1".to_string()).into(),
            );
        }
        if self.keys.failure_threshold == 0 {
            let msg = "keys.failure_threshold must be at least 1";
            return Err(ConfigError::Invalid(msg.to_string()).into());
        }
        if self.cache.max_size == 0 {
            return Err(
                ConfigError::Invalid("cache.max_size must be at least 1".to_string()).into(),
            );
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::Invalid(
                "generation.temperature must be between 0 and 2".to_string(),
            )
            .into());
        }
        if self.generation.model.trim().is_empty() {
            return Err(
                ConfigError::Invalid("generation.model must not be empty".to_string()).into(),
            );
        }
        Ok(())
    }
}
