//! API key pool with health tracking and rotation
//!
//! Holds every configured credential for the generative service. Failing keys
//! are shed by rotating to the next one once they reach the failure
//! threshold; a tripped key recovers lazily once its cooldown has elapsed.
//!
//! All state lives behind a single mutex so `current_index` and the failure
//! counters change atomically even when requests run concurrently. Two
//! requests failing on the same key at the same moment may still both rotate
//! and skip a candidate; that case is best-effort.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::error::GenerateError;

/// Consecutive failures before a key is put on cooldown
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// How long a tripped key stays failed before it is retried
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// Health of a single credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    #[default]
    Unknown,
    Working,
    Failed,
}

impl CredentialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStatus::Unknown => "unknown",
            CredentialStatus::Working => "working",
            CredentialStatus::Failed => "failed",
        }
    }
}

/// A configured API key and its health
#[derive(Clone)]
pub struct Credential {
    secret: String,
    failure_count: u32,
    status: CredentialStatus,
    last_failure_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            failure_count: 0,
            status: CredentialStatus::Unknown,
            last_failure_at: None,
        }
    }

    /// Credential with a pre-set status instead of `unknown`
    pub fn with_status(mut self, status: CredentialStatus) -> Self {
        self.status = status;
        self
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn status(&self) -> CredentialStatus {
        self.status
    }

    pub fn last_failure_at(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }

    fn reset(&mut self) {
        self.failure_count = 0;
        self.status = CredentialStatus::Unknown;
        self.last_failure_at = None;
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &mask_secret(&self.secret))
            .field("failure_count", &self.failure_count)
            .field("status", &self.status)
            .field("last_failure_at", &self.last_failure_at)
            .finish()
    }
}

/// Handle to the credential a caller is currently using
#[derive(Clone, PartialEq, Eq)]
pub struct ActiveCredential {
    pub index: usize,
    pub secret: String,
}

impl ActiveCredential {
    pub fn masked(&self) -> String {
        mask_secret(&self.secret)
    }
}

impl fmt::Debug for ActiveCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveCredential")
            .field("index", &self.index)
            .field("secret", &self.masked())
            .finish()
    }
}

/// Tunables for failure handling
#[derive(Debug, Clone, Copy)]
pub struct KeyPoolSettings {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for KeyPoolSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[derive(Debug)]
struct PoolState {
    credentials: Vec<Credential>,
    current_index: usize,
    started: bool,
    rotations: u64,
    last_rotation: Option<DateTime<Utc>>,
}

impl PoolState {
    fn active(&self) -> ActiveCredential {
        ActiveCredential {
            index: self.current_index,
            secret: self.credentials[self.current_index].secret.clone(),
        }
    }

    /// First-use selection: first key that is not failed, else index 0.
    fn ensure_started(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        match self
            .credentials
            .iter()
            .position(|c| c.status != CredentialStatus::Failed)
        {
            Some(index) => self.current_index = index,
            None => {
                warn!(
                    "All {} API keys are marked failed, starting degraded on key 0",
                    self.credentials.len()
                );
                self.current_index = 0;
            }
        }
        info!(
            "Key pool started with {} keys, active index {}",
            self.credentials.len(),
            self.current_index
        );
    }

    fn rotate(&mut self) -> ActiveCredential {
        let count = self.credentials.len();
        if count <= 1 {
            warn!("Cannot rotate: only one API key available");
            return self.active();
        }
        self.current_index = (self.current_index + 1) % count;
        self.rotations += 1;
        self.last_rotation = Some(Utc::now());
        info!("Rotated to API key index {}", self.current_index);
        self.active()
    }

    /// Reset tripped keys whose cooldown has elapsed.
    fn refresh_cooldowns(&mut self, settings: &KeyPoolSettings, now: DateTime<Utc>) {
        for (index, credential) in self.credentials.iter_mut().enumerate() {
            if cooldown_remaining(credential, settings, now) == Some(Duration::ZERO) {
                credential.reset();
                info!("API key {} cooldown expired, key is available again", index);
            }
        }
    }
}

/// Remaining cooldown of a tripped key; `None` when the key is not tripped.
fn cooldown_remaining(
    credential: &Credential,
    settings: &KeyPoolSettings,
    now: DateTime<Utc>,
) -> Option<Duration> {
    if credential.status != CredentialStatus::Failed
        || credential.failure_count < settings.failure_threshold
    {
        return None;
    }
    let failed_at = credential.last_failure_at?;
    let elapsed = (now - failed_at).to_std().unwrap_or(Duration::ZERO);
    Some(settings.cooldown.saturating_sub(elapsed))
}

/// Shorten a secret for logs and status output.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{}...", prefix)
}

/// Rotating pool of API keys shared by every request
pub struct KeyPool {
    state: Mutex<PoolState>,
    settings: KeyPoolSettings,
}

impl KeyPool {
    /// Create a pool from raw secrets. An empty pool is allowed here and only
    /// rejected on first use.
    pub fn new(secrets: Vec<String>, settings: KeyPoolSettings) -> Self {
        Self::from_credentials(secrets.into_iter().map(Credential::new).collect(), settings)
    }

    pub fn from_credentials(credentials: Vec<Credential>, settings: KeyPoolSettings) -> Self {
        Self {
            state: Mutex::new(PoolState {
                credentials,
                current_index: 0,
                started: false,
                rotations: 0,
                last_rotation: None,
            }),
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock, start and refresh the pool, rejecting an empty one.
    fn ready(&self) -> Result<MutexGuard<'_, PoolState>, GenerateError> {
        let mut state = self.lock();
        if state.credentials.is_empty() {
            return Err(GenerateError::NoCredentials);
        }
        state.ensure_started();
        state.refresh_cooldowns(&self.settings, Utc::now());
        Ok(state)
    }

    pub fn len(&self) -> usize {
        self.lock().credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn settings(&self) -> &KeyPoolSettings {
        &self.settings
    }

    /// The credential requests should use right now.
    pub fn current(&self) -> Result<ActiveCredential, GenerateError> {
        Ok(self.ready()?.active())
    }

    /// Advance to the next key circularly. With a single key this is a no-op
    /// that still hands back that key.
    pub fn rotate(&self) -> Result<ActiveCredential, GenerateError> {
        Ok(self.ready()?.rotate())
    }

    /// Record a failed call made with `credential`. Once the key reaches the
    /// failure threshold it is put on cooldown and the pool rotates.
    ///
    /// Returns the credential that is active afterwards.
    pub fn record_failure(
        &self,
        credential: &ActiveCredential,
    ) -> Result<ActiveCredential, GenerateError> {
        let mut state = self.ready()?;
        let threshold = self.settings.failure_threshold;

        let Some(entry) = state.credentials.get_mut(credential.index) else {
            warn!("Unknown API key {} reported as failed", credential.masked());
            return Ok(state.active());
        };
        entry.failure_count += 1;
        entry.status = CredentialStatus::Failed;
        entry.last_failure_at = Some(Utc::now());
        let failures = entry.failure_count;
        debug!("API key {} failure count: {}", credential.index, failures);

        if failures >= threshold {
            warn!(
                "API key {} failed {} times, cooling down for {:?}",
                credential.index, failures, self.settings.cooldown
            );
            return Ok(state.rotate());
        }
        Ok(state.active())
    }

    /// A 429 trips the key immediately instead of waiting for the threshold.
    pub fn record_rate_limited(
        &self,
        credential: &ActiveCredential,
    ) -> Result<ActiveCredential, GenerateError> {
        {
            let mut state = self.ready()?;
            let threshold = self.settings.failure_threshold;
            if let Some(entry) = state.credentials.get_mut(credential.index) {
                // One short of the threshold so record_failure trips it.
                entry.failure_count = entry.failure_count.max(threshold.saturating_sub(1));
            }
        }
        warn!("API key {} hit the rate limit", credential.index);
        self.record_failure(credential)
    }

    /// Record a successful call; the key's failure streak is cleared.
    pub fn record_success(&self, credential: &ActiveCredential) {
        let mut state = self.lock();
        if let Some(entry) = state.credentials.get_mut(credential.index) {
            if entry.failure_count > 0 {
                debug!("Resetting failure count for API key {}", credential.index);
            }
            entry.failure_count = 0;
            entry.status = CredentialStatus::Working;
        }
    }

    /// Clear every failure and cooldown, e.g. after keys were replaced.
    pub fn reset_all(&self) {
        let mut state = self.lock();
        for credential in state.credentials.iter_mut() {
            credential.reset();
        }
        info!("All API key cooldowns have been reset");
    }

    /// Snapshot of the pool for status reporting
    pub fn status(&self) -> KeyPoolStatus {
        let mut state = self.lock();
        let now = Utc::now();
        if !state.credentials.is_empty() {
            state.ensure_started();
        }
        state.refresh_cooldowns(&self.settings, now);

        let keys: Vec<CredentialReport> = state
            .credentials
            .iter()
            .enumerate()
            .map(|(index, credential)| CredentialReport {
                index,
                masked_key: mask_secret(&credential.secret),
                status: credential.status,
                failure_count: credential.failure_count,
                last_failure_at: credential.last_failure_at,
                cooldown_remaining_secs: cooldown_remaining(credential, &self.settings, now)
                    .map(|d| d.as_secs()),
            })
            .collect();

        KeyPoolStatus {
            total_keys: keys.len(),
            available_keys: keys
                .iter()
                .filter(|k| k.cooldown_remaining_secs.is_none())
                .count(),
            current_index: state.current_index,
            rotations: state.rotations,
            last_rotation: state.last_rotation,
            keys,
        }
    }
}

/// Pool snapshot
#[derive(Debug, Clone, Serialize)]
pub struct KeyPoolStatus {
    pub total_keys: usize,
    pub available_keys: usize,
    pub current_index: usize,
    pub rotations: u64,
    pub last_rotation: Option<DateTime<Utc>>,
    pub keys: Vec<CredentialReport>,
}

/// One key in a pool snapshot, secret masked
#[derive(Debug, Clone, Serialize)]
pub struct CredentialReport {
    pub index: usize,
    pub masked_key: String,
    pub status: CredentialStatus,
    pub failure_count: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub cooldown_remaining_secs: Option<u64>,
}
