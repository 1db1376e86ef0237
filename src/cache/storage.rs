//! In-memory TTL cache with FIFO eviction
//!
//! Entries expire lazily on read. When the cache is full the oldest inserted
//! entry is evicted, regardless of how recently it was read.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::Suggestion;

use super::{DEFAULT_MAX_SIZE, DEFAULT_TTL};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<Suggestion>,
    inserted_at: Instant,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        Some(entry)
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            self.entries.remove(&oldest);
            debug!("Cache evicted oldest entry: {}", oldest);
        }
    }
}

/// Shared response cache for generated suggestions
pub struct ResponseCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    max_size: usize,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_SIZE)
    }
}

impl ResponseCache {
    /// Create a cache. A `max_size` of zero is raised to one.
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        debug!("Cache initialized with TTL {:?}, max size {}", ttl, max_size);
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
            max_size: max_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Look up a key, counting the hit or miss. Expired entries are removed
    /// and count as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<Suggestion>> {
        let mut state = self.lock();
        let now = Instant::now();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                debug!("Cache miss: {}", key);
                return None;
            }
            Some(entry) => now > entry.expires_at,
        };

        if expired {
            state.remove(key);
            state.misses += 1;
            debug!("Cache expired: {}", key);
            return None;
        }

        state.hits += 1;
        debug!("Cache hit: {}", key);
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store a value. Inserting a new key into a full cache evicts the oldest
    /// inserted entry first; re-setting a key replaces it and moves it to the
    /// back of the insertion order.
    pub fn set(&self, key: &str, value: Vec<Suggestion>) {
        let mut state = self.lock();

        if state.remove(key).is_none() && state.entries.len() >= self.max_size {
            state.evict_oldest();
        }

        let now = Instant::now();
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: now,
                expires_at: now + self.ttl,
            },
        );
        state.order.push_back(key.to_string());
        debug!("Cache stored: {} (ttl {:?})", key, self.ttl);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Hit/miss counters are kept.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let removed = state.entries.len();
        state.entries.clear();
        state.order.clear();
        debug!("Cache cleared {} entries", removed);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats::from_counts(state.hits, state.misses, state.entries.len(), self.max_size)
    }

    /// Stats plus a per-entry breakdown, oldest first
    pub fn status(&self) -> CacheStatus {
        let state = self.lock();
        let now = Instant::now();

        let entries = state
            .order
            .iter()
            .filter_map(|key| state.entries.get(key).map(|entry| (key, entry)))
            .map(|(key, entry)| CacheEntryInfo {
                key: key.clone(),
                age_secs: now.duration_since(entry.inserted_at).as_secs(),
                ttl_remaining_secs: entry.expires_at.saturating_duration_since(now).as_secs(),
                size_bytes: serde_json::to_vec(&entry.value)
                    .map(|bytes| bytes.len())
                    .unwrap_or(0),
            })
            .collect();

        CacheStatus {
            stats: CacheStats::from_counts(
                state.hits,
                state.misses,
                state.entries.len(),
                self.max_size,
            ),
            entries,
        }
    }
}

/// Hit/miss statistics reported in every response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
}

impl CacheStats {
    fn from_counts(hits: u64, misses: u64, size: usize, max_size: usize) -> Self {
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        Self {
            hits,
            misses,
            hit_rate,
            size,
            max_size,
        }
    }
}

/// One cached entry in a status report
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub age_secs: u64,
    pub ttl_remaining_secs: u64,
    pub size_bytes: usize,
}

/// Cache state for status output
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub stats: CacheStats,
    pub entries: Vec<CacheEntryInfo>,
}
