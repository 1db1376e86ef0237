//! Response cache for generated suggestions
//!
//! Memoizes successful generations per parameter triple for a TTL window,
//! bounded by entry count. State lives for the process lifetime only.

pub mod key;
pub mod storage;

use std::time::Duration;

/// Default time an entry stays valid
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60); // 1 hr

/// Default number of entries before FIFO eviction kicks in
pub const DEFAULT_MAX_SIZE: usize = 50;

// Re-export main types
pub use key::cache_key;
pub use storage::{CacheEntryInfo, CacheStats, CacheStatus, ResponseCache};
