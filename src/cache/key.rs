//! Cache key generation

use crate::models::RequestParameters;

/// Build the cache key for a request: situation, duration and age group in
/// that order, joined with `-`. No normalization beyond what the caller
/// already applied.
pub fn cache_key(params: &RequestParameters) -> String {
    format!("{}-{}-{}", params.situation, params.duration, params.age_group)
}
