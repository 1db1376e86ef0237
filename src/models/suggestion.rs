//! Suggestions and the response contract handed to the hosting layer

use serde::{Deserialize, Serialize};

use super::request::{ActivityDuration, RequestParameters, Situation};
use crate::cache::CacheStats;

/// Number of suggestions every response carries
pub const SUGGESTION_COUNT: usize = 3;

/// Kind of distraction an activity offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Done in the head: breathing focus, gratitude, visualization
    #[default]
    Cognitive,
    /// Involves doing something: stretching, walking, tidying
    Behavioral,
}

impl Category {
    /// Lenient mapping from whatever label the generative service returned.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        if label.starts_with("behav") {
            Some(Category::Behavioral)
        } else if label.starts_with("cogn") {
            Some(Category::Cognitive)
        } else {
            None
        }
    }
}

/// A single stress-relief activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: ActivityDuration,
    pub category: Category,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Suggestion {
    /// Fresh id for one emission of a suggestion
    pub fn fresh_id(prefix: &str) -> String {
        format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
    }
}

/// Where the suggestions in a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Generator,
    Fallback,
    ErrorFallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Generator => "generator",
            Source::Fallback => "fallback",
            Source::ErrorFallback => "error_fallback",
        }
    }

    /// Whether the response was degraded to curated content
    pub fn is_degraded(&self) -> bool {
        matches!(self, Source::Fallback | Source::ErrorFallback)
    }
}

/// Provenance attached to every response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub situation: Situation,
    pub duration: ActivityDuration,
    pub age_group: String,
    /// RFC 3339 time the response was assembled
    pub timestamp: String,
    pub source: Source,
    pub cache_stats: CacheStats,
}

/// `{ suggestions, metadata }` as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<Suggestion>,
    pub metadata: ResponseMetadata,
}

impl SuggestionResponse {
    pub fn new(
        params: &RequestParameters,
        suggestions: Vec<Suggestion>,
        source: Source,
        cache_stats: CacheStats,
    ) -> Self {
        Self {
            suggestions,
            metadata: ResponseMetadata {
                situation: params.situation,
                duration: params.duration,
                age_group: params.age_group.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                source,
                cache_stats,
            },
        }
    }
}
