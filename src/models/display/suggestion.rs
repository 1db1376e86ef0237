//! Suggestion display model

use serde::Serialize;
use tabled::Tabled;

use crate::models::{Category, Suggestion};

/// Suggestion display model for table output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct SuggestionDisplay {
    #[tabled(rename = "#")]
    pub position: usize,

    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "TYPE")]
    pub category: String,

    #[tabled(rename = "MIN")]
    pub minutes: u32,

    #[tabled(rename = "STEPS")]
    pub steps: usize,

    #[tabled(rename = "SOURCE")]
    pub source: String,
}

impl SuggestionDisplay {
    /// Build a row; `position` is 1-based within the response.
    pub fn new(position: usize, suggestion: &Suggestion, source: &str) -> Self {
        Self {
            position,
            title: suggestion.title.clone(),
            category: match suggestion.category {
                Category::Cognitive => "cognitive".to_string(),
                Category::Behavioral => "behavioral".to_string(),
            },
            minutes: suggestion.duration.minutes(),
            steps: suggestion.steps.len(),
            source: source.to_string(),
        }
    }
}
