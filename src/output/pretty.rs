//! Human-oriented rendering with colors

use colored::Colorize;

use crate::models::{Category, Source, Suggestion, SuggestionResponse};

fn source_badge(source: Source) -> String {
    match source {
        Source::Generator => "fresh".green().to_string(),
        Source::Cache => "cached".cyan().to_string(),
        Source::Fallback => "curated".yellow().to_string(),
        Source::ErrorFallback => "curated (recovered)".red().to_string(),
    }
}

fn category_label(category: Category) -> String {
    match category {
        Category::Cognitive => "cognitive".blue().to_string(),
        Category::Behavioral => "behavioral".magenta().to_string(),
    }
}

fn render_suggestion(position: usize, suggestion: &Suggestion) -> String {
    let mut out = format!(
        "{}. {}  {} · {} min\n   {}\n",
        position,
        suggestion.title.bold(),
        category_label(suggestion.category),
        suggestion.duration.minutes(),
        suggestion.description
    );
    for (i, step) in suggestion.steps.iter().enumerate() {
        out.push_str(&format!("   {} {}\n", format!("{}.", i + 1).dimmed(), step));
    }
    out
}

/// Render one response as a headed list of activities
pub fn render_response(response: &SuggestionResponse) -> String {
    let meta = &response.metadata;
    let mut out = format!(
        "{} {} / {} min / {}  [{}]\n\n",
        "Break ideas for".bold(),
        meta.situation.to_string().cyan(),
        meta.duration.minutes(),
        meta.age_group.cyan(),
        source_badge(meta.source)
    );

    for (i, suggestion) in response.suggestions.iter().enumerate() {
        out.push_str(&render_suggestion(i + 1, suggestion));
        out.push('\n');
    }

    let stats = &meta.cache_stats;
    out.push_str(
        &format!(
            "cache: {} hits / {} misses ({:.0}%), {} of {} entries",
            stats.hits,
            stats.misses,
            stats.hit_rate * 100.0,
            stats.size,
            stats.max_size
        )
        .dimmed()
        .to_string(),
    );
    out
}
