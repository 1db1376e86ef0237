//! Suggest command implementation

use colored::Colorize;
use log::debug;

use crate::cache::CacheStatus;
use crate::cli::{CommandContext, OutputFormat, SuggestArgs, progress};
use crate::error::Result;
use crate::models::{RawRequest, SuggestionResponse};
use crate::output;

/// One-line cache summary for debug output
fn cache_summary(status: &CacheStatus) -> String {
    let stats = &status.stats;
    let mut line = format!(
        "Cache: {}/{} entries, {} hits, {} misses",
        stats.size, stats.max_size, stats.hits, stats.misses
    );
    for entry in &status.entries {
        line.push_str(&format!(
            "; {} ({}s old, {}s left, {} bytes)",
            entry.key, entry.age_secs, entry.ttl_remaining_secs, entry.size_bytes
        ));
    }
    line
}

impl SuggestArgs {
    fn to_request(&self) -> RawRequest {
        RawRequest {
            situation: Some(self.situation.clone()),
            duration: Some(self.duration.clone()),
            age_group: self.age_group.clone(),
        }
    }
}

/// Run the suggest command: one pipeline request per repetition, then print
/// all responses.
pub async fn run(ctx: &CommandContext, args: &SuggestArgs) -> Result<()> {
    let request = args.to_request();
    let mut responses: Vec<SuggestionResponse> = Vec::with_capacity(args.repeat as usize);

    for round in 1..=args.repeat {
        debug!("Suggest round {}/{}", round, args.repeat);
        let spinner = progress::spinner("Finding a few good breaks...", ctx.format);
        let result = ctx.service.handle(&request).await;
        spinner.finish_and_clear();
        responses.push(result?);
    }
    debug!("{}", cache_summary(&ctx.service.cache().status()));

    output::print(responses.as_slice(), ctx.format)?;

    if ctx.format != OutputFormat::Json
        && responses.iter().any(|r| r.metadata.source.is_degraded())
    {
        eprintln!("{}", "Generation was unavailable; showing curated suggestions.".yellow());
    }
    Ok(())
}
