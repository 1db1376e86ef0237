//! Status command implementation

use colored::Colorize;
use serde::Serialize;

use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::keys::KeyPoolStatus;
use crate::models::KeyDisplay;
use crate::output::{self, Formattable, json::format_json, table::format_table};

/// Configuration and key pool snapshot
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub config_path: String,
    pub api_base: String,
    pub model: String,
    pub max_retries: u32,
    pub attempt_timeout_secs: u64,
    pub request_deadline_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_size: usize,
    pub cache_enabled: bool,
    pub keys: KeyPoolStatus,
}

impl StatusReport {
    fn key_rows(&self) -> Vec<KeyDisplay> {
        self.keys
            .keys
            .iter()
            .map(|report| KeyDisplay::new(report, self.keys.current_index))
            .collect()
    }

    fn render_pretty(&self) -> String {
        let mut out = format!("{}\n\n", "Respite Configuration Status".bold());
        out.push_str(&format!("Config file: {}\n", self.config_path.cyan()));
        out.push_str(&format!("Endpoint:    {}\n", self.api_base.cyan()));
        out.push_str(&format!("Model:       {}\n\n", self.model));

        if self.keys.total_keys == 0 {
            out.push_str(&format!("{} No API keys configured\n", "✗".red()));
            out.push_str("  → Set GEMINI_API_KEY_1..3 or GEMINI_API_KEY\n");
            out.push_str("  → Or list api_keys in the config file\n");
            out.push_str("  → Until then every suggestion comes from the curated pool\n");
        } else {
            out.push_str(&format!(
                "{} {} API key(s), {} available\n",
                "✓".green(),
                self.keys.total_keys,
                self.keys.available_keys
            ));
            out.push_str(&format_table(&self.key_rows()));
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&format!(
            "{} Retries: {} per request, {}s per attempt, {}s overall\n",
            "○".dimmed(),
            self.max_retries,
            self.attempt_timeout_secs,
            self.request_deadline_secs
        ));
        if self.cache_enabled {
            out.push_str(&format!(
                "{} Cache: up to {} entries for {}s\n",
                "○".dimmed(),
                self.cache_max_size,
                self.cache_ttl_secs
            ));
        } else {
            out.push_str(&format!("{} Cache: disabled (--no-cache)\n", "○".dimmed()));
        }
        out
    }
}

impl Formattable for StatusReport {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(format_json(self)?),
            OutputFormat::Table => Ok(format_table(&self.key_rows())),
            OutputFormat::Pretty => Ok(self.render_pretty()),
        }
    }
}

fn config_path_label(opts: &GlobalOptions) -> String {
    match opts.config_ref() {
        Some(path) => path.to_string(),
        None => Config::default_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "(unknown home directory)".to_string()),
    }
}

/// Run the status command to display configuration and key status
pub fn run(ctx: &CommandContext, opts: &GlobalOptions) -> Result<()> {
    let config = &ctx.config;
    let report = StatusReport {
        config_path: config_path_label(opts),
        api_base: config.generation.api_base.clone(),
        model: config.generation.model.clone(),
        max_retries: config.retry.max_retries,
        attempt_timeout_secs: config.retry.attempt_timeout_secs,
        request_deadline_secs: config.retry.request_deadline_secs,
        cache_ttl_secs: config.cache.ttl_secs,
        cache_max_size: config.cache.max_size,
        cache_enabled: !opts.no_cache,
        keys: ctx.key_pool.status(),
    };

    output::print(&report, ctx.format)
}
