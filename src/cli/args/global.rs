//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global flags, captured once after parsing and handed to every command.
///
/// Precedence is CLI flag > environment variable > config file > default.
/// This struct holds the CLI/env layer; the config file is merged in
/// `CommandContext`.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.respite/config.yaml)
    pub config: Option<String>,

    /// Skip the response cache
    pub no_cache: bool,

    /// Generative service base URL override
    pub api_base: Option<String>,
}

impl GlobalOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            no_cache: cli.no_cache,
            api_base: cli.api_base.clone(),
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Get API base override as `Option<&str>`.
    pub fn api_base_ref(&self) -> Option<&str> {
        self.api_base.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_global_options_from_cli() {
        let cli = Cli::parse_from([
            "respite",
            "--format",
            "json",
            "--config",
            "/custom/path",
            "--no-cache",
            "--api-base",
            "http://localhost:8080",
            "status",
        ]);
        let opts = GlobalOptions::from_cli(&cli);

        assert_eq!(opts.format, OutputFormat::Json);
        assert_eq!(opts.config_ref(), Some("/custom/path"));
        assert_eq!(opts.api_base_ref(), Some("http://localhost:8080"));
        assert!(opts.no_cache);
    }

    #[test]
    fn test_global_options_none_accessors() {
        let opts = GlobalOptions {
            format: OutputFormat::Pretty,
            config: None,
            no_cache: false,
            api_base: None,
        };

        assert_eq!(opts.config_ref(), None);
        assert_eq!(opts.api_base_ref(), None);
        assert!(!opts.no_cache);
    }
}
