//! CLI command definitions and handlers

use clap::{Args, Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod context;
pub mod progress;
pub mod status;
pub mod suggest;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// Respite - quick, situation-aware stress-relief suggestions
#[derive(Parser, Debug)]
#[command(name = "respite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "RESPITE_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "RESPITE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "RESPITE_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Skip the response cache
    #[arg(long, global = true, env = "RESPITE_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Generative service base URL (for testing against a local server)
    #[arg(long, global = true, env = "RESPITE_API_BASE", hide = true)]
    pub api_base: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Get three break suggestions for where you are and how long you have
    Suggest(SuggestArgs),

    /// Show configuration and API key status
    Status,

    /// Display version information
    Version,

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   respite completion bash > /etc/bash_completion.d/respite
  zsh:    respite completion zsh > \"${fpath[1]}/_respite\"
  fish:   respite completion fish > ~/.config/fish/completions/respite.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Request parameters for `suggest`. Values are passed through as given;
/// unknown ones are normalized by the pipeline rather than rejected.
#[derive(Debug, Clone, Args)]
pub struct SuggestArgs {
    /// Where you are: workplace, home, outside, job_hunting
    #[arg(long, short = 's', default_value = "workplace")]
    pub situation: String,

    /// Minutes available: 5, 15 or 30
    #[arg(long, short = 'd', default_value = "5")]
    pub duration: String,

    /// Audience, e.g. office_worker, student, senior, job_hunting
    #[arg(long, short = 'a')]
    pub age_group: Option<String>,

    /// Ask the same question several times in one run (exercises the cache)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub repeat: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_suggest_defaults() {
        let cli = Cli::parse_from(["respite", "suggest"]);
        let Commands::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        assert_eq!(args.situation, "workplace");
        assert_eq!(args.duration, "5");
        assert!(args.age_group.is_none());
        assert_eq!(args.repeat, 1);
    }

    #[test]
    fn test_suggest_passes_unknown_values_through() {
        let cli = Cli::parse_from([
            "respite", "suggest", "-s", "moon", "-d", "7", "-a", "astronaut", "--repeat", "2",
        ]);
        let Commands::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        assert_eq!(args.situation, "moon");
        assert_eq!(args.duration, "7");
        assert_eq!(args.age_group.as_deref(), Some("astronaut"));
        assert_eq!(args.repeat, 2);
    }

    #[test]
    fn test_repeat_is_bounded() {
        assert!(Cli::try_parse_from(["respite", "suggest", "--repeat", "0"]).is_err());
    }
}
