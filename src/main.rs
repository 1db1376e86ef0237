//! Respite CLI - quick, situation-aware stress-relief suggestions

use clap::{CommandFactory, Parser};
use log::LevelFilter;

use respite::Result;
use respite::cli::{self, Cli, CommandContext, Commands, GlobalOptions};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` forces debug output for this crate; otherwise `RUST_LOG` applies,
/// defaulting to warnings only.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module("respite", LevelFilter::Debug);
    }
    builder.format_timestamp_millis().init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Suggest(args) => {
            let ctx = CommandContext::new(&opts)?;
            cli::suggest::run(&ctx, &args).await
        }
        Commands::Status => {
            let ctx = CommandContext::new(&opts)?;
            cli::status::run(&ctx, &opts)
        }
        Commands::Version => {
            println!("respite version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "respite", &mut std::io::stdout());
            Ok(())
        }
    }
}
