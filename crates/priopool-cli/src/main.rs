//! Priopool console entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use priopool_cli::cli::{Cli, Commands};
use priopool_cli::commands;
use priopool_cli::repl::Repl;

fn main() {
    // Load .env.local if it exists (for PRIOPOOL_* settings)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt().with_env_filter(filter).with_target(false).init();

    let result = match cli.pool_config() {
        Ok(config) => match cli.command {
            Some(Commands::Repl) | None => run_repl(config),
            Some(cmd) => commands::execute(cmd, config),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_repl(config: priopool_runtime::PoolConfig) -> commands::Result<()> {
    let mut repl = Repl::new(config)?;
    repl.run()
}
