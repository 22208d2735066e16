//! Command-line interface definition using clap.

use std::time::Duration;

use clap::{Parser, Subcommand};
use priopool_runtime::{PoolConfig, Result as PoolResult};

/// Priopool - priority worker pool console
#[derive(Parser, Debug)]
#[command(name = "priopool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Number of worker threads (overrides PRIOPOOL_WORKERS)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Worker poll interval in milliseconds (overrides PRIOPOOL_POLL_INTERVAL_MS)
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// History records to retain, 0 for unbounded (overrides PRIOPOOL_HISTORY_CAPACITY)
    #[arg(long)]
    pub history_capacity: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch of simulated tasks and watch the pool drain
    Demo {
        /// Number of tasks to submit
        #[arg(short = 'n', long, default_value_t = 12)]
        tasks: usize,

        /// Simulated duration of each task in milliseconds
        #[arg(long, default_value_t = 500)]
        task_ms: u64,

        /// Pause the pool this many milliseconds after start
        #[arg(long)]
        pause_after_ms: Option<u64>,

        /// How long to stay paused in milliseconds
        #[arg(long, default_value_t = 1000)]
        pause_for_ms: u64,

        /// Telemetry refresh interval in milliseconds
        #[arg(long, default_value_t = 300)]
        refresh_ms: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Start interactive REPL mode
    Repl,
}

/// Output format for telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Builds the pool configuration: defaults, then environment, then flags.
    pub fn pool_config(&self) -> PoolResult<PoolConfig> {
        let mut config = PoolConfig::from_env()?;

        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(ms) = self.poll_interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(capacity) = self.history_capacity {
            config = config.with_history_capacity((capacity > 0).then_some(capacity));
        }

        config.validate()?;
        Ok(config)
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args should work (enters REPL mode)
        let cli = Cli::parse_from(["priopool"]);
        assert!(cli.command.is_none());
        assert!(cli.workers.is_none());
    }

    #[test]
    fn test_cli_parse_demo_defaults() {
        let cli = Cli::parse_from(["priopool", "demo"]);
        match cli.command {
            Some(Commands::Demo {
                tasks,
                task_ms,
                pause_after_ms,
                refresh_ms,
                format,
                ..
            }) => {
                assert_eq!(tasks, 12);
                assert_eq!(task_ms, 500);
                assert_eq!(pause_after_ms, None);
                assert_eq!(refresh_ms, 300);
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("Expected Demo command"),
        }
    }

    #[test]
    fn test_cli_parse_demo_options() {
        let cli = Cli::parse_from([
            "priopool",
            "-w",
            "3",
            "demo",
            "-n",
            "5",
            "--pause-after-ms",
            "200",
            "--format",
            "json",
        ]);
        assert_eq!(cli.workers, Some(3));
        match cli.command {
            Some(Commands::Demo {
                tasks,
                pause_after_ms,
                format,
                ..
            }) => {
                assert_eq!(tasks, 5);
                assert_eq!(pause_after_ms, Some(200));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected Demo command"),
        }
    }

    #[test]
    fn test_pool_config_from_flags() {
        let cli = Cli::parse_from([
            "priopool",
            "--workers",
            "2",
            "--poll-interval-ms",
            "50",
            "--history-capacity",
            "0",
        ]);
        let config = cli.pool_config().unwrap();

        assert_eq!(config.workers, 2);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.history_capacity, None);
    }

    #[test]
    fn test_pool_config_rejects_zero_workers() {
        let cli = Cli::parse_from(["priopool", "--workers", "0"]);
        assert!(cli.pool_config().is_err());
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::parse_from(["priopool", "-vvv"]);
        assert_eq!(cli.verbose, 3);
        assert_eq!(cli.log_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_cli_help() {
        // Verify help can be generated without panic
        Cli::command().debug_assert();
    }
}
