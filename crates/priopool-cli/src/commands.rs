//! Command handlers for CLI subcommands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use priopool_runtime::{PoolConfig, WorkerPool};
use serde_json::json;
use tracing::{info, warn};

use crate::cli::{Commands, OutputFormat};
use crate::display::{self, Telemetry, HISTORY_LINES};
use crate::workload;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Options for the demo command.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub tasks: usize,
    pub task_duration: Duration,
    pub pause_after: Option<Duration>,
    pub pause_for: Duration,
    pub refresh: Duration,
    pub format: OutputFormat,
}

/// Execute a CLI command.
pub fn execute(command: Commands, config: PoolConfig) -> Result<()> {
    match command {
        Commands::Demo {
            tasks,
            task_ms,
            pause_after_ms,
            pause_for_ms,
            refresh_ms,
            format,
        } => {
            let options = DemoOptions {
                tasks,
                task_duration: Duration::from_millis(task_ms),
                pause_after: pause_after_ms.map(Duration::from_millis),
                pause_for: Duration::from_millis(pause_for_ms),
                refresh: Duration::from_millis(refresh_ms.max(1)),
                format,
            };
            run_demo(config, &options)
        }
        Commands::Repl => {
            // REPL is handled separately in main
            Ok(())
        }
    }
}

/// Runs the demo: submit a batch, watch it drain, shut down.
pub fn run_demo(config: PoolConfig, options: &DemoOptions) -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&interrupted))?;
    }

    let pool = WorkerPool::new(config)?;

    for (priority, name) in workload::batch(options.tasks) {
        pool.submit(
            priority,
            workload::simulated_task(options.task_duration),
            vec![json!(name)],
        )?;
    }
    info!(tasks = options.tasks, "demo batch submitted");

    let started = Instant::now();
    let mut resume_at: Option<Instant> = None;
    let mut paused_once = false;

    loop {
        let sample = Telemetry::capture(&pool);
        print_sample(&sample, options.format)?;

        if interrupted.load(Ordering::SeqCst) {
            warn!("interrupted, shutting down");
            break;
        }

        if let Some(after) = options.pause_after {
            if !paused_once && started.elapsed() >= after {
                pool.pause();
                paused_once = true;
                resume_at = Some(Instant::now() + options.pause_for);
            }
        }

        if let Some(at) = resume_at {
            if Instant::now() >= at {
                pool.resume();
                resume_at = None;
            }
        }

        if sample.stats.is_idle() && resume_at.is_none() {
            break;
        }

        thread::sleep(options.refresh);
    }

    pool.shutdown()?;

    let stats = pool.stats();
    let history = pool.recent_history(HISTORY_LINES);
    match options.format {
        OutputFormat::Text => {
            println!("All queued tasks completed.");
            println!("{}", stats);
            println!("History (last {}):", history.len());
            for line in display::format_history(&history) {
                println!("  {}", line);
            }
        }
        OutputFormat::Json => {
            let summary = json!({ "stats": stats, "history": history });
            println!("{}", serde_json::to_string(&summary)?);
        }
    }

    Ok(())
}

fn print_sample(sample: &Telemetry, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}\n", display::format_telemetry(sample)),
        OutputFormat::Json => println!("{}", serde_json::to_string(sample)?),
    }
    Ok(())
}
