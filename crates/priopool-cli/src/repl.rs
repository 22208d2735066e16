//! Interactive REPL (Read-Eval-Print Loop) for driving a worker pool.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use priopool_models::Priority;
use priopool_runtime::{PoolConfig, WorkerPool};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::commands::Result;
use crate::display::{self, HISTORY_LINES};
use crate::workload;

/// Default simulated duration for tasks added from the REPL.
const DEFAULT_TASK_MS: u64 = 1500;

/// Default number of tasks added by `batch`.
const DEFAULT_BATCH: usize = 10;

/// How often the signal watcher checks the termination flag.
const SIGNAL_TICK: Duration = Duration::from_millis(100);

/// A parsed REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Submit one simulated task.
    Add {
        priority: Priority,
        value: String,
        duration: Duration,
    },
    /// Submit a batch of simulated tasks with rotating priorities.
    Batch(usize),
    Pause,
    Resume,
    /// Discard every pending task.
    Clear,
    Status,
    Queue,
    Running,
    History(usize),
    Help,
    /// Drain and stop the pool, then leave the REPL.
    Shutdown,
}

/// Help lines shown by `help`.
static HELP: &[(&str, &str)] = &[
    ("add <priority> <value> [ms]", "Submit a task (priority: high|medium|low)"),
    ("batch [n]", "Submit n tasks with rotating priorities (default 10)"),
    ("pause", "Stop workers from taking new tasks"),
    ("resume", "Let workers take tasks again"),
    ("clear", "Discard all pending tasks"),
    ("status", "Show counters and running tasks"),
    ("queue", "List pending tasks in dispatch order"),
    ("running", "List tasks currently executing"),
    ("history [n]", "Show the last n finished tasks (default 50)"),
    ("help", "Show this help"),
    ("shutdown | quit", "Drain the queue, stop workers and exit"),
];

/// Parses one input line.
///
/// # Returns
///
/// `Ok(None)` for blank lines, or an error message for invalid input.
pub fn parse_command(line: &str) -> std::result::Result<Option<ReplCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let command = match command.trim_start_matches('/').to_ascii_lowercase().as_str() {
        "add" | "a" => {
            let (priority, value) = match args.as_slice() {
                [priority, value, ..] => (*priority, *value),
                _ => return Err("usage: add <priority> <value> [ms]".to_string()),
            };
            let priority: Priority = priority.parse().map_err(|e| format!("{}", e))?;
            let ms = match args.get(2) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map_err(|_| format!("invalid duration: {}", raw))?,
                None => DEFAULT_TASK_MS,
            };
            ReplCommand::Add {
                priority,
                value: value.to_string(),
                duration: Duration::from_millis(ms),
            }
        }
        "batch" | "b" => {
            let count = match args.first() {
                Some(raw) => raw
                    .parse::<usize>()
                    .map_err(|_| format!("invalid count: {}", raw))?,
                None => DEFAULT_BATCH,
            };
            ReplCommand::Batch(count)
        }
        "pause" | "p" => ReplCommand::Pause,
        "resume" | "r" => ReplCommand::Resume,
        "clear" => ReplCommand::Clear,
        "status" | "s" => ReplCommand::Status,
        "queue" | "q" => ReplCommand::Queue,
        "running" => ReplCommand::Running,
        "history" | "hist" => {
            let count = match args.first() {
                Some(raw) => raw
                    .parse::<usize>()
                    .map_err(|_| format!("invalid count: {}", raw))?,
                None => HISTORY_LINES,
            };
            ReplCommand::History(count)
        }
        "help" | "h" | "?" => ReplCommand::Help,
        "shutdown" | "quit" | "exit" => ReplCommand::Shutdown,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };

    Ok(Some(command))
}

/// Returns the path of the REPL line-history file.
pub fn history_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("priopool")
        .join("repl_history")
}

/// Loads line history from `path`, returning false if there was none.
pub fn load_history(editor: &mut DefaultEditor, path: &Path) -> bool {
    match editor.load_history(path) {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no previous REPL history");
            false
        }
    }
}

/// Saves line history to `path`, creating its directory if needed.
pub fn save_history(editor: &mut DefaultEditor, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    editor.save_history(path)?;
    Ok(())
}

/// Blocks until `flag` is raised, checking it every `tick`.
fn wait_for_flag(flag: &AtomicBool, tick: Duration) {
    while !flag.load(Ordering::SeqCst) {
        thread::sleep(tick);
    }
}

/// REPL session bound to one worker pool.
pub struct Repl {
    pool: Arc<WorkerPool>,
    editor: DefaultEditor,
    history_file: PathBuf,
    terminate: Arc<AtomicBool>,
}

impl Repl {
    /// Starts a pool and a line editor.
    ///
    /// SIGINT and SIGTERM raise a termination flag instead of killing the
    /// process, so the pool is always drained before exit.
    pub fn new(config: PoolConfig) -> Result<Self> {
        let terminate = Arc::new(AtomicBool::new(false));
        for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&terminate))?;
        }

        let pool = Arc::new(WorkerPool::new(config)?);
        let mut editor = DefaultEditor::new()?;

        let history_file = history_path();
        load_history(&mut editor, &history_file);

        Ok(Self {
            pool,
            editor,
            history_file,
            terminate,
        })
    }

    /// Drains the pool and exits once a termination signal arrives.
    ///
    /// The prompt blocks in `readline`, so the watcher runs on its own
    /// thread and does not wait for the next input line.
    fn spawn_signal_watcher(&self) -> Result<()> {
        let pool = Arc::clone(&self.pool);
        let terminate = Arc::clone(&self.terminate);

        thread::Builder::new()
            .name("priopool-signals".to_string())
            .spawn(move || {
                wait_for_flag(&terminate, SIGNAL_TICK);
                warn!("termination signal received, shutting down");
                let code = match pool.shutdown() {
                    Ok(()) => {
                        println!("\nAll queued tasks completed. {}", pool.stats());
                        0
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        1
                    }
                };
                process::exit(code);
            })?;
        Ok(())
    }

    /// Reads and runs commands until shutdown, EOF or Ctrl-C.
    pub fn run(&mut self) -> Result<()> {
        println!(
            "priopool console - {} workers. Type 'help' for commands.",
            self.pool.worker_count()
        );

        self.spawn_signal_watcher()?;

        loop {
            if self.terminate.load(Ordering::SeqCst) {
                break;
            }

            let prompt = if self.pool.is_paused() {
                "priopool (paused)> "
            } else {
                "priopool> "
            };

            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    match parse_command(&line) {
                        Ok(Some(ReplCommand::Shutdown)) => break,
                        Ok(Some(command)) => self.handle(command),
                        Ok(None) => {}
                        Err(msg) => println!("{}", msg),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        self.save_history();
        self.shutdown()
    }

    fn shutdown(&self) -> Result<()> {
        println!(
            "Graceful shutdown initiated ({} pending, {} running)...",
            self.pool.queue_size(),
            self.pool.active_tasks()
        );
        self.pool.shutdown()?;
        println!("All queued tasks completed. {}", self.pool.stats());
        Ok(())
    }

    fn save_history(&mut self) {
        if let Err(e) = save_history(&mut self.editor, &self.history_file) {
            debug!(error = %e, "failed to save REPL history");
        }
    }

    fn handle(&self, command: ReplCommand) {
        match command {
            ReplCommand::Add {
                priority,
                value,
                duration,
            } => {
                let payload = workload::simulated_task(duration);
                match self.pool.submit(priority, payload, vec![json!(value)]) {
                    Ok(id) => println!("[{}] Task added: {} ({})", priority, value, id.short()),
                    Err(e) => println!("Error: {}", e),
                }
            }
            ReplCommand::Batch(count) => {
                for (priority, name) in workload::batch(count) {
                    let payload = workload::simulated_task(Duration::from_millis(DEFAULT_TASK_MS));
                    if let Err(e) = self.pool.submit(priority, payload, vec![json!(name)]) {
                        println!("Error: {}", e);
                        return;
                    }
                    println!("[{}] Task added: {}", priority, name);
                }
            }
            ReplCommand::Pause => {
                self.pool.pause();
                println!("Paused. Running tasks will finish; nothing new starts.");
            }
            ReplCommand::Resume => {
                self.pool.resume();
                println!("Resumed.");
            }
            ReplCommand::Clear => {
                let count = self.pool.clear_queue();
                info!(count, "queue cleared from REPL");
                println!("Cleared {} pending tasks from queue.", count);
            }
            ReplCommand::Status => {
                println!("{}", self.pool.stats());
                println!("{}", display::format_running(&self.pool.current_task()));
            }
            ReplCommand::Queue => {
                let lines = display::format_queue(&self.pool.get_queue_items());
                if lines.is_empty() {
                    println!("Queue is empty.");
                }
                for line in lines {
                    println!("  {}", line);
                }
            }
            ReplCommand::Running => {
                println!("{}", display::format_running(&self.pool.current_task()));
            }
            ReplCommand::History(count) => {
                let lines = display::format_history(&self.pool.recent_history(count));
                if lines.is_empty() {
                    println!("No finished tasks yet.");
                }
                for line in lines {
                    println!("  {}", line);
                }
            }
            ReplCommand::Help => {
                println!("Commands:");
                for (usage, brief) in HELP {
                    println!("  {:<30} {}", usage, brief);
                }
            }
            ReplCommand::Shutdown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::History;

    #[test]
    fn test_parse_blank() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_add() {
        let cmd = parse_command("add high report 250").unwrap().unwrap();
        assert_eq!(
            cmd,
            ReplCommand::Add {
                priority: Priority::High,
                value: "report".to_string(),
                duration: Duration::from_millis(250),
            }
        );
    }

    #[test]
    fn test_parse_add_default_duration() {
        let cmd = parse_command("/add 3 cleanup").unwrap().unwrap();
        assert_eq!(
            cmd,
            ReplCommand::Add {
                priority: Priority::Low,
                value: "cleanup".to_string(),
                duration: Duration::from_millis(DEFAULT_TASK_MS),
            }
        );
    }

    #[test]
    fn test_parse_add_errors() {
        assert!(parse_command("add high").is_err());
        assert!(parse_command("add urgent x").unwrap_err().contains("unknown priority"));
        assert!(parse_command("add low x soon").unwrap_err().contains("invalid duration"));
    }

    #[test]
    fn test_parse_batch_and_history() {
        assert_eq!(parse_command("batch").unwrap(), Some(ReplCommand::Batch(10)));
        assert_eq!(parse_command("batch 3").unwrap(), Some(ReplCommand::Batch(3)));
        assert_eq!(
            parse_command("history").unwrap(),
            Some(ReplCommand::History(HISTORY_LINES))
        );
        assert_eq!(parse_command("hist 5").unwrap(), Some(ReplCommand::History(5)));
        assert!(parse_command("batch many").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("PAUSE").unwrap(), Some(ReplCommand::Pause));
        assert_eq!(parse_command("resume").unwrap(), Some(ReplCommand::Resume));
        assert_eq!(parse_command("clear").unwrap(), Some(ReplCommand::Clear));
        assert_eq!(parse_command("q").unwrap(), Some(ReplCommand::Queue));
        assert_eq!(parse_command("quit").unwrap(), Some(ReplCommand::Shutdown));
        assert_eq!(parse_command("?").unwrap(), Some(ReplCommand::Help));
    }

    #[test]
    fn test_parse_unknown() {
        let err = parse_command("launch").unwrap_err();
        assert!(err.contains("unknown command: launch"));
    }

    #[test]
    fn test_history_path() {
        let path = history_path();
        assert!(path.ends_with("priopool/repl_history"));
    }

    #[test]
    fn test_history_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("repl_history");

        let mut editor = DefaultEditor::new().unwrap();
        assert!(!load_history(&mut editor, &path));

        editor.add_history_entry("add high report").unwrap();
        editor.add_history_entry("status").unwrap();
        save_history(&mut editor, &path).unwrap();
        assert!(path.exists());

        let mut reloaded = DefaultEditor::new().unwrap();
        assert!(load_history(&mut reloaded, &path));
        assert_eq!(reloaded.history().len(), 2);
    }

    #[test]
    fn test_wait_for_flag_returns_when_raised() {
        let flag = Arc::new(AtomicBool::new(false));

        let raiser = Arc::clone(&flag);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            raiser.store(true, Ordering::SeqCst);
        });

        wait_for_flag(&flag, Duration::from_millis(5));
        assert!(flag.load(Ordering::SeqCst));
        handle.join().unwrap();
    }
}
