//! CLI command definitions and output formatting

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use tracing::debug;

use crate::domain::{SchedulingMechanism, Task, TaskStatus, Worker, WorkerStatus};
use crate::registry::TaskSnapshot;
use crate::service::DispatcherStatus;

/// taskdispatch - task submission service with FIFO, Round-Robin and LRU dispatch
#[derive(Parser)]
#[command(
    name = "td",
    about = "Task submission service with FIFO, Round-Robin and LRU dispatch",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Server URL used by client commands
    #[arg(short, long, global = true, help = "Server URL (default: derived from server.bind)")]
    pub server: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API and dispatcher in the foreground
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Submit a task
    Submit {
        /// Task name
        name: String,

        /// Stream the task belongs to
        #[arg(short = 't', long)]
        stream: String,

        /// Scheduling mechanism (FIFO, RoundRobin, LRU)
        #[arg(short, long)]
        mechanism: Option<SchedulingMechanism>,
    },

    /// List tasks with counts by status
    Tasks {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one task
    Task {
        /// Task ID
        id: String,
    },

    /// Manage workers
    Workers {
        #[command(subcommand)]
        command: WorkersCommand,
    },

    /// Show dispatcher counters and queue depth
    Stats {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Worker subcommands
#[derive(Debug, Subcommand)]
pub enum WorkersCommand {
    /// List registered workers
    List,

    /// Register a worker
    Add {
        /// Worker name
        name: String,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

/// Status word colored by lifecycle stage
pub fn status_label(status: TaskStatus) -> ColoredString {
    let word = status.to_string();
    match status {
        TaskStatus::Pending => word.yellow(),
        TaskStatus::InProgress => word.cyan(),
        TaskStatus::Completed => word.green(),
        TaskStatus::Failed => word.red(),
    }
}

fn worker_label(status: WorkerStatus) -> ColoredString {
    match status {
        WorkerStatus::Idle => status.to_string().dimmed(),
        WorkerStatus::Busy => status.to_string().cyan(),
    }
}

pub fn format_task(task: &Task) -> String {
    format!(
        "{}  {:<12} {:<20} {:<10} {}",
        task.id,
        status_label(task.status),
        task.name,
        task.stream,
        task.timestamp.format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn format_snapshot(snapshot: &TaskSnapshot) -> String {
    let counts = &snapshot.counts;
    let mut lines = vec![format!(
        "{} pending, {} in progress, {} completed, {} failed ({} total)",
        counts.pending.to_string().yellow(),
        counts.in_progress.to_string().cyan(),
        counts.completed.to_string().green(),
        counts.failed.to_string().red(),
        counts.total()
    )];
    lines.extend(snapshot.tasks.iter().map(format_task));
    lines.join("\n")
}

pub fn format_workers(workers: &[Worker]) -> String {
    if workers.is_empty() {
        return "No workers registered".to_string();
    }
    workers
        .iter()
        .map(|w| format!("{}  {:<6} {:<20} active={}", w.id, worker_label(w.status), w.name, w.active_tasks))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_dispatcher(status: &DispatcherStatus) -> String {
    let stats = &status.stats;
    [
        format!(
            "queue      {}/{} free",
            status.queue_available, status.queue_capacity
        ),
        format!(
            "routed     FIFO={} RoundRobin={} LRU={}",
            stats.routed_fifo, stats.routed_round_robin, stats.routed_lru
        ),
        format!("dispatched {}", stats.dispatched),
        format!("completed  {}", stats.completed.to_string().green()),
        format!("failed     {}", stats.failed.to_string().red()),
        format!("evicted    {} (LRU working set {})", stats.evicted, status.lru_working_set),
    ]
    .join("\n")
}

/// Client URL for a bind address: wildcard hosts are reached via loopback
pub fn server_url_for_bind(bind: &str) -> String {
    let bind = bind.trim();
    let (host, port) = bind.rsplit_once(':').unwrap_or((bind, "8080"));
    let host = match host {
        "" | "0.0.0.0" => "127.0.0.1",
        "[::]" => "[::1]",
        other => other,
    };
    format!("http://{host}:{port}")
}
