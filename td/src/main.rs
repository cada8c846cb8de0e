//! taskdispatch - task submission and dispatch service
//!
//! CLI entry point: `td serve` runs the API and dispatcher, every other
//! subcommand talks to a running server over HTTP.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use taskdispatch::api::build_router;
use taskdispatch::cli::{
    Cli, Command, OutputFormat, WorkersCommand, format_dispatcher, format_snapshot, format_task, format_workers,
    server_url_for_bind,
};
use taskdispatch::client::ApiClient;
use taskdispatch::config::Config;
use taskdispatch::daemon::Daemon;
use taskdispatch::dispatcher::SimulatedExecutor;
use taskdispatch::domain::{SchedulingMechanism, TaskId};
use taskdispatch::events::spawn_event_logger;

/// Setup logging with file output
fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskdispatch")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // Append: client commands and the server share one log file
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("taskdispatch.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let server_url = cli
        .server
        .clone()
        .unwrap_or_else(|| server_url_for_bind(&config.server.bind));

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { bind } => {
            debug!(?bind, "main: matched Serve command");
            cmd_serve(config, bind).await
        }
        Command::Submit {
            name,
            stream,
            mechanism,
        } => {
            debug!(%name, %stream, ?mechanism, "main: matched Submit command");
            cmd_submit(&server_url, &name, &stream, mechanism).await
        }
        Command::Tasks { format } => {
            debug!(?format, "main: matched Tasks command");
            cmd_tasks(&server_url, format).await
        }
        Command::Task { id } => {
            debug!(%id, "main: matched Task command");
            cmd_task(&server_url, &id).await
        }
        Command::Workers { command } => {
            debug!(?command, "main: matched Workers command");
            cmd_workers(&server_url, command).await
        }
        Command::Stats { format } => {
            debug!(?format, "main: matched Stats command");
            cmd_stats(&server_url, format).await
        }
        Command::Config => {
            debug!("main: matched Config command");
            cmd_config(&config)
        }
    }
}

/// Run the API and dispatcher until Ctrl-C
async fn cmd_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    debug!(?bind, "cmd_serve: called");
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let executor = Arc::new(SimulatedExecutor::new(config.executor.clone()));
    let daemon = Daemon::spawn(&config, executor)?;
    let event_logger = spawn_event_logger(daemon.events());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    let local_addr = listener.local_addr().context("Failed to read bound address")?;
    info!(%local_addr, "API listening");
    println!("taskdispatch listening on http://{local_addr} (Ctrl-C to stop)");

    let app = build_router(daemon.service().clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received, shutting down");
        })
        .await
        .context("HTTP server failed")?;

    let stats = daemon.shutdown().await?;
    event_logger.abort();
    println!(
        "Stopped: {} dispatched, {} completed, {} failed, {} evicted",
        stats.dispatched, stats.completed, stats.failed, stats.evicted
    );
    Ok(())
}

async fn cmd_submit(server: &str, name: &str, stream: &str, mechanism: Option<SchedulingMechanism>) -> Result<()> {
    let client = ApiClient::new(server)?;
    let task = client.submit(name, stream, mechanism).await?;
    println!("{}", format_task(&task));
    Ok(())
}

async fn cmd_tasks(server: &str, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(server)?;
    let snapshot = client.tasks().await?;
    match format {
        OutputFormat::Text => println!("{}", format_snapshot(&snapshot)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }
    Ok(())
}

async fn cmd_task(server: &str, id: &str) -> Result<()> {
    let id: TaskId = id.parse()?;
    let client = ApiClient::new(server)?;
    let task = client.task(&id).await?;
    println!("{}", format_task(&task));
    Ok(())
}

async fn cmd_workers(server: &str, command: WorkersCommand) -> Result<()> {
    let client = ApiClient::new(server)?;
    match command {
        WorkersCommand::List => {
            let workers = client.workers().await?;
            println!("{}", format_workers(&workers));
        }
        WorkersCommand::Add { name } => {
            let worker = client.register_worker(&name).await?;
            println!("Registered worker {} ({})", worker.name, worker.id);
        }
    }
    Ok(())
}

async fn cmd_stats(server: &str, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(server)?;
    let status = client.dispatcher().await?;
    match format {
        OutputFormat::Text => println!("{}", format_dispatcher(&status)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to render config")?;
    print!("{yaml}");
    Ok(())
}
