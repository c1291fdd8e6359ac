//! TaskMate CLI - manage tasks against the TaskMate API

mod commands;
mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use commands::{Commands, TerminalNavigator};
use config::{Dirs, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use taskmate_client::{ApiClient, FileSessionStore};
use tracing::{Level, debug, error, info};

#[derive(Parser)]
#[command(name = "taskmate")]
#[command(about = "Manage your TaskMate tasks from the terminal")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for the session file and logs
    #[arg(short = 'd', long, global = true, env = "TASKMATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dirs = Dirs::resolve(cli.data_dir.clone());

    logging::init_logging(cli.log_level.into(), dirs.data_dir(), cli.no_file_log)?;

    let config_file = cli.config.clone().or_else(|| dirs.default_config_file());
    if let Some(path) = &config_file {
        info!("Loading configuration from: {}", path.display());
    }
    let settings = Settings::load(config_file.as_deref())?;

    let session_path = dirs.session_file(&settings);
    let session = FileSessionStore::open(&session_path)
        .with_context(|| format!("Failed to open session file {}", session_path.display()))?;

    let client = ApiClient::builder()
        .base_url(settings.api.base_url.as_str())
        .timeout(settings.api.timeout())
        .renewal(settings.api.renewal_mode())
        .session(Arc::new(session))
        .navigator(Arc::new(TerminalNavigator))
        .build()?;

    info!(base_url = %client.base_url(), "Starting TaskMate CLI");

    match cli.command.execute(&client).await {
        Ok(()) => {
            debug!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
