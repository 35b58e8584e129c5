//! hrdesk CLI - HR console session client

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "hrdesk")]
#[command(about = "Sign in to the HR console backend and manage users")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Directory holding the session token, cached user and log file
    #[arg(short = 'd', long, global = true, env = "HRDESK_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Configuration file (TOML or YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Backend origin, overrides the configuration file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Timeout for the command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_config =
        config::load_session_config(cli.config.as_deref(), cli.state_dir, cli.base_url)?;
    logging::init_logging(
        cli.log_level.into(),
        &session_config.state_dir,
        cli.no_file_log,
    )?;

    debug!(base_url = %session_config.base_url, "starting hrdesk");

    // Long-running commands ignore the timeout
    let timeout = if cli.command.is_long_running() {
        0
    } else {
        cli.timeout
    };

    if timeout == 0 {
        if let Err(e) = cli.command.execute(session_config).await {
            error!("Command failed: {e}");
            std::process::exit(1);
        }
    } else {
        let timeout_duration = Duration::from_secs(timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(session_config)).await {
            Ok(Ok(())) => {
                debug!("Command completed successfully");
            }
            Ok(Err(e)) => {
                error!("Command failed: {e}");
                std::process::exit(1);
            }
            Err(_) => {
                error!("Command timed out after {timeout} seconds");
                std::process::exit(1);
            }
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
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
