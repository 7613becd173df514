mod api;
mod config;
mod serve;
mod sessions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use copilot_history_logging::{init_tracing, LogFormat};
use copilot_history_sessions::{SessionHistory, SessionStore};

use config::HistoryConfig;
use sessions::HistoryAction;

#[derive(Parser, Debug)]
#[command(
    name = "copilot-history",
    about = "Search and browse Copilot CLI chat history",
    version,
    author
)]
struct Cli {
    /// Directory holding the session logs (overrides SESSION_STATE_DIR)
    #[arg(long, global = true)]
    session_dir: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "pretty")]
    log_format: LogFormatChoice,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    History(HistoryAction),

    /// Serve the history over HTTP
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    let log_level = cli.log_level.as_deref().unwrap_or(config.log_level());
    init_tracing(log_level, cli.log_format.into());

    let sessions_dir = config.session_dir(cli.session_dir.as_deref());
    tracing::debug!(dir = %sessions_dir.display(), "using session directory");
    let history = SessionHistory::new(SessionStore::with_dir(sessions_dir));

    match cli.command {
        Commands::History(action) => sessions::handle_history_command(action, &history, &config),
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.port());
            serve::handle_serve_command(history, &config, port).await
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<HistoryConfig> {
    match path {
        Some(path) => HistoryConfig::load(path)?
            .with_context(|| format!("Config file not found: {}", path.display())),
        None => match HistoryConfig::default_path() {
            Some(path) => Ok(HistoryConfig::load(&path)?.unwrap_or_default()),
            None => Ok(HistoryConfig::default()),
        },
    }
}
