//! agent-cli - interactive terminal chat client for prototyping AI agents

use agent_cli::chat::{ChatOptions, ChatSession, Terminal};
use agent_cli::history::HistoryFile;
use agent_cli::storage::SessionStore;
use agent_cli::{agent, cli, config, interrupt, output, settings};
use anyhow::{Context, Result};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    // Variables from .env must be visible before clap reads its env fallbacks.
    dotenvy::dotenv().ok();

    let args = cli::Args::parse_args();
    let workspace = settings::discover()?;
    let config = config::Config::from_args(args, workspace)?;

    match output::logger::init(&config.log_filter) {
        Ok(path) => tracing::debug!(path = %path.display(), "log file"),
        Err(e) => eprintln!("Warning: {e:#}"),
    }
    tracing::info!(
        agent = %config.agent,
        name = %config.agent_name,
        history = %config.history_file.display(),
        "starting chat"
    );

    interrupt::register_signal_handler()?;

    let source = agent::build_source(&config)?;
    let history = HistoryFile::new(&config.history_file);
    let recall = history.load().unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{:#}", e), "could not read history file");
        Vec::new()
    });
    let reader = Terminal::new(&recall)?;

    let options = ChatOptions {
        width: None,
        max_width: config.max_width,
        history_recent: config.history_recent,
        spinner: true,
    };
    let mut session = ChatSession::new(
        reader,
        io::stdout(),
        source,
        history,
        SessionStore::new(&config.state_file),
        options,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let end = runtime.block_on(session.run())?;
    tracing::info!(?end, "chat ended");

    Ok(ExitCode::SUCCESS)
}
