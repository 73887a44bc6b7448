//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use std::fmt;

/// Interactive chat client for prototyping AI agents.
///
/// Chats with a local mock agent for UI testing, or with an agent hosted on an
/// Azure AI Foundry project. Type `help` at the prompt for commands.
#[derive(Parser, Debug)]
#[command(name = "agent-cli", version, about, long_about = None)]
pub struct Args {
    /// Response source: mock (local canned replies) or foundry (hosted agent)
    #[arg(long, value_enum, default_value_t = AgentKind::Mock, env = "AGENT_CLI_AGENT")]
    pub agent: AgentKind,

    /// Display name of the agent; passed to the hosted service as its identity
    #[arg(long, value_name = "NAME", env = "AGENT_CLI_AGENT_NAME")]
    pub agent_name: Option<String>,

    /// Path of the line-history file
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<String>,

    /// Number of entries shown by the `history` command
    #[arg(long, value_name = "N")]
    pub history_limit: Option<usize>,

    /// Seed for the mock agent's random choices
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Log filter (e.g. debug, agent_cli=trace); overrides AGENT_CLI_LOG
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// Which response source backs the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    Mock,
    #[value(alias = "azure", alias = "remote")]
    Foundry,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Mock => write!(f, "mock"),
            AgentKind::Foundry => write!(f, "foundry"),
        }
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
