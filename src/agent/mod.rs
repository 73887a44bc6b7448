//! Response sources: the capability the chat loop talks to.
//!
//! A `ResponseSource` turns one user message into an ordered, finite sequence
//! of `AgentEvent`s. Two variants exist: a local mock for UI prototyping and a
//! remote source backed by the hosted agent service.

pub mod error;
pub mod mock;
pub mod remote;

use anyhow::Result;
use async_trait::async_trait;

use crate::cli::AgentKind;
use crate::config::Config;
use crate::foundry::FoundryService;
use crate::message::Message;
use crate::storage::SessionStore;

pub use error::AgentError;
pub use mock::MockSource;
pub use remote::{AgentService, RemoteSource, SessionHandle};

/// One thing the agent did during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// The agent invoked a tool. Rendered, never executed locally.
    ToolCall { tool: String, detail: String },
    AssistantText { text: String },
}

impl AgentEvent {
    pub fn into_message(self) -> Message {
        match self {
            AgentEvent::ToolCall { tool, detail } => Message::tool(tool, detail),
            AgentEvent::AssistantText { text } => Message::assistant(text),
        }
    }
}

/// Events of a single turn, in the order the agent produced them.
///
/// Consuming the iterator drains it; a turn cannot be replayed.
#[derive(Debug)]
pub struct AgentEvents {
    inner: std::vec::IntoIter<AgentEvent>,
}

impl AgentEvents {
    pub fn new(events: Vec<AgentEvent>) -> Self {
        Self {
            inner: events.into_iter(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }
}

impl Iterator for AgentEvents {
    type Item = AgentEvent;

    fn next(&mut self) -> Option<AgentEvent> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for AgentEvents {}

impl FromIterator<AgentEvent> for AgentEvents {
    fn from_iter<I: IntoIterator<Item = AgentEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Snapshot shown by the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: String,
    pub kind: &'static str,
    pub initialized: bool,
    /// Source-specific key/value pairs, in display order.
    pub details: Vec<(String, String)>,
}

#[async_trait]
pub trait ResponseSource: Send {
    /// Display name used in panel titles.
    fn name(&self) -> &str;

    /// Submit one user message and collect the agent's events for the turn.
    async fn send(&mut self, text: &str) -> Result<AgentEvents, AgentError>;

    /// Turns recorded before this process started, e.g. on a resumed remote
    /// thread. Each event is handed out once.
    fn take_restored(&mut self) -> Vec<AgentEvent> {
        Vec::new()
    }

    /// Forget the conversation so the next message starts fresh.
    async fn reset(&mut self) -> Result<(), AgentError> {
        Ok(())
    }

    fn status(&self) -> SourceStatus;
}

/// Build the response source selected by the configuration.
pub fn build_source(config: &Config) -> Result<Box<dyn ResponseSource>> {
    match config.agent {
        AgentKind::Mock => Ok(Box::new(MockSource::new(&config.agent_name, &config.mock))),
        AgentKind::Foundry => {
            let foundry = config
                .foundry
                .clone()
                .ok_or_else(|| anyhow::anyhow!("foundry agent selected but not configured"))?;
            let store = SessionStore::new(&config.state_file);
            let service = FoundryService::new(foundry, store)?;
            Ok(Box::new(RemoteSource::new(&config.agent_name, service)))
        }
    }
}
