//! Remote response source backed by a hosted agent service.

use async_trait::async_trait;

use super::{AgentError, AgentEvent, AgentEvents, ResponseSource, SourceStatus};

/// Reply used when a run finishes without producing any events.
pub const EMPTY_RUN_FALLBACK: &str =
    "I wasn't able to generate a response. Please try rephrasing your question.";

/// Conversation handle returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub agent_id: String,
    /// Name the service knows the agent by; may differ from the requested label.
    pub agent_name: String,
    pub thread_id: String,
}

/// The hosted agent service, as seen by the chat client.
///
/// Credential acquisition, agent provisioning and the wire protocol all live
/// behind this trait.
#[async_trait]
pub trait AgentService: Send {
    /// Short identifier of the backend, shown by `status`.
    fn kind(&self) -> &'static str;

    /// Resolve (or provision) the agent called `name` and open or resume a
    /// conversation thread with it.
    async fn create_or_reuse_session(&mut self, name: &str) -> Result<SessionHandle, AgentError>;

    /// Post one user message and wait for the agent to finish its run.
    async fn post_message(
        &mut self,
        session: &SessionHandle,
        text: &str,
    ) -> Result<AgentEvents, AgentError>;

    /// Events of the turns already recorded on the session's thread, oldest
    /// first. Empty for a fresh thread.
    async fn conversation(&mut self, _session: &SessionHandle) -> Result<AgentEvents, AgentError> {
        Ok(AgentEvents::new(Vec::new()))
    }

    /// Drop the conversation thread.
    async fn end_session(&mut self, session: &SessionHandle) -> Result<(), AgentError>;

    /// Extra status rows, e.g. the service endpoint.
    fn details(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

pub struct RemoteSource<S> {
    name: String,
    service: S,
    session: Option<SessionHandle>,
    turns: usize,
    /// Earlier turns of a resumed thread, not yet handed to the chat loop.
    restored: Vec<AgentEvent>,
}

impl<S: AgentService> RemoteSource<S> {
    pub fn new(name: &str, service: S) -> Self {
        Self {
            name: name.to_string(),
            service,
            session: None,
            turns: 0,
            restored: Vec::new(),
        }
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    /// Open the session on first use so that a failure here is reported like
    /// any other turn failure instead of aborting startup.
    async fn ensure_session(&mut self) -> Result<SessionHandle, AgentError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }

        let session = self.service.create_or_reuse_session(&self.name).await?;
        tracing::info!(
            agent_id = %session.agent_id,
            thread_id = %session.thread_id,
            "remote session ready"
        );
        self.name = session.agent_name.clone();
        self.session = Some(session.clone());

        match self.service.conversation(&session).await {
            Ok(events) => {
                self.restored = events.collect();
                if !self.restored.is_empty() {
                    tracing::info!(events = self.restored.len(), "restored earlier conversation");
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not load earlier conversation"),
        }

        Ok(session)
    }
}

#[async_trait]
impl<S: AgentService> ResponseSource for RemoteSource<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, text: &str) -> Result<AgentEvents, AgentError> {
        let session = self.ensure_session().await?;
        let events = self.service.post_message(&session, text).await?;
        self.turns += 1;

        if events.is_empty() {
            tracing::warn!(thread_id = %session.thread_id, "run produced no events");
            return Ok(AgentEvents::new(vec![AgentEvent::AssistantText {
                text: EMPTY_RUN_FALLBACK.to_string(),
            }]));
        }

        Ok(events)
    }

    fn take_restored(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.restored)
    }

    async fn reset(&mut self) -> Result<(), AgentError> {
        self.turns = 0;
        self.restored.clear();
        match self.session.take() {
            Some(session) => self.service.end_session(&session).await,
            None => Ok(()),
        }
    }

    fn status(&self) -> SourceStatus {
        let mut details = vec![("Turns".to_string(), self.turns.to_string())];
        if let Some(session) = &self.session {
            details.push(("Agent id".to_string(), session.agent_id.clone()));
            details.push(("Thread id".to_string(), session.thread_id.clone()));
        }
        details.extend(self.service.details());

        SourceStatus {
            name: self.name.clone(),
            kind: self.service.kind(),
            initialized: self.session.is_some(),
            details,
        }
    }
}
