//! `AgentService` implementation for the hosted agent service.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};

use super::auth::Credential;
use super::client::FoundryClient;
use super::steps::{message_text, plan_steps, StepOutcome};
use super::tools;
use super::types::{
    RawAgent, RawConnectionList, RawCreated, RawList, RawMessage, RawRun, RawStep, RawThread, RunPhase,
};
use crate::agent::{AgentError, AgentEvent, AgentEvents, AgentService, SessionHandle};
use crate::config::FoundryConfig;
use crate::storage::SessionStore;

pub struct FoundryService {
    client: FoundryClient,
    config: FoundryConfig,
    store: SessionStore,
}

impl FoundryService {
    pub fn new(config: FoundryConfig, store: SessionStore) -> Result<Self> {
        let credential = Credential::new(config.access_token.clone());
        let client = FoundryClient::new(&config.project_endpoint, credential)?;
        Ok(Self { client, config, store })
    }

    /// Look the agent up by configured id (or the one saved with the last
    /// thread), then by name.
    async fn find_agent(&mut self, name: &str) -> Option<RawAgent> {
        let known_id = self.config.agent_id.clone().or_else(|| self.store.load().agent_id);
        if let Some(id) = known_id {
            match self.client.get::<RawAgent>(&format!("assistants/{}", id)).await {
                Ok(agent) => {
                    tracing::info!(agent_id = %agent.id, "found agent by id");
                    return Some(agent);
                }
                Err(e) => tracing::warn!(agent_id = %id, error = %e, "could not retrieve agent by id"),
            }
        }

        match self.client.get::<RawList<RawAgent>>("assistants?limit=100").await {
            Ok(list) => list
                .data
                .into_iter()
                .find(|agent| agent.name.as_deref() == Some(name)),
            Err(e) => {
                tracing::warn!(error = %e, "error searching for agent by name");
                None
            }
        }
    }

    async fn bing_connection(&mut self) -> Option<String> {
        match self.client.get::<RawConnectionList>("connections").await {
            Ok(list) => {
                let found = tools::find_bing_connection(&list.value).map(str::to_string);
                if found.is_none() {
                    tracing::warn!(
                        "no bing grounding connection found; create a connection with type '{}'",
                        tools::BING_CONNECTION_TYPE
                    );
                }
                found
            }
            Err(e) => {
                tracing::warn!(error = %e, "error listing project connections");
                None
            }
        }
    }

    /// Create the agent, or bring an existing one up to date with the config.
    async fn provision_agent(&mut self, name: &str) -> Result<RawAgent, AgentError> {
        let existing = self.find_agent(name).await;
        let connection = self.bing_connection().await;
        let body = agent_definition(&self.config, name, connection.as_deref());

        let agent = match existing {
            Some(agent) => {
                tracing::info!(agent_id = %agent.id, "updating existing agent");
                self.client
                    .post::<RawAgent>(&format!("assistants/{}", agent.id), &body)
                    .await?
            }
            None => {
                tracing::info!(name, "creating new agent");
                self.client.post::<RawAgent>("assistants", &body).await?
            }
        };

        self.config.agent_id = Some(agent.id.clone());
        Ok(agent)
    }

    /// Resume the persisted thread, or start a new one.
    async fn open_thread(&mut self, agent_id: &str) -> Result<String, AgentError> {
        let mut state = self.store.load();

        if let Some(thread_id) = state.thread_id.clone() {
            match self.client.get::<RawThread>(&format!("threads/{}", thread_id)).await {
                Ok(thread) => {
                    tracing::info!(thread_id = %thread.id, "resumed existing thread");
                    return Ok(thread.id);
                }
                Err(e) => {
                    tracing::warn!(thread_id = %thread_id, error = %e, "stored thread unavailable, creating a new one")
                }
            }
        }

        let thread: RawThread = self.client.post("threads", &json!({})).await?;
        tracing::info!(thread_id = %thread.id, "created new thread");

        state.thread_id = Some(thread.id.clone());
        state.agent_id = Some(agent_id.to_string());
        self.store
            .save(&state)
            .map_err(|e| AgentError::Storage(format!("{:#}", e)))?;

        Ok(thread.id)
    }

    /// Poll a run until it leaves the pending phase or the timeout expires.
    async fn wait_for_run(&mut self, thread_id: &str, mut run: RawRun) -> Result<RawRun, AgentError> {
        let deadline = Instant::now() + self.config.run_timeout;

        loop {
            match RunPhase::of(&run.status) {
                RunPhase::Completed => return Ok(run),
                RunPhase::Failed => {
                    let message = failure_message(&run);
                    return Err(AgentError::RunFailed {
                        run_id: run.id,
                        status: run.status,
                        message,
                    });
                }
                RunPhase::Pending => {}
            }

            if Instant::now() >= deadline {
                return Err(AgentError::Timeout {
                    run_id: run.id,
                    seconds: self.config.run_timeout.as_secs(),
                });
            }

            sleep(self.config.poll_interval).await;
            run = self
                .client
                .get(&format!("threads/{}/runs/{}", thread_id, run.id))
                .await?;
            tracing::debug!(run_id = %run.id, status = %run.status, "polled run");
        }
    }

    async fn collect_events(&mut self, thread_id: &str, run_id: &str) -> Result<Vec<AgentEvent>, AgentError> {
        let steps: RawList<RawStep> = self
            .client
            .get(&format!("threads/{}/runs/{}/steps?order=asc", thread_id, run_id))
            .await?;

        let mut events = Vec::new();
        for outcome in plan_steps(steps.data) {
            match outcome {
                StepOutcome::Event(event) => events.push(event),
                StepOutcome::Message { message_id } => {
                    let message: RawMessage = self
                        .client
                        .get(&format!("threads/{}/messages/{}", thread_id, message_id))
                        .await?;
                    if let Some(text) = message_text(message) {
                        events.push(AgentEvent::AssistantText { text });
                    }
                }
            }
        }

        tracing::info!(run_id, events = events.len(), "processed run steps");
        Ok(events)
    }
}

#[async_trait]
impl AgentService for FoundryService {
    fn kind(&self) -> &'static str {
        "azure_ai_agent_service"
    }

    async fn create_or_reuse_session(&mut self, name: &str) -> Result<SessionHandle, AgentError> {
        let agent = self.provision_agent(name).await?;
        let thread_id = self.open_thread(&agent.id).await?;

        Ok(SessionHandle {
            agent_name: agent.name.unwrap_or_else(|| name.to_string()),
            agent_id: agent.id,
            thread_id,
        })
    }

    async fn post_message(&mut self, session: &SessionHandle, text: &str) -> Result<AgentEvents, AgentError> {
        let thread_id = &session.thread_id;

        let message: RawCreated = self
            .client
            .post(
                &format!("threads/{}/messages", thread_id),
                &json!({ "role": "user", "content": text }),
            )
            .await?;
        tracing::info!(message_id = %message.id, "user message sent");

        let run: RawRun = self
            .client
            .post(
                &format!("threads/{}/runs", thread_id),
                &json!({ "assistant_id": session.agent_id }),
            )
            .await?;
        let run = self.wait_for_run(thread_id, run).await?;
        tracing::info!(run_id = %run.id, status = %run.status, "run finished");

        let events = self.collect_events(thread_id, &run.id).await?;
        Ok(AgentEvents::new(events))
    }

    async fn conversation(&mut self, session: &SessionHandle) -> Result<AgentEvents, AgentError> {
        let thread_id = &session.thread_id;
        let runs: RawList<RawRun> = self
            .client
            .get(&format!("threads/{}/runs?order=asc&limit=100", thread_id))
            .await?;

        let mut events = Vec::new();
        for run in runs.data {
            if RunPhase::of(&run.status) == RunPhase::Failed {
                events.push(AgentEvent::AssistantText {
                    text: format!("I encountered an error: {}", failure_message(&run)),
                });
            }
            events.extend(self.collect_events(thread_id, &run.id).await?);
        }

        Ok(AgentEvents::new(events))
    }

    async fn end_session(&mut self, session: &SessionHandle) -> Result<(), AgentError> {
        let deleted = self
            .client
            .delete(&format!("threads/{}", session.thread_id))
            .await;
        if let Err(e) = &deleted {
            tracing::warn!(thread_id = %session.thread_id, error = %e, "failed to delete thread");
        }

        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %format!("{:#}", e), "failed to clear session state");
        }
        deleted
    }

    fn details(&self) -> Vec<(String, String)> {
        vec![
            ("Endpoint".to_string(), self.client.endpoint().to_string()),
            ("Deployment".to_string(), self.config.deployment_name.clone()),
            ("Bing language".to_string(), self.config.language.clone()),
            ("Credentials".to_string(), self.client.credential_source().to_string()),
        ]
    }
}

fn failure_message(run: &RawRun) -> String {
    run.last_error
        .as_ref()
        .map(|e| e.describe())
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Request body for agent create/update.
fn agent_definition(config: &FoundryConfig, name: &str, bing_connection: Option<&str>) -> Value {
    json!({
        "model": config.deployment_name,
        "name": name,
        "instructions": config.instructions,
        "tools": tools::toolset(bing_connection, &config.language),
    })
}
