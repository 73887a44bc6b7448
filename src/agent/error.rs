//! Typed failures of the response sources.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised by a response source. The chat loop renders any of these
/// as a single system message and keeps reading input.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("could not reach the agent service: {0}")]
    Connection(String),

    #[error("agent service returned HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("agent run {run_id} ended with status '{status}': {message}")]
    RunFailed {
        run_id: String,
        status: String,
        message: String,
    },

    #[error("agent run {run_id} did not finish within {seconds}s")]
    Timeout { run_id: String, seconds: u64 },

    #[error("unexpected response from the agent service: {0}")]
    Decode(String),

    #[error("session storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            AgentError::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            AgentError::Status {
                status,
                message: error.to_string(),
            }
        } else {
            AgentError::Connection(error.to_string())
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(error: serde_json::Error) -> Self {
        AgentError::Decode(error.to_string())
    }
}
