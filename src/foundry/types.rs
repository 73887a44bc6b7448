//! Wire structures of the agent service REST API.
//!
//! Only the fields the client reads are modelled; everything else is ignored.

use serde::Deserialize;
use std::collections::HashMap;

/// Paged list envelope (`{"data": [...]}`).
#[derive(Debug, Deserialize)]
pub(crate) struct RawList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Connection listings use `value` instead of `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawConnectionList {
    #[serde(default)]
    pub value: Vec<RawConnection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAgent {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawConnection {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawThread {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCreated {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRun {
    pub id: String,
    pub status: String,
    pub last_error: Option<RawRunError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRunError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl RawRunError {
    pub fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "Unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStep {
    #[serde(rename = "type")]
    pub step_type: Option<String>,
    pub status: Option<String>,
    pub step_details: Option<RawStepDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStepDetails {
    #[serde(default)]
    pub tool_calls: Vec<RawToolCall>,
    pub message_creation: Option<RawMessageCreation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawToolCall {
    #[serde(rename = "type")]
    pub call_type: Option<String>,
    pub bing_grounding: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMessageCreation {
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMessage {
    #[serde(default)]
    pub content: Vec<RawContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawContent {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub text: Option<RawText>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawText {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<RawAnnotation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAnnotation {
    #[serde(rename = "type")]
    pub annotation_type: Option<String>,
    pub url_citation: Option<RawUrlCitation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUrlCitation {
    pub url: String,
    pub title: Option<String>,
}

/// Error body returned by the service (`{"error": {"message": ...}}`).
#[derive(Debug, Deserialize)]
pub(crate) struct RawErrorBody {
    pub error: RawErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Where a run stands after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPhase {
    Pending,
    Completed,
    Failed,
}

impl RunPhase {
    pub fn of(status: &str) -> Self {
        match status {
            "completed" | "incomplete" => RunPhase::Completed,
            "failed" | "cancelled" | "expired" | "requires_action" => RunPhase::Failed,
            _ => RunPhase::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_phases() {
        assert_eq!(RunPhase::of("queued"), RunPhase::Pending);
        assert_eq!(RunPhase::of("in_progress"), RunPhase::Pending);
        assert_eq!(RunPhase::of("cancelling"), RunPhase::Pending);
        assert_eq!(RunPhase::of("completed"), RunPhase::Completed);
        assert_eq!(RunPhase::of("failed"), RunPhase::Failed);
        assert_eq!(RunPhase::of("expired"), RunPhase::Failed);
    }

    #[test]
    fn run_with_error_decodes() {
        let run: RawRun = serde_json::from_str(
            r#"{"id":"run_1","status":"failed","last_error":{"code":"rate_limit_exceeded","message":"slow down"}}"#,
        )
        .unwrap();
        assert_eq!(run.status, "failed");
        assert_eq!(
            run.last_error.unwrap().describe(),
            "rate_limit_exceeded: slow down"
        );
    }

    #[test]
    fn list_without_data_is_empty() {
        let list: RawList<RawAgent> = serde_json::from_str(r#"{"object":"list"}"#).unwrap();
        assert!(list.data.is_empty());
    }
}
