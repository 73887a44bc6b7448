//! Turning completed run steps into agent events.

use super::types::{RawMessage, RawStep};
use crate::agent::AgentEvent;

/// Shown when a grounding call carries no request url.
const NO_URL: &str = "No URL provided";

/// One step of a run, in display order.
#[derive(Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Already converted; nothing else to fetch.
    Event(AgentEvent),
    /// The step created a message that still has to be fetched.
    Message { message_id: String },
}

/// Walk run steps (ascending) and keep the ones that matter to the user.
pub(crate) fn plan_steps(steps: Vec<RawStep>) -> Vec<StepOutcome> {
    let mut outcomes = Vec::new();

    for step in steps {
        let Some(details) = step.step_details else {
            continue;
        };
        let status = step.status.as_deref().unwrap_or("unknown");

        match step.step_type.as_deref() {
            Some("tool_calls") => {
                for call in details.tool_calls {
                    let call_type = call.call_type.unwrap_or_else(|| "tool".to_string());
                    let detail = call
                        .bing_grounding
                        .as_ref()
                        .and_then(|args| args.get("requesturl"))
                        .and_then(|url| url.as_str())
                        .unwrap_or(NO_URL)
                        .to_string();
                    outcomes.push(StepOutcome::Event(AgentEvent::ToolCall {
                        tool: format!("{} ({})", call_type, status),
                        detail,
                    }));
                }
            }
            Some("message_creation") => {
                if let Some(creation) = details.message_creation {
                    outcomes.push(StepOutcome::Message {
                        message_id: creation.message_id,
                    });
                }
            }
            other => tracing::debug!(step_type = ?other, "skipping run step"),
        }
    }

    outcomes
}

/// Text of a fetched assistant message: the last text part, followed by its
/// url citations. `None` when the message has no text.
pub(crate) fn message_text(message: RawMessage) -> Option<String> {
    let text = message
        .content
        .into_iter()
        .filter(|c| c.content_type.as_deref().unwrap_or("text") == "text")
        .filter_map(|c| c.text)
        .last()?;

    let citations: Vec<String> = text
        .annotations
        .iter()
        .filter(|a| a.annotation_type.as_deref().unwrap_or("url_citation") == "url_citation")
        .filter_map(|a| a.url_citation.as_ref())
        .map(|c| format!("- [{}]({})", c.title.as_deref().unwrap_or(&c.url), c.url))
        .collect();

    let mut body = text.value;
    if !citations.is_empty() {
        body.push_str("\n\n**Citations:**\n");
        body.push_str(&citations.join("\n"));
    }
    Some(body)
}
