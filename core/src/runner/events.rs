use serde::Deserialize;

use super::types::{AgentMessage, MessageRole, SingleResult};

/// One decoded stdout line. Anything unrecognized, malformed or with an
/// unexpected role decodes to `Ignored`.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    MessageEnd(AgentMessage),
    ToolResultEnd(AgentMessage),
    Ignored,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    MessageEnd { message: AgentMessage },
    ToolResultEnd { message: AgentMessage },
    #[serde(other)]
    Other,
}

pub fn decode_event_line(line: &str) -> AgentEvent {
    let line = line.trim();
    if !line.starts_with('{') {
        return AgentEvent::Ignored;
    }
    match serde_json::from_str::<WireEvent>(line) {
        Ok(WireEvent::MessageEnd { message }) => AgentEvent::MessageEnd(message),
        Ok(WireEvent::ToolResultEnd { message }) => AgentEvent::ToolResultEnd(message),
        Ok(WireEvent::Other) => AgentEvent::Ignored,
        Err(e) => {
            tracing::debug!(error.kind = "stream.parse_skipped", error.reason = %e, "skipping event line");
            AgentEvent::Ignored
        }
    }
}

/// Fold an event into the task result. Returns true if the event was accepted.
pub fn apply_event(result: &mut SingleResult, event: AgentEvent) -> bool {
    let message = match event {
        AgentEvent::MessageEnd(m) | AgentEvent::ToolResultEnd(m) => m,
        AgentEvent::Ignored => return false,
    };

    if message.role == MessageRole::Assistant {
        result.usage.record_turn(message.usage.as_ref());
        if result.model.is_none() {
            result.model = message.model.clone().filter(|m| !m.is_empty());
        }
        // A terminal error/aborted reason is never overwritten by a later turn.
        if message.stop_reason.is_some() && !result.stopped_abnormally() {
            result.stop_reason = message.stop_reason.clone();
        }
        if result.error_message.is_none() {
            result.error_message = message.error_message.clone();
        }
    }

    result.messages.push(message);
    true
}
