use std::sync::Arc;

use chrono::Utc;

use crate::models::{ChatMessage, ConversationState};
use crate::services::flow::{self, FlowOutcome};
use crate::state::AppState;

const APOLOGY_REPLY: &str = "Sorry, I am having trouble replying right now. Please try again in a moment.";

/// Run one message through the booking flow for the given session.
///
/// Holds the session's own lock for the duration of the transition,
/// including the single bounded delegate attempt, so same-session messages
/// cannot race each other on the stage.
pub async fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    message: &str,
) -> anyhow::Result<String> {
    let handle = state.sessions.handle(session_id);
    let mut conv = handle.lock().await;

    let now = Utc::now().naive_utc();
    if conv.is_expired(now) {
        tracing::info!(session = session_id, "session idle-expired, starting fresh");
        *conv = ConversationState::new(now, state.sessions.ttl());
    }

    conv.messages.push(ChatMessage::user(message));

    tracing::info!(
        session = session_id,
        stage = conv.stage.as_str(),
        urgency = conv.urgency,
        "processing message"
    );

    let reply = match flow::next_reply(&state.config.flow, &mut conv, message) {
        FlowOutcome::Reply(reply) => reply,
        FlowOutcome::Delegate => {
            match state
                .llm
                .complete(&state.config.flow.system_prompt, &conv.messages)
                .await
            {
                Ok(reply) if !reply.trim().is_empty() => reply,
                Ok(_) => {
                    tracing::warn!(session = session_id, "delegate returned an empty reply");
                    APOLOGY_REPLY.to_string()
                }
                Err(e) => {
                    tracing::error!(session = session_id, error = %e, "delegate call failed");
                    APOLOGY_REPLY.to_string()
                }
            }
        }
    };

    conv.messages.push(ChatMessage::assistant(&reply));
    conv.touch(now, state.sessions.ttl());
    drop(conv);

    let pruned = state.sessions.prune_expired(now);
    if pruned > 0 {
        tracing::debug!(pruned, "dropped idle sessions");
    }

    Ok(reply)
}
