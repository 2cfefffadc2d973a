use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::chat;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub async fn chat_page() -> Html<&'static str> {
    Html(include_str!("../web/chat.html"))
}

pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session_id = payload.session_id.trim();
    let message = payload.message.trim();

    if session_id.is_empty() {
        return Err(AppError::BadRequest("session_id must not be empty".into()));
    }
    if message.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".into()));
    }

    tracing::info!(session = session_id, "incoming chat message");

    let reply = chat::process_message(&state, session_id, message).await?;

    Ok(Json(ChatResponse { reply }))
}
