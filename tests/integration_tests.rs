use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use dentdesk::config::{AppConfig, FlowConfig};
use dentdesk::handlers;
use dentdesk::models::ChatMessage;
use dentdesk::services::ai::LlmProvider;
use dentdesk::services::session::SessionStore;
use dentdesk::state::AppState;

// ── Mock Providers ──

struct MockLlm;

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
    ) -> anyhow::Result<String> {
        Ok("Our clinic is open 9am to 7pm, Monday to Saturday.".to_string())
    }
}

struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
    ) -> anyhow::Result<String> {
        anyhow::bail!("upstream timed out")
    }
}

struct EmptyLlm;

#[async_trait]
impl LlmProvider for EmptyLlm {
    async fn complete(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
    ) -> anyhow::Result<String> {
        Ok("   ".to_string())
    }
}

// ── Helpers ──

fn test_config(questionnaire: bool) -> AppConfig {
    AppConfig {
        port: 3000,
        llm_provider: "openai".to_string(),
        openai_api_key: String::new(),
        openai_model: "gpt-4o-mini".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        llm_temperature: 0.4,
        llm_max_tokens: 150,
        llm_timeout_secs: 5,
        session_ttl_minutes: 30,
        flow: FlowConfig {
            questionnaire,
            ..FlowConfig::default()
        },
    }
}

fn test_state(llm: Box<dyn LlmProvider>, questionnaire: bool) -> Arc<AppState> {
    Arc::new(AppState {
        config: test_config(questionnaire),
        llm,
        sessions: SessionStore::new(30),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::chat::chat_page))
        .route("/chat", post(handlers::chat::post_chat))
        .route("/health", get(handlers::health::health))
        .with_state(state)
}

async fn send_raw(state: &Arc<AppState>, body: &str) -> (StatusCode, serde_json::Value) {
    let app = test_app(state.clone());
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn send(state: &Arc<AppState>, session_id: &str, message: &str) -> String {
    let body = serde_json::json!({ "session_id": session_id, "message": message }).to_string();
    let (status, json) = send_raw(state, &body).await;
    assert_eq!(status, StatusCode::OK, "unexpected status for {message:?}: {json}");
    json["reply"]
        .as_str()
        .unwrap_or_else(|| panic!("missing reply field: {json}"))
        .to_string()
}

// ── Booking flow over HTTP ──

#[tokio::test]
async fn test_end_to_end_booking() {
    let state = test_state(Box::new(MockLlm), true);

    let r = send(&state, "s1", "hi").await;
    assert!(r.contains("virtual receptionist"));
    assert!(r.contains("full name"));

    let r = send(&state, "s1", "Ali Khan").await;
    assert!(r.contains("Ali Khan") && r.contains("mobile number"));

    let r = send(&state, "s1", "98-765 43210").await;
    assert!(r.contains("date"));

    let r = send(&state, "s1", "tomorrow").await;
    assert!(r.contains("time"));

    let r = send(&state, "s1", "morning").await;
    for expected in ["Ali Khan", "9876543210", "tomorrow", "morning"] {
        assert!(r.contains(expected), "confirmation missing {expected}: {r}");
    }

    // Cycle wrapped around: the next message is greeted as a fresh booking.
    let r = send(&state, "s1", "one more appointment please").await;
    assert!(r.contains("full name"));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let state = test_state(Box::new(MockLlm), true);

    send(&state, "alice", "hi").await;
    send(&state, "bob", "hello").await;
    send(&state, "alice", "Ali Khan").await;
    send(&state, "bob", "Priya Sharma").await;

    // Bob sends a bad phone number; Alice's flow must be unaffected.
    let r = send(&state, "bob", "12345").await;
    assert!(r.contains("10-digit"));

    let r = send(&state, "alice", "9876543210").await;
    assert!(r.contains("date"));

    let r = send(&state, "bob", "1234567890").await;
    assert!(r.contains("date"));

    let r = send(&state, "alice", "tomorrow").await;
    assert!(r.contains("time"));
    let r = send(&state, "alice", "morning").await;
    assert!(r.contains("Ali Khan") && r.contains("9876543210"));
    assert!(!r.contains("Priya"), "cross-session leak: {r}");
}

#[tokio::test]
async fn test_emergency_short_circuits_over_http() {
    let state = test_state(Box::new(MockLlm), true);

    send(&state, "s1", "hi").await;
    let r = send(&state, "s1", "my gum is bleeding a lot").await;
    assert!(r.contains("urgent"));

    // Stage was not consumed: the name question is still outstanding.
    let r = send(&state, "s1", "Ali Khan").await;
    assert!(r.contains("mobile number"));
}

// ── Malformed requests ──

#[tokio::test]
async fn test_missing_message_field_is_client_error() {
    let state = test_state(Box::new(MockLlm), true);
    let (status, _) = send_raw(&state, r#"{"session_id":"s1"}"#).await;
    assert!(status.is_client_error(), "got {status}");
    assert!(state.sessions.is_empty(), "no state should be created");
}

#[tokio::test]
async fn test_missing_session_id_is_client_error() {
    let state = test_state(Box::new(MockLlm), true);
    let (status, _) = send_raw(&state, r#"{"message":"hello"}"#).await;
    assert!(status.is_client_error(), "got {status}");
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_blank_fields_rejected() {
    let state = test_state(Box::new(MockLlm), true);

    let (status, json) = send_raw(&state, r#"{"session_id":"  ","message":"hello"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("session_id"));

    let (status, json) = send_raw(&state, r#"{"session_id":"s1","message":"   "}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("message"));

    assert!(state.sessions.is_empty());
}

// ── Delegate mode ──

#[tokio::test]
async fn test_open_mode_uses_delegate_reply() {
    let state = test_state(Box::new(MockLlm), false);
    let r = send(&state, "s1", "when are you open?").await;
    assert_eq!(r, "Our clinic is open 9am to 7pm, Monday to Saturday.");
}

#[tokio::test]
async fn test_delegate_failure_is_recovered() {
    let state = test_state(Box::new(FailingLlm), false);
    let r = send(&state, "s1", "do you offer braces?").await;
    assert!(r.contains("Sorry"), "expected apologetic reply, got: {r}");

    // The controller stays available afterwards.
    let r = send(&state, "s1", "my tooth is bleeding").await;
    assert!(r.contains("urgent"));
}

#[tokio::test]
async fn test_delegate_empty_reply_is_recovered() {
    let state = test_state(Box::new(EmptyLlm), false);
    let r = send(&state, "s1", "do you offer braces?").await;
    assert!(r.contains("Sorry"), "expected apologetic reply, got: {r}");
}

#[tokio::test]
async fn test_open_mode_still_detects_emergency() {
    let state = test_state(Box::new(MockLlm), false);
    let r = send(&state, "s1", "mujhe bahut dard hai").await;
    assert!(r.contains("urgent"));
}

// ── Plumbing ──

#[tokio::test]
async fn test_health() {
    let state = test_state(Box::new(MockLlm), true);
    send(&state, "s1", "hi").await;

    let app = test_app(state);
    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_sessions"], 1);
}

#[tokio::test]
async fn test_chat_page_serves_html() {
    let state = test_state(Box::new(MockLlm), true);
    let app = test_app(state);

    let res = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("<!DOCTYPE html>"));
    assert!(text.contains("Dental Clinic Assistant"));
}
