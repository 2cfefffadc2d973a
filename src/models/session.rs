use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The single outstanding question a conversation is waiting on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    AskedName,
    AskedPhone,
    AskedDate,
    AskedTime,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::AskedName => "asked_name",
            Stage::AskedPhone => "asked_phone",
            Stage::AskedDate => "asked_date",
            Stage::AskedTime => "asked_time",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// One session's booking progress. Answer fields fill strictly in stage
/// order and clear together when the questionnaire completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub stage: Stage,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    /// Set on the first emergency keyword, never flipped back by the
    /// detector itself; reset behavior is governed by `UrgencyPolicy`.
    pub urgency: bool,
    pub messages: Vec<ChatMessage>,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl ConversationState {
    pub fn new(now: NaiveDateTime, ttl: Duration) -> Self {
        Self {
            stage: Stage::Start,
            name: None,
            phone: None,
            date: None,
            time: None,
            urgency: false,
            messages: vec![],
            last_activity: now,
            expires_at: now + ttl,
        }
    }

    /// Clear the questionnaire answers and return to the opening stage.
    /// The transcript is kept; the urgency flag is cleared only when the
    /// caller's policy says so.
    pub fn reset_booking(&mut self, clear_urgency: bool) {
        self.stage = Stage::Start;
        self.name = None;
        self.phone = None;
        self.date = None;
        self.time = None;
        if clear_urgency {
            self.urgency = false;
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now > self.expires_at
    }

    pub fn touch(&mut self, now: NaiveDateTime, ttl: Duration) {
        self.last_activity = now;
        self.expires_at = now + ttl;
    }
}
