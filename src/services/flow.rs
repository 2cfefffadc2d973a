use crate::config::{FlowConfig, UrgencyPolicy};
use crate::models::{ConversationState, Stage};

const EMERGENCY_REPLY: &str = "This sounds urgent. Please call the clinic directly right now or visit the nearest emergency dental service. Heavy bleeding or swelling should not wait for an online booking.";

const IDENTITY_REPLY: &str = "Namaste! I am the virtual receptionist for the dental clinic. I can book your appointment and answer basic questions.";

const ASK_NAME: &str = "May I know your full name, please?";
const ASK_DATE: &str = "Great. Which date would you like to come in? You can write it in your own words, like 'tomorrow' or '15 August'.";
const ASK_TIME: &str = "And what time would suit you? Morning or evening both work.";

/// What one processed message resolves to. `Delegate` means nothing in the
/// fixed flow claimed the message and the LLM should answer it.
#[derive(Debug)]
pub enum FlowOutcome {
    Reply(String),
    Delegate,
}

/// Case-insensitive substring containment. Deliberately not a word match:
/// "bloody" contains "blood" and still triggers.
pub fn is_emergency(cfg: &FlowConfig, message: &str) -> bool {
    let lowered = message.to_lowercase();
    cfg.emergency_keywords
        .iter()
        .any(|k| lowered.contains(k.as_str()))
}

/// Canned identity reply for greetings and "who are you" style messages.
pub fn match_interrupt(cfg: &FlowConfig, message: &str) -> Option<String> {
    let lowered = message.to_lowercase();
    if cfg
        .interrupt_keywords
        .iter()
        .any(|k| lowered.contains(k.as_str()))
    {
        Some(IDENTITY_REPLY.to_string())
    } else {
        None
    }
}

pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// The decision function: one message in, one reply (or a delegate marker)
/// out, mutating the session state in place.
pub fn next_reply(cfg: &FlowConfig, state: &mut ConversationState, message: &str) -> FlowOutcome {
    let message = message.trim();

    // 1. Emergency short-circuit, before everything else. Does not touch
    //    the stage, only the sticky urgency flag.
    if is_emergency(cfg, message) {
        if !state.urgency {
            state.urgency = true;
        }
        return FlowOutcome::Reply(EMERGENCY_REPLY.to_string());
    }

    // 2. Greeting/identity interrupt. Mid-questionnaire the stage is left
    //    untouched and the next message resumes it. At Start no answer is
    //    outstanding, so the identity reply doubles as the opening question.
    if let Some(identity) = match_interrupt(cfg, message) {
        if cfg.questionnaire && state.stage == Stage::Start {
            state.stage = Stage::AskedName;
            return FlowOutcome::Reply(format!("{identity} {ASK_NAME}"));
        }
        return FlowOutcome::Reply(identity);
    }

    // 3. Stage dispatch, one handler per stage.
    if !cfg.questionnaire {
        return FlowOutcome::Delegate;
    }

    let reply = match state.stage {
        Stage::Start => open_questionnaire(state),
        Stage::AskedName => take_name(cfg, state, message),
        Stage::AskedPhone => take_phone(cfg, state, message),
        Stage::AskedDate => take_date(state, message),
        Stage::AskedTime => take_time(cfg, state, message),
    };
    FlowOutcome::Reply(reply)
}

fn open_questionnaire(state: &mut ConversationState) -> String {
    state.stage = Stage::AskedName;
    format!("Let us get your appointment booked. {ASK_NAME}")
}

fn take_name(cfg: &FlowConfig, state: &mut ConversationState, message: &str) -> String {
    let name = message.trim();
    if name.chars().count() < cfg.min_name_len {
        return format!(
            "That name looks too short. Please share your full name (at least {} letters).",
            cfg.min_name_len
        );
    }
    state.name = Some(name.to_string());
    state.stage = Stage::AskedPhone;
    format!(
        "Thank you, {name}! Please share your {}-digit mobile number.",
        cfg.phone_digits
    )
}

fn take_phone(cfg: &FlowConfig, state: &mut ConversationState, message: &str) -> String {
    let digits = normalize_phone(message);
    if digits.len() != cfg.phone_digits {
        return format!(
            "That number does not look right. Please send a valid {}-digit mobile number.",
            cfg.phone_digits
        );
    }
    state.phone = Some(digits);
    state.stage = Stage::AskedDate;
    ASK_DATE.to_string()
}

fn take_date(state: &mut ConversationState, message: &str) -> String {
    let date = message.trim();
    if date.is_empty() {
        return ASK_DATE.to_string();
    }
    state.date = Some(date.to_string());
    state.stage = Stage::AskedTime;
    ASK_TIME.to_string()
}

fn take_time(cfg: &FlowConfig, state: &mut ConversationState, message: &str) -> String {
    let time = message.trim();
    if time.is_empty() {
        return ASK_TIME.to_string();
    }
    state.time = Some(time.to_string());

    // Summary is built before the reset so the answers are still present.
    let summary = confirmation(state);
    state.reset_booking(cfg.urgency_policy == UrgencyPolicy::ClearOnReset);
    summary
}

fn confirmation(state: &ConversationState) -> String {
    let name = state.name.as_deref().unwrap_or("(not given)");
    let phone = state.phone.as_deref().unwrap_or("(not given)");
    let date = state.date.as_deref().unwrap_or("(not given)");
    let time = state.time.as_deref().unwrap_or("(not given)");

    let mut summary = format!(
        "Perfect, your appointment request is noted. Name: {name}, Phone: {phone}, Date: {date}, Time: {time}. Our receptionist will call you shortly to confirm."
    );
    if state.urgency {
        summary.push_str(" Since you mentioned an urgent problem, we will try to give you the earliest slot.");
    }
    summary
}
