use std::env;

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a friendly dental clinic receptionist AI.
Speak in simple Hinglish.
Ask max 2 short questions at a time.
Never give medical advice or diagnosis.
Your goal is to understand the patient problem and detect appointment intent.
Gently encourage appointment booking.";

const DEFAULT_EMERGENCY_KEYWORDS: &[&str] = &[
    "bleeding",
    "blood",
    "severe pain",
    "unbearable",
    "emergency",
    "bahut dard",
    "sujan",
];

const DEFAULT_INTERRUPT_KEYWORDS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "namaste",
    "who are you",
    "what is this",
    "what can you do",
];

/// What happens to the urgency flag when a completed booking resets the
/// conversation. The source flows disagreed, so it is a policy choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrgencyPolicy {
    /// Flag survives the reset for the lifetime of the session.
    Sticky,
    /// Flag is cleared together with the answer fields.
    ClearOnReset,
}

impl UrgencyPolicy {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "clear" | "clear_on_reset" => UrgencyPolicy::ClearOnReset,
            _ => UrgencyPolicy::Sticky,
        }
    }
}

/// Everything the booking flow consults at runtime, resolved once at startup.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// When false the questionnaire is skipped entirely and every
    /// non-emergency, non-interrupt message goes to the LLM delegate.
    pub questionnaire: bool,
    pub emergency_keywords: Vec<String>,
    pub interrupt_keywords: Vec<String>,
    pub phone_digits: usize,
    pub min_name_len: usize,
    pub system_prompt: String,
    pub urgency_policy: UrgencyPolicy,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            questionnaire: true,
            emergency_keywords: to_owned_list(DEFAULT_EMERGENCY_KEYWORDS),
            interrupt_keywords: to_owned_list(DEFAULT_INTERRUPT_KEYWORDS),
            phone_digits: 10,
            min_name_len: 3,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            urgency_policy: UrgencyPolicy::Sticky,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub llm_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub ollama_url: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub session_ttl_minutes: i64,
    pub flow: FlowConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let flow = FlowConfig {
            questionnaire: env::var("BOOKING_FLOW")
                .map(|v| v.to_ascii_lowercase() != "off")
                .unwrap_or(true),
            emergency_keywords: keyword_list(
                env::var("EMERGENCY_KEYWORDS").ok().as_deref(),
                DEFAULT_EMERGENCY_KEYWORDS,
            ),
            interrupt_keywords: keyword_list(
                env::var("INTERRUPT_KEYWORDS").ok().as_deref(),
                DEFAULT_INTERRUPT_KEYWORDS,
            ),
            phone_digits: env::var("PHONE_DIGITS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            min_name_len: env::var("MIN_NAME_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            system_prompt: load_system_prompt(env::var("SYSTEM_PROMPT_FILE").ok().as_deref()),
            urgency_policy: env::var("URGENCY_POLICY")
                .map(|v| UrgencyPolicy::parse(&v))
                .unwrap_or(UrgencyPolicy::Sticky),
        };

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            llm_temperature: env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.4),
            llm_max_tokens: env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(150),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            flow,
        }
    }
}

fn load_system_prompt(path: Option<&str>) -> String {
    match path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(path, "system prompt file is empty, using built-in prompt");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to read system prompt file, using built-in prompt");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        },
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    }
}

/// Comma-separated override, falling back to the built-in list when the
/// variable is unset or contains nothing usable.
fn keyword_list(raw: Option<&str>, defaults: &[&str]) -> Vec<String> {
    let parsed: Vec<String> = raw.map(split_keywords).unwrap_or_default();
    if parsed.is_empty() {
        to_owned_list(defaults)
    } else {
        parsed
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn to_owned_list(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keywords_trims_and_lowercases() {
        let parsed = split_keywords(" Bleeding , BLOOD,  severe pain ,,");
        assert_eq!(parsed, vec!["bleeding", "blood", "severe pain"]);
    }

    #[test]
    fn test_keyword_list_falls_back_on_empty_override() {
        let list = keyword_list(Some(" , ,"), DEFAULT_EMERGENCY_KEYWORDS);
        assert_eq!(list.len(), DEFAULT_EMERGENCY_KEYWORDS.len());
        assert!(list.contains(&"bahut dard".to_string()));
    }

    #[test]
    fn test_keyword_list_uses_override() {
        let list = keyword_list(Some("toothache,Fracture"), DEFAULT_EMERGENCY_KEYWORDS);
        assert_eq!(list, vec!["toothache", "fracture"]);
    }

    #[test]
    fn test_urgency_policy_parse() {
        assert_eq!(UrgencyPolicy::parse("clear"), UrgencyPolicy::ClearOnReset);
        assert_eq!(UrgencyPolicy::parse("sticky"), UrgencyPolicy::Sticky);
        assert_eq!(UrgencyPolicy::parse("anything"), UrgencyPolicy::Sticky);
    }

    #[test]
    fn test_flow_defaults() {
        let flow = FlowConfig::default();
        assert!(flow.questionnaire);
        assert_eq!(flow.phone_digits, 10);
        assert_eq!(flow.min_name_len, 3);
        assert!(flow.system_prompt.contains("dental clinic receptionist"));
    }
}
