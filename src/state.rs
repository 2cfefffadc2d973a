use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::session::SessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub sessions: SessionStore,
}
