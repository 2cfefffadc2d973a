pub mod ollama;
pub mod openai;

use async_trait::async_trait;

use crate::models::ChatMessage;

/// Sampling settings shared by every provider. Temperature and the token
/// budget come from configuration, not constants.
#[derive(Clone, Copy, Debug)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: std::time::Duration,
}

/// The fallback delegate: text in, text out, under caller-supplied
/// instructions. One attempt, bounded by `CompletionOptions::timeout`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage])
        -> anyhow::Result<String>;
}
