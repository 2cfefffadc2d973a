use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use crate::models::ChatMessage;

use super::{CompletionOptions, LlmProvider};

/// OpenAI-compatible chat-completions provider.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    options: CompletionOptions,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, options: CompletionOptions) -> Self {
        Self {
            api_key,
            model,
            options,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<String> {
        let mut chat_messages = vec![json!({
            "role": "system",
            "content": system_prompt,
        })];

        for msg in messages {
            chat_messages.push(json!({
                "role": msg.role,
                "content": msg.content,
            }));
        }

        let body = json!({
            "model": self.model,
            "messages": chat_messages,
            "temperature": self.options.temperature,
            "max_tokens": self.options.max_tokens,
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .timeout(self.options.timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call OpenAI API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse OpenAI response")?;

        if !status.is_success() {
            anyhow::bail!("OpenAI API error ({}): {}", status, data);
        }

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in OpenAI response"))
    }
}
