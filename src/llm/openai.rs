use async_trait::async_trait;
use serde_json::json;

use super::provider::LlmProvider;

/// Hosted OpenAI-compatible API, the secondary (fallback) provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_text: String,
    model_vision: String,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: &str, model_text: &str, model_vision: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model_text: model_text.to_string(),
            model_vision: model_vision.to_string(),
        }
    }

    async fn chat(&self, model: &str, content: serde_json::Value) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": model,
                "messages": [{"role": "user", "content": content}],
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("no content in chat completion"))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.chat(&self.model_text, json!(prompt)).await
    }

    async fn complete_vision(&self, prompt: &str, image_b64: &str) -> anyhow::Result<String> {
        let content = json!([
            {"type": "text", "text": prompt},
            {"type": "image_url", "image_url": {
                "url": format!("data:image/jpeg;base64,{image_b64}")
            }},
        ]);
        self.chat(&self.model_vision, content).await
    }
}
