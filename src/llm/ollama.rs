use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::LlmProvider;

/// Local Ollama instance, the primary (free) provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model_text: String,
    model_vision: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<&'a str>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model_text: &str, model_vision: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model_text: model_text.to_string(),
            model_vision: model_vision.to_string(),
        }
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        images: Option<Vec<&str>>,
    ) -> anyhow::Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
                images,
            })
            .send()
            .await?
            .error_for_status()?;
        let body: GenerateResponse = resp.json().await?;
        Ok(body.response)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.generate(&self.model_text, prompt, None).await
    }

    async fn complete_vision(&self, prompt: &str, image_b64: &str) -> anyhow::Result<String> {
        self.generate(&self.model_vision, prompt, Some(vec![image_b64]))
            .await
    }
}
