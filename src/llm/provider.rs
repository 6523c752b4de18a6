use async_trait::async_trait;

/// One language model backend. The gateway walks an ordered list of these,
/// so a provider only has to turn a prompt into raw text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;

    async fn complete_vision(&self, prompt: &str, image_b64: &str) -> anyhow::Result<String>;
}
