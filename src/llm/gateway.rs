use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use super::prompts;
use super::provider::LlmProvider;
use super::types::{
    ImageExtraction, Intent, IntentResult, RawLabel, RawParseResult, RawParsedItem, RawPeriod,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("all providers failed")]
    Unavailable,
    #[error("provider returned malformed output")]
    Malformed,
}

/// Ordered-provider gateway: every operation tries the providers in order
/// (local first, hosted fallback second) with a bounded timeout per call,
/// and returns a typed failure instead of raising to the caller.
pub struct LlmGateway {
    providers: Vec<Arc<dyn LlmProvider>>,
    timeout: Duration,
}

impl LlmGateway {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        for provider in &self.providers {
            match tokio::time::timeout(self.timeout, provider.complete(prompt)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), error = %e, "provider call failed");
                }
                Err(_) => {
                    warn!(provider = provider.name(), "provider call timed out");
                }
            }
        }
        Err(GatewayError::Unavailable)
    }

    async fn complete_vision(
        &self,
        prompt: &str,
        image_b64: &str,
    ) -> Result<String, GatewayError> {
        for provider in &self.providers {
            match tokio::time::timeout(self.timeout, provider.complete_vision(prompt, image_b64))
                .await
            {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), error = %e, "vision call failed");
                }
                Err(_) => {
                    warn!(provider = provider.name(), "vision call timed out");
                }
            }
        }
        Err(GatewayError::Unavailable)
    }

    pub async fn classify_intent(&self, text: &str) -> Result<IntentResult, GatewayError> {
        let prompt = format!("{}\n\nUSER MESSAGE: {text}", prompts::INTENT_SYSTEM);
        let raw = self.complete(&prompt).await?;
        let json = extract_json(&raw).ok_or(GatewayError::Malformed)?;
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|_| GatewayError::Malformed)?;

        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.5);
        let intent = value
            .get("intent")
            .and_then(|v| v.as_str())
            .and_then(Intent::from_wire)
            // Unknown label from the model: treat as a food statement.
            .unwrap_or(Intent::FoodEntry);

        info!(?intent, confidence, "intent classified");
        Ok(IntentResult { intent, confidence })
    }

    pub async fn parse_food_text(&self, text: &str) -> Result<Vec<RawParsedItem>, GatewayError> {
        let prompt = format!("{}\n\nUSER MESSAGE: {text}", prompts::PARSE_SYSTEM);
        let raw = self.complete(&prompt).await?;
        let json = extract_json(&raw).ok_or(GatewayError::Malformed)?;
        let parsed: RawParseResult =
            serde_json::from_str(json).map_err(|_| GatewayError::Malformed)?;
        Ok(parsed.items)
    }

    /// Translate a food name to English for the lookup provider. Infallible
    /// by design: translation trouble must not abort parsing, so any failure
    /// falls back to the original text. Already-English (ASCII) names are
    /// returned as-is without a provider call.
    pub async fn translate_to_english(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.is_ascii() {
            return trimmed.to_string();
        }
        let prompt = format!("{}\n\nFOOD NAME: {trimmed}", prompts::TRANSLATE_SYSTEM);
        match self.complete(&prompt).await {
            Ok(reply) => {
                let translated = reply.trim().trim_matches('"').to_string();
                if translated.is_empty() {
                    trimmed.to_string()
                } else {
                    translated
                }
            }
            Err(e) => {
                warn!(error = %e, "translation failed, keeping original name");
                trimmed.to_string()
            }
        }
    }

    /// Look at a photo via a vision-capable model: a nutrition label yields
    /// its printed per-100g values, anything else a food-log statement. A
    /// model that ignores the JSON schema still produces a usable meal
    /// description.
    pub async fn extract_from_image(
        &self,
        image_b64: &str,
    ) -> Result<ImageExtraction, GatewayError> {
        let raw = self
            .complete_vision(prompts::VISION_SYSTEM, image_b64)
            .await?;

        let structured = extract_json(&raw)
            .and_then(|json| serde_json::from_str::<serde_json::Value>(json).ok())
            .and_then(|value| match value.get("kind").and_then(|k| k.as_str()) {
                Some("label") => serde_json::from_value::<RawLabel>(value.clone())
                    .ok()
                    // A label without readable calories is useless as one.
                    .filter(|label| label.nutrition_per_100g.calories.is_some())
                    .map(ImageExtraction::Label),
                _ => value
                    .get("description")
                    .and_then(|d| d.as_str())
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(|d| ImageExtraction::Meal(d.to_string())),
            });
        if let Some(extraction) = structured {
            return Ok(extraction);
        }

        let text = raw.trim();
        if text.is_empty() {
            return Err(GatewayError::Malformed);
        }
        Ok(ImageExtraction::Meal(text.to_string()))
    }

    pub async fn generate_reply(
        &self,
        text: &str,
        intent: Intent,
    ) -> Result<String, GatewayError> {
        let prompt = format!(
            "{}\n\nDETECTED INTENT: {}\nUSER MESSAGE: {text}",
            prompts::REPLY_SYSTEM,
            match intent {
                Intent::Question => "question",
                _ => "chat",
            }
        );
        let reply = self.complete(&prompt).await?;
        Ok(reply.trim().to_string())
    }

    pub async fn resolve_time_period(&self, text: &str) -> Result<RawPeriod, GatewayError> {
        let prompt = format!("{}\n\nUSER REQUEST: {text}", prompts::PERIOD_SYSTEM);
        let raw = self.complete(&prompt).await?;
        let json = extract_json(&raw).ok_or(GatewayError::Malformed)?;
        serde_json::from_str(json).map_err(|_| GatewayError::Malformed)
    }
}

/// Models often wrap JSON in prose or code fences; take the outermost braces.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
