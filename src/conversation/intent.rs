use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::llm::{Intent, IntentResult, LlmGateway};

const LOW_CONFIDENCE: f64 = 0.5;

lazy_static! {
    static ref FOOD_HINT_RE: Regex = Regex::new(
        r"(?i)(\d|съел|ел[аи]?|выпил|завтрак|обед|ужин|ate|had|drank|breakfast|lunch|dinner|snack)"
    )
    .unwrap();
}

/// Does the message superficially resemble a food statement (quantities or
/// food-ish verbs/nouns)? Used only to break low-confidence ties.
pub fn looks_like_food_statement(text: &str) -> bool {
    FOOD_HINT_RE.is_match(text)
}

/// Classify the message before any food-specific parsing. Pure with respect
/// to application state; a gateway failure degrades to `Chat` so the caller
/// can send a generic "didn't understand" reply instead of an error.
pub async fn classify(gateway: &LlmGateway, text: &str) -> IntentResult {
    match gateway.classify_intent(text).await {
        Ok(result) if result.confidence < LOW_CONFIDENCE => {
            let intent = if looks_like_food_statement(text) {
                Intent::FoodEntry
            } else {
                Intent::Chat
            };
            IntentResult {
                intent,
                confidence: result.confidence,
            }
        }
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "intent classification failed, defaulting to chat");
            IntentResult {
                intent: Intent::Chat,
                confidence: 0.0,
            }
        }
    }
}
