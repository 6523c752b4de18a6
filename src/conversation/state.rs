use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::llm::Intent;
use crate::nutrition::{CustomNutrition, FoodCandidate, ServingOption};
use crate::sessions::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingParse,
    AwaitingClarification,
    Resolving,
    Resolved,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    NeedsClarification,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationKind {
    MissingQuantity,
    CookingMethod,
    FoodSelection,
    ServingSelection,
}

/// The single active question for a conversation, with the item it resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    pub kind: ClarificationKind,
    pub question: String,
    pub options: Vec<String>,
    pub item_index: usize,
}

/// One food mention being resolved. The candidate/serving scratch fields
/// carry lookup results across turns while a selection question is pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFoodItem {
    pub raw_name: String,
    pub name_en: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub cooking_method: Option<String>,
    pub status: ItemStatus,
    /// User-stated or label-extracted nutrition; set, the item bypasses the
    /// database lookup entirely.
    #[serde(default)]
    pub custom_nutrition: Option<CustomNutrition>,
    #[serde(default)]
    pub candidates: Vec<FoodCandidate>,
    /// Current page of the candidate list when a selection is pending.
    #[serde(default)]
    pub candidate_page: usize,
    #[serde(default)]
    pub chosen: Option<FoodCandidate>,
    #[serde(default)]
    pub servings: Vec<ServingOption>,
    #[serde(default)]
    pub chosen_serving: Option<ServingOption>,
}

impl ParsedFoodItem {
    pub fn display_name(&self) -> &str {
        &self.raw_name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phase: Phase,
    pub intent: Intent,
    pub items: Vec<ParsedFoodItem>,
    pub pending: Option<ClarificationRequest>,
    /// Raw text of the message that opened the conversation.
    pub original_input: String,
    pub rounds: u32,
    pub retried: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ConversationState {
    pub fn new(user_id: Uuid, intent: Intent, original_input: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            user_id,
            phase: Phase::AwaitingParse,
            intent,
            items: Vec::new(),
            pending: None,
            original_input: original_input.to_string(),
            rounds: 0,
            retried: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// First item still missing information, in original parse order.
    pub fn first_needing_clarification(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.status == ItemStatus::NeedsClarification)
    }

    pub fn first_unresolved(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|i| i.status == ItemStatus::Pending)
    }
}

fn conversation_key(id: Uuid) -> String {
    format!("conversation:{id}")
}

fn user_index_key(user_id: Uuid) -> String {
    format!("user:{user_id}:conversation")
}

/// Load the user's active conversation, if any. Session-store TTL is the only
/// expiry mechanism: a vanished key simply means a fresh conversation starts.
pub async fn load_active(store: &dyn SessionStore, user_id: Uuid) -> Option<ConversationState> {
    let conversation_id = store.get(&user_index_key(user_id)).await?;
    let raw = store.get(&conversation_key(conversation_id.parse().ok()?)).await?;
    match serde_json::from_str(&raw) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "discarding undecodable conversation state");
            None
        }
    }
}

/// Persist the conversation and the one-active-conversation-per-user index,
/// both under the same TTL. Last writer wins per conversation id.
pub async fn save(
    store: &dyn SessionStore,
    state: &ConversationState,
    ttl_secs: u64,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(state)?;
    store.set(&conversation_key(state.id), &raw, ttl_secs).await?;
    store
        .set(&user_index_key(state.user_id), &state.id.to_string(), ttl_secs)
        .await?;
    Ok(())
}

pub async fn clear(store: &dyn SessionStore, state: &ConversationState) {
    if let Err(e) = store.delete(&conversation_key(state.id)).await {
        warn!(error = %e, "failed to delete conversation key");
    }
    if let Err(e) = store.delete(&user_index_key(state.user_id)).await {
        warn!(error = %e, "failed to delete user conversation index");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::MemorySessionStore;

    fn item(name: &str, status: ItemStatus) -> ParsedFoodItem {
        ParsedFoodItem {
            raw_name: name.into(),
            name_en: None,
            quantity: None,
            unit: None,
            cooking_method: None,
            status,
            custom_nutrition: None,
            candidates: Vec::new(),
            candidate_page: 0,
            chosen: None,
            servings: Vec::new(),
            chosen_serving: None,
        }
    }

    #[test]
    fn clarification_order_follows_parse_order() {
        let mut state = ConversationState::new(Uuid::new_v4(), Intent::FoodEntry, "x");
        state.items = vec![
            item("rice", ItemStatus::Pending),
            item("eggs", ItemStatus::NeedsClarification),
            item("milk", ItemStatus::NeedsClarification),
        ];
        assert_eq!(state.first_needing_clarification(), Some(1));
    }

    #[tokio::test]
    async fn save_load_clear_roundtrip() {
        let store = MemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let mut state = ConversationState::new(user_id, Intent::FoodEntry, "съел гречку");
        state.phase = Phase::AwaitingClarification;
        state.items = vec![item("гречка", ItemStatus::NeedsClarification)];

        save(&store, &state, 60).await.expect("save");
        let loaded = load_active(&store, user_id).await.expect("loaded");
        assert_eq!(loaded.id, state.id);
        assert_eq!(loaded.phase, Phase::AwaitingClarification);
        assert_eq!(loaded.items[0].raw_name, "гречка");

        clear(&store, &state).await;
        assert!(load_active(&store, user_id).await.is_none());
    }
}
