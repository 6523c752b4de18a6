use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::conversation::machine::TurnOutcome;
use crate::conversation::ClarificationRequest;
use crate::foodlog::{FoodLogEntry, PeriodTotals};

/// One user message, text or photo but not both.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub user_id: Uuid,
    pub message_text: Option<String>,
    pub photo_b64: Option<String>,
    #[serde(default)]
    pub message_id: i64,
    /// Accepted for clients that track it; the active conversation is keyed
    /// by user, so this is informational only.
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub conversation_id: Uuid,
    pub reply_text: String,
    pub needs_clarification: bool,
    pub clarification: Option<ClarificationRequest>,
    pub saved_entry_ids: Vec<Uuid>,
    pub period_totals: Option<PeriodTotals>,
}

impl From<TurnOutcome> for IngestResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            conversation_id: outcome.conversation_id,
            reply_text: outcome.reply_text,
            needs_clarification: outcome.needs_clarification,
            clarification: outcome.clarification,
            saved_entry_ids: outcome.saved_entry_ids,
            period_totals: outcome.period_totals,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub user_id: Uuid,
    /// Defaults to today (UTC) when absent.
    pub date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: Uuid,
    pub food_name: String,
    pub brand_name: Option<String>,
    pub serving_description: Option<String>,
    pub number_of_servings: f64,
    pub calories: f64,
    pub consumed_at: OffsetDateTime,
}

impl From<FoodLogEntry> for EntryListItem {
    fn from(entry: FoodLogEntry) -> Self {
        Self {
            id: entry.id,
            food_name: entry.food_name,
            brand_name: entry.brand_name,
            serving_description: entry.serving_description,
            number_of_servings: entry.number_of_servings,
            calories: entry.calories,
            consumed_at: entry.consumed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}
