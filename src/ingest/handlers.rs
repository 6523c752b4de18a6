use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use base64::Engine;
use time::OffsetDateTime;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::conversation::TurnInput;
use crate::state::AppState;

use super::dto::{
    DeletedResponse, EntriesQuery, EntryListItem, IngestRequest, IngestResponse, OwnerQuery,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/entries", get(list_entries))
        .route("/entries/:id", delete(delete_entry))
}

/// POST /v1/ingest { user_id, message_text? | photo_b64?, message_id? }
#[instrument(skip(state, body), fields(user_id = %body.user_id, message_id = body.message_id))]
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    let has_text = body
        .message_text
        .as_deref()
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    let has_photo = body.photo_b64.is_some();

    if !has_text && !has_photo {
        return Err((
            StatusCode::BAD_REQUEST,
            "message_text or photo_b64 is required".into(),
        ));
    }
    if has_text && has_photo {
        return Err((
            StatusCode::BAD_REQUEST,
            "provide either message_text or photo_b64, not both".into(),
        ));
    }
    if let Some(photo) = &body.photo_b64 {
        base64::engine::general_purpose::STANDARD
            .decode(photo)
            .map_err(|_| (StatusCode::BAD_REQUEST, "photo_b64 is not valid base64".into()))?;
    }

    let outcome = state
        .orchestrator
        .handle_turn(TurnInput {
            user_id: body.user_id,
            text: body.message_text,
            photo_b64: body.photo_b64,
            message_id: body.message_id,
        })
        .await;
    Ok(Json(outcome.into()))
}

/// GET /v1/entries?user_id=...&date=2026-08-30
#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    Query(q): Query<EntriesQuery>,
) -> Result<Json<Vec<EntryListItem>>, (StatusCode, String)> {
    let date = q.date.unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let entries = state
        .food_log
        .entries_for_range(q.user_id, date, date)
        .await
        .map_err(internal)?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// DELETE /v1/entries/:id?user_id=...
#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<OwnerQuery>,
) -> Result<Json<DeletedResponse>, (StatusCode, String)> {
    let deleted = state
        .food_log
        .soft_delete(q.user_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Entry not found".into()));
    }
    Ok(Json(DeletedResponse { deleted: true }))
}

pub async fn healthz() -> &'static str {
    "ok"
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: Option<&str>, photo: Option<&str>) -> IngestRequest {
        IngestRequest {
            user_id: Uuid::new_v4(),
            message_text: text.map(String::from),
            photo_b64: photo.map(String::from),
            message_id: 1,
            conversation_id: None,
        }
    }

    #[tokio::test]
    async fn ingest_requires_text_or_photo() {
        let err = ingest(State(AppState::fake()), Json(request(None, None)))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = ingest(State(AppState::fake()), Json(request(Some("   "), None)))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_rejects_text_and_photo_together() {
        let err = ingest(
            State(AppState::fake()),
            Json(request(Some("съел яблоко"), Some("aGVsbG8="))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_rejects_invalid_base64() {
        let err = ingest(
            State(AppState::fake()),
            Json(request(None, Some("not base64!!"))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_without_providers_still_replies() {
        // No language model behind the fake state: the turn degrades to a
        // generic reply instead of an error status.
        let response = ingest(State(AppState::fake()), Json(request(Some("привет"), None)))
            .await
            .expect("200");
        assert!(!response.0.reply_text.is_empty());
        assert!(!response.0.needs_clarification);
    }

    #[tokio::test]
    async fn list_entries_is_empty_for_a_fresh_user() {
        let response = list_entries(
            State(AppState::fake()),
            Query(EntriesQuery {
                user_id: Uuid::new_v4(),
                date: None,
            }),
        )
        .await
        .expect("200");
        assert!(response.0.is_empty());
    }

    #[tokio::test]
    async fn deleting_an_unknown_entry_is_not_found() {
        let err = delete_entry(
            State(AppState::fake()),
            Path(Uuid::new_v4()),
            Query(OwnerQuery {
                user_id: Uuid::new_v4(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
