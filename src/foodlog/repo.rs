use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::Nutrients;

/// Persisted food-log row. Immutable once written except for the soft-delete
/// flag; nutrient values are a snapshot of the chosen serving scaled by
/// `number_of_servings`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Option<String>,
    pub food_name: String,
    pub brand_name: Option<String>,
    pub serving_description: Option<String>,
    pub number_of_servings: f64,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
    pub consumed_at: OffsetDateTime,
    pub original_input: Option<String>,
    pub deleted: bool,
}

#[derive(Debug, Clone)]
pub struct NewFoodLogEntry {
    pub user_id: Uuid,
    pub food_id: Option<String>,
    pub food_name: String,
    pub brand_name: Option<String>,
    pub serving_description: Option<String>,
    pub number_of_servings: f64,
    pub nutrients: Nutrients,
    pub consumed_at: OffsetDateTime,
    pub original_input: Option<String>,
}

#[async_trait]
pub trait FoodLogStore: Send + Sync {
    async fn create_entry(&self, entry: NewFoodLogEntry) -> anyhow::Result<Uuid>;

    /// Entries with a consumption date in `[start, end]`, soft-deleted rows
    /// excluded, oldest first.
    async fn entries_for_range(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<FoodLogEntry>>;

    /// Returns false when no live entry with this id belongs to the user.
    async fn soft_delete(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgFoodLogStore {
    db: PgPool,
}

impl PgFoodLogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FoodLogStore for PgFoodLogStore {
    async fn create_entry(&self, entry: NewFoodLogEntry) -> anyhow::Result<Uuid> {
        let mut tx = self.db.begin().await.context("begin entry transaction")?;
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO food_log_entries (
                id, user_id, food_id, food_name, brand_name, serving_description,
                number_of_servings, calories, protein, carbohydrates, fat,
                fiber, sugar, sodium, consumed_at, original_input
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(id)
        .bind(entry.user_id)
        .bind(&entry.food_id)
        .bind(&entry.food_name)
        .bind(&entry.brand_name)
        .bind(&entry.serving_description)
        .bind(entry.number_of_servings)
        .bind(entry.nutrients.calories)
        .bind(entry.nutrients.protein)
        .bind(entry.nutrients.carbohydrate)
        .bind(entry.nutrients.fat)
        .bind(entry.nutrients.fiber)
        .bind(entry.nutrients.sugar)
        .bind(entry.nutrients.sodium)
        .bind(entry.consumed_at)
        .bind(&entry.original_input)
        .execute(&mut *tx)
        .await
        .context("insert food log entry")?;
        tx.commit().await.context("commit entry transaction")?;
        Ok(id)
    }

    async fn entries_for_range(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<FoodLogEntry>> {
        let from = start.midnight().assume_utc();
        let to = end.midnight().assume_utc() + Duration::days(1);
        let rows = sqlx::query_as::<_, FoodLogEntry>(
            r#"
            SELECT id, user_id, food_id, food_name, brand_name, serving_description,
                   number_of_servings, calories, protein, carbohydrates, fat,
                   fiber, sugar, sodium, consumed_at, original_input, deleted
            FROM food_log_entries
            WHERE user_id = $1 AND consumed_at >= $2 AND consumed_at < $3 AND NOT deleted
            ORDER BY consumed_at ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn soft_delete(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE food_log_entries
            SET deleted = TRUE
            WHERE id = $1 AND user_id = $2 AND NOT deleted
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
