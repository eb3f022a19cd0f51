//! Database query functions for the `meal_plan_shares` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{MealPlanShare, ShareMethod};

/// Record that a plan was shared.
pub async fn insert_share(
    pool: &PgPool,
    meal_plan_id: Uuid,
    user_id: Uuid,
    method: ShareMethod,
) -> Result<MealPlanShare> {
    let share = sqlx::query_as::<_, MealPlanShare>(
        "INSERT INTO meal_plan_shares (meal_plan_id, user_id, share_method) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(meal_plan_id)
    .bind(user_id)
    .bind(method)
    .fetch_one(pool)
    .await
    .context("failed to record meal plan share")?;

    Ok(share)
}

/// List share records for a plan, oldest first.
pub async fn list_shares_for_plan(pool: &PgPool, meal_plan_id: Uuid) -> Result<Vec<MealPlanShare>> {
    let shares = sqlx::query_as::<_, MealPlanShare>(
        "SELECT * FROM meal_plan_shares WHERE meal_plan_id = $1 ORDER BY created_at",
    )
    .bind(meal_plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list meal plan shares")?;

    Ok(shares)
}
