//! Database query functions for the `meal_plans` table.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::MealPlan;

/// Parameters for inserting a new meal plan row.
#[derive(Debug, Clone)]
pub struct NewMealPlan<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub week_start_date: NaiveDate,
    pub dietary_preferences: &'a [String],
    pub total_calories: i32,
}

/// Insert a meal plan. Accepts a pool or an open transaction so the plan
/// and its meals can be written atomically.
pub async fn insert_meal_plan<'e, E>(executor: E, new: &NewMealPlan<'_>) -> Result<MealPlan>
where
    E: sqlx::PgExecutor<'e>,
{
    let plan = sqlx::query_as::<_, MealPlan>(
        "INSERT INTO meal_plans (user_id, title, week_start_date, dietary_preferences, total_calories) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.title)
    .bind(new.week_start_date)
    .bind(new.dietary_preferences)
    .bind(new.total_calories)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert meal plan {:?}", new.title))?;

    Ok(plan)
}

/// Fetch a meal plan by its ID.
pub async fn get_meal_plan(pool: &PgPool, id: Uuid) -> Result<Option<MealPlan>> {
    let plan = sqlx::query_as::<_, MealPlan>("SELECT * FROM meal_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch meal plan")?;

    Ok(plan)
}

/// List a user's meal plans, newest first.
pub async fn list_meal_plans_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<MealPlan>> {
    let plans = sqlx::query_as::<_, MealPlan>(
        "SELECT * FROM meal_plans WHERE user_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list meal plans")?;

    Ok(plans)
}

/// The user's most recently created meal plan, if any.
pub async fn latest_meal_plan_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<MealPlan>> {
    let plan = sqlx::query_as::<_, MealPlan>(
        "SELECT * FROM meal_plans WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest meal plan")?;

    Ok(plan)
}

/// Count plans a user created at or after `since`.
pub async fn count_meal_plans_since<'e, E>(
    executor: E,
    user_id: Uuid,
    since: DateTime<Utc>,
) -> Result<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM meal_plans WHERE user_id = $1 AND created_at >= $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(executor)
    .await
    .context("failed to count meal plans")?;

    Ok(count)
}

/// Delete a plan owned by `user_id`. Meals, shopping list and shares go
/// with it (ON DELETE CASCADE). Returns `false` if nothing matched.
pub async fn delete_meal_plan(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM meal_plans WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("failed to delete meal plan")?;

    Ok(result.rows_affected() > 0)
}
