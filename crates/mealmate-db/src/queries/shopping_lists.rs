//! Database query functions for the `shopping_lists` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{ShoppingList, ShoppingListItem};

/// Create the shopping list for a plan, or replace the items (and title)
/// of the existing one. Checked state of the old items is discarded.
pub async fn upsert_shopping_list(
    pool: &PgPool,
    user_id: Uuid,
    meal_plan_id: Uuid,
    title: &str,
    items: &[ShoppingListItem],
) -> Result<ShoppingList> {
    let list = sqlx::query_as::<_, ShoppingList>(
        "INSERT INTO shopping_lists (user_id, meal_plan_id, title, items) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (meal_plan_id) DO UPDATE \
         SET title = EXCLUDED.title, items = EXCLUDED.items, updated_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(meal_plan_id)
    .bind(title)
    .bind(Json(items))
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert shopping list for plan {meal_plan_id}"))?;

    Ok(list)
}

/// Fetch the shopping list belonging to a plan.
pub async fn get_shopping_list_for_plan(
    pool: &PgPool,
    meal_plan_id: Uuid,
) -> Result<Option<ShoppingList>> {
    let list = sqlx::query_as::<_, ShoppingList>(
        "SELECT * FROM shopping_lists WHERE meal_plan_id = $1",
    )
    .bind(meal_plan_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch shopping list")?;

    Ok(list)
}

/// Overwrite the items of an existing list (used for checking items off).
pub async fn update_items(
    pool: &PgPool,
    id: Uuid,
    items: &[ShoppingListItem],
) -> Result<ShoppingList> {
    let list = sqlx::query_as::<_, ShoppingList>(
        "UPDATE shopping_lists SET items = $2, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(Json(items))
    .fetch_optional(pool)
    .await
    .context("failed to update shopping list items")?;

    list.with_context(|| format!("shopping list {id} not found"))
}

/// List a user's shopping lists, most recently updated first.
pub async fn list_shopping_lists_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ShoppingList>> {
    let lists = sqlx::query_as::<_, ShoppingList>(
        "SELECT * FROM shopping_lists WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list shopping lists")?;

    Ok(lists)
}
