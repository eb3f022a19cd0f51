//! Shopping list service layer.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use mealmate_db::models::ShoppingList;
use mealmate_db::queries::shopping_lists;

use super::{CategoryRules, consolidate, shopping_list_title, toggle_item};
use crate::plan::{PlanNotFound, get_meal_plan_with_meals};

/// Build the consolidated list for a plan and store it, replacing any
/// previous list for that plan.
pub async fn generate_shopping_list(
    pool: &PgPool,
    rules: &CategoryRules,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<ShoppingList> {
    let found = get_meal_plan_with_meals(pool, user_id, plan_id).await?;

    let items = consolidate(
        rules,
        found.meals.iter().flat_map(|meal| meal.ingredients.0.iter()),
    );
    let title = shopping_list_title(&found.plan.title);

    let list =
        shopping_lists::upsert_shopping_list(pool, user_id, plan_id, &title, &items).await?;

    info!(plan_id = %plan_id, items = list.items.0.len(), "shopping list generated");
    Ok(list)
}

/// Fetch the stored list for a plan owned by `user_id`.
pub async fn get_shopping_list(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<Option<ShoppingList>> {
    let list = shopping_lists::get_shopping_list_for_plan(pool, plan_id).await?;
    Ok(list.filter(|l| l.user_id == user_id))
}

/// Flip the `checked` flag of the item at `index` and persist it.
pub async fn toggle_shopping_item(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    index: usize,
) -> Result<ShoppingList> {
    let list = get_shopping_list(pool, user_id, plan_id)
        .await?
        .ok_or(PlanNotFound(plan_id))
        .context("no shopping list for this plan; generate one first")?;

    let mut items = list.items.0;
    let checked = toggle_item(&mut items, index)?;
    let updated = shopping_lists::update_items(pool, list.id, &items).await?;

    info!(plan_id = %plan_id, index, checked, "shopping item toggled");
    Ok(updated)
}
