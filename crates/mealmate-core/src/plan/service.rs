//! Plan service layer.
//!
//! Generates a plan for a user and inserts the plan row, its meals and the
//! updated profile defaults within a single database transaction.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use mealmate_db::queries::meal_plans::{self, NewMealPlan};
use mealmate_db::queries::meals::{self, NewMeal};
use mealmate_db::queries::profiles::{self, PreferencesUpdate};

use super::{GenerationOutcome, PlanNotFound, PlanWithMeals, plan_title, week_start};
use crate::catalog::RecipeCatalog;
use crate::diet::DietaryRules;
use crate::selector::{MealRequest, PlanSummary, select_meals};
use crate::subscription::{check_generation, effective_tier, month_start};

/// Generate and store a week of meals for `user_id`.
///
/// Creates the profile if needed, then locks it and enforces the user's
/// subscription limits inside the write transaction. When no recipe survives filtering, returns
/// [`GenerationOutcome::NoSuitableMeals`] and writes nothing. Otherwise the
/// plan, all meals and the profile's planning defaults are written in one
/// transaction; if any step fails the whole operation is rolled back.
pub async fn generate_meal_plan<C, R>(
    pool: &PgPool,
    catalog: &C,
    rules: &DietaryRules,
    user_id: Uuid,
    request: &MealRequest,
    rng: &mut R,
) -> Result<GenerationOutcome>
where
    C: RecipeCatalog + ?Sized,
    R: Rng + ?Sized,
{
    let now = Utc::now();

    profiles::ensure_profile(pool, user_id).await?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    // The profile lock serializes generations for this user until commit.
    let profile = profiles::lock_profile(&mut *tx, user_id).await?;
    let tier = effective_tier(profile.subscription_tier, profile.subscription_expires_at, now);
    let used = meal_plans::count_meal_plans_since(&mut *tx, user_id, month_start(now)).await?;
    check_generation(tier, u64::try_from(used).unwrap_or(0), request.household_size)?;

    let generated = select_meals(catalog, rules, request, rng)?;
    if generated.is_empty() {
        info!(user_id = %user_id, "no suitable meals for request");
        return Ok(GenerationOutcome::NoSuitableMeals);
    }

    let summary = PlanSummary::from_generated(&generated, request.calorie_target);
    let week = week_start(now.date_naive());
    let title = plan_title(week);
    let household_size = to_i32(request.household_size, "household size")?;

    // 1. Insert the plan row.
    let plan = meal_plans::insert_meal_plan(
        &mut *tx,
        &NewMealPlan {
            user_id,
            title: &title,
            week_start_date: week,
            dietary_preferences: &request.dietary_preferences,
            total_calories: i32::try_from(summary.total_calories)
                .context("total calories out of range")?,
        },
    )
    .await?;

    // 2. Insert every meal.
    let mut stored = Vec::with_capacity(generated.len());
    for meal in &generated {
        let row = meals::insert_meal(
            &mut *tx,
            &NewMeal {
                meal_plan_id: plan.id,
                day_of_week: i32::from(meal.slot.day),
                meal_type: meal.slot.meal_type,
                recipe_name: &meal.recipe_name,
                recipe_description: &meal.description,
                cuisine: &meal.cuisine,
                ingredients: &meal.ingredients,
                instructions: &meal.instructions,
                prep_time: to_i32(meal.prep_time, "prep time")?,
                cook_time: to_i32(meal.cook_time, "cook time")?,
                servings: to_i32(meal.servings, "servings")?,
                calories_per_serving: to_i32(meal.calories_per_serving, "calories")?,
                nutrition: &meal.nutrition,
            },
        )
        .await?;
        stored.push(row);
    }

    // 3. Remember the request as the user's defaults.
    profiles::update_preferences(
        &mut *tx,
        user_id,
        &PreferencesUpdate {
            dietary_preferences: &request.dietary_preferences,
            allergies: &request.allergies,
            cooking_skill_level: request.cooking_skill.as_deref(),
            household_size,
        },
    )
    .await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        plan_id = %plan.id,
        user_id = %user_id,
        meals = stored.len(),
        total_calories = plan.total_calories,
        "meal plan generated"
    );

    Ok(GenerationOutcome::Generated(PlanWithMeals {
        plan,
        meals: stored,
    }))
}

/// Fetch a plan and its meals without an ownership check. Used for share
/// links, where the signed token is the authorization.
pub async fn load_meal_plan_with_meals(
    pool: &PgPool,
    plan_id: Uuid,
) -> Result<Option<PlanWithMeals>> {
    let Some(plan) = meal_plans::get_meal_plan(pool, plan_id).await? else {
        return Ok(None);
    };
    let meals = meals::list_meals_for_plan(pool, plan.id).await?;
    Ok(Some(PlanWithMeals { plan, meals }))
}

/// Fetch a plan owned by `user_id` with its meals.
///
/// Fails with [`PlanNotFound`] if the plan is missing or owned by someone
/// else.
pub async fn get_meal_plan_with_meals(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<PlanWithMeals> {
    match load_meal_plan_with_meals(pool, plan_id).await? {
        Some(found) if found.plan.user_id == user_id => Ok(found),
        _ => Err(PlanNotFound(plan_id).into()),
    }
}

/// Delete a plan owned by `user_id`, with its meals, shopping list and
/// share records.
pub async fn delete_meal_plan(pool: &PgPool, user_id: Uuid, plan_id: Uuid) -> Result<()> {
    if !meal_plans::delete_meal_plan(pool, user_id, plan_id).await? {
        return Err(PlanNotFound(plan_id).into());
    }
    info!(plan_id = %plan_id, "meal plan deleted");
    Ok(())
}

fn to_i32(value: u32, what: &str) -> Result<i32> {
    i32::try_from(value).with_context(|| format!("{what} {value} out of range"))
}
