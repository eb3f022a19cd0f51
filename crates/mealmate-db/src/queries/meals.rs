//! Database query functions for the `meals` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{Ingredient, Meal, MealType, NutritionInfo};

/// Parameters for inserting a meal into a plan.
#[derive(Debug, Clone)]
pub struct NewMeal<'a> {
    pub meal_plan_id: Uuid,
    pub day_of_week: i32,
    pub meal_type: MealType,
    pub recipe_name: &'a str,
    pub recipe_description: &'a str,
    pub cuisine: &'a str,
    pub ingredients: &'a [Ingredient],
    pub instructions: &'a [String],
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub calories_per_serving: i32,
    pub nutrition: &'a NutritionInfo,
}

/// Insert one meal. The (plan, day, meal type) UNIQUE constraint rejects a
/// second meal in the same slot.
pub async fn insert_meal<'e, E>(executor: E, new: &NewMeal<'_>) -> Result<Meal>
where
    E: sqlx::PgExecutor<'e>,
{
    let meal = sqlx::query_as::<_, Meal>(
        "INSERT INTO meals (meal_plan_id, day_of_week, meal_type, recipe_name, recipe_description, \
         cuisine, ingredients, instructions, prep_time, cook_time, servings, \
         calories_per_serving, nutrition_info) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING *",
    )
    .bind(new.meal_plan_id)
    .bind(new.day_of_week)
    .bind(new.meal_type)
    .bind(new.recipe_name)
    .bind(new.recipe_description)
    .bind(new.cuisine)
    .bind(Json(new.ingredients))
    .bind(new.instructions)
    .bind(new.prep_time)
    .bind(new.cook_time)
    .bind(new.servings)
    .bind(new.calories_per_serving)
    .bind(Json(new.nutrition))
    .fetch_one(executor)
    .await
    .with_context(|| {
        format!(
            "failed to insert meal {:?} (day {}, {})",
            new.recipe_name, new.day_of_week, new.meal_type
        )
    })?;

    Ok(meal)
}

/// List the meals of a plan in slot order: by day, then breakfast, lunch,
/// dinner, snack.
pub async fn list_meals_for_plan(pool: &PgPool, meal_plan_id: Uuid) -> Result<Vec<Meal>> {
    let meals = sqlx::query_as::<_, Meal>(
        "SELECT * FROM meals WHERE meal_plan_id = $1 \
         ORDER BY day_of_week, \
             CASE meal_type \
                 WHEN 'breakfast' THEN 0 \
                 WHEN 'lunch' THEN 1 \
                 WHEN 'dinner' THEN 2 \
                 ELSE 3 \
             END",
    )
    .bind(meal_plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list meals for plan")?;

    Ok(meals)
}

/// Number of meals in a plan.
pub async fn count_meals_for_plan(pool: &PgPool, meal_plan_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meals WHERE meal_plan_id = $1")
        .bind(meal_plan_id)
        .fetch_one(pool)
        .await
        .context("failed to count meals")?;

    Ok(count)
}
