//! Weekly meal selection.
//!
//! Filters the catalog by the caller's dietary restrictions and cuisines,
//! then fills each (day, meal type) slot of a seven-day week with a
//! uniformly random pick. Recipes are not repeated within a day unless
//! the pool for that meal type is exhausted.
//!
//! Selection is pure: the RNG is passed in, and nothing is persisted.

mod summary;

pub use summary::PlanSummary;

use std::collections::HashSet;

use mealmate_db::models::{Ingredient, MealType, NutritionInfo};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Recipe, RecipeCatalog};
use crate::diet::DietaryRules;

/// Days in a generated plan. Day 0 is Sunday.
pub const DAYS_PER_WEEK: u8 = 7;

/// Caller parameters for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRequest {
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Empty means any cuisine.
    #[serde(default)]
    pub cuisines: Vec<String>,
    pub household_size: u32,
    /// Daily calories. Reported against, never used to select.
    #[serde(default)]
    pub calorie_target: Option<u32>,
    #[serde(default)]
    pub cooking_skill: Option<String>,
}

impl Default for MealRequest {
    fn default() -> Self {
        Self {
            dietary_preferences: Vec::new(),
            allergies: Vec::new(),
            cuisines: Vec::new(),
            household_size: 1,
            calorie_target: None,
            cooking_skill: None,
        }
    }
}

/// A position in the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    /// 0 (Sunday) through 6 (Saturday).
    pub day: u8,
    pub meal_type: MealType,
}

/// A recipe bound to a slot, scaled to the household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMeal {
    pub slot: Slot,
    pub recipe_name: String,
    pub description: String,
    pub cuisine: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_time: u32,
    pub cook_time: u32,
    /// Equal to the household size.
    pub servings: u32,
    /// Per serving; not scaled.
    pub calories_per_serving: u32,
    /// Household total.
    pub nutrition: NutritionInfo,
}

impl GeneratedMeal {
    fn from_recipe(recipe: &Recipe, slot: Slot, household_size: u32) -> Self {
        let factor = f64::from(household_size);
        Self {
            slot,
            recipe_name: recipe.name.clone(),
            description: recipe.description.clone(),
            cuisine: recipe.cuisine.clone(),
            ingredients: recipe
                .ingredients
                .iter()
                .map(|i| Ingredient {
                    name: i.name.clone(),
                    quantity: i.quantity * factor,
                    unit: i.unit.clone(),
                })
                .collect(),
            instructions: recipe.instructions.clone(),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: household_size,
            calories_per_serving: recipe.calories_per_serving,
            nutrition: recipe.nutrition.scaled(factor),
        }
    }
}

/// Errors that can occur during meal selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("household size must be at least 1, got {0}")]
    InvalidHouseholdSize(u32),
}

/// Recipes that satisfy the request's restrictions and cuisine choice,
/// in catalog order.
pub fn filter_catalog<'c, C>(
    catalog: &'c C,
    rules: &DietaryRules,
    request: &MealRequest,
) -> Vec<&'c Recipe>
where
    C: RecipeCatalog + ?Sized,
{
    let exclusions = rules.exclusions(&request.dietary_preferences, &request.allergies);
    let cuisines: Vec<String> = request
        .cuisines
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    catalog
        .recipes()
        .iter()
        .filter(|recipe| match exclusions.violation(recipe) {
            Some(v) => {
                debug!(recipe = %recipe.name, ingredient = v.ingredient, term = v.term, "recipe excluded");
                false
            }
            None => true,
        })
        .filter(|recipe| cuisines.is_empty() || cuisines.contains(&recipe.cuisine.to_lowercase()))
        .collect()
}

/// Fill a week of breakfast, lunch and dinner slots.
///
/// Returns meals in slot order (day, then breakfast, lunch, dinner). A
/// meal type with no candidates at all is skipped for every day, so the
/// result may be shorter than 21 or empty.
pub fn select_meals<C, R>(
    catalog: &C,
    rules: &DietaryRules,
    request: &MealRequest,
    rng: &mut R,
) -> Result<Vec<GeneratedMeal>, SelectError>
where
    C: RecipeCatalog + ?Sized,
    R: Rng + ?Sized,
{
    if request.household_size == 0 {
        return Err(SelectError::InvalidHouseholdSize(request.household_size));
    }

    let pool = filter_catalog(catalog, rules, request);
    debug!(
        candidates = pool.len(),
        catalog = catalog.recipes().len(),
        "filtered recipe catalog"
    );

    let mut meals = Vec::with_capacity(usize::from(DAYS_PER_WEEK) * MealType::PLANNED.len());

    for day in 0..DAYS_PER_WEEK {
        let mut used_today: HashSet<&str> = HashSet::new();

        for meal_type in MealType::PLANNED {
            let fresh: Vec<&Recipe> = pool
                .iter()
                .copied()
                .filter(|r| r.serves(meal_type) && !used_today.contains(r.name.as_str()))
                .collect();

            let candidates = if fresh.is_empty() {
                pool.iter().copied().filter(|r| r.serves(meal_type)).collect()
            } else {
                fresh
            };

            let Some(&recipe) = candidates.choose(rng) else {
                continue;
            };

            used_today.insert(recipe.name.as_str());
            meals.push(GeneratedMeal::from_recipe(
                recipe,
                Slot { day, meal_type },
                request.household_size,
            ));
        }
    }

    Ok(meals)
}
