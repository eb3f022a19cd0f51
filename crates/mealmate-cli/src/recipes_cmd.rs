//! `mealmate recipes`: list the catalog, optionally filtered the same way
//! plan generation filters it.

use anyhow::Result;

use mealmate_core::catalog::{Recipe, RecipeCatalog};
use mealmate_core::diet::DietaryRules;
use mealmate_core::selector::{MealRequest, filter_catalog};

use crate::RecipeFilterArgs;

pub fn run_recipes<C: RecipeCatalog>(catalog: &C, filter: &RecipeFilterArgs) -> Result<()> {
    let recipes = matching_recipes(catalog, &DietaryRules::builtin(), filter);

    if recipes.is_empty() {
        println!("No recipes match those filters.");
        return Ok(());
    }

    let name_w = recipes.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);
    let cuisine_w = recipes.iter().map(|r| r.cuisine.len()).max().unwrap_or(7).max(7);

    println!(
        "{:<name_w$}  {:<cuisine_w$}  {:<24}  {:>5}  {:>8}",
        "NAME", "CUISINE", "MEALS", "CAL", "MINUTES",
    );
    for recipe in &recipes {
        let meals: Vec<String> = recipe.meal_types.iter().map(|m| m.to_string()).collect();
        println!(
            "{:<name_w$}  {:<cuisine_w$}  {:<24}  {:>5}  {:>8}",
            recipe.name,
            recipe.cuisine,
            meals.join(","),
            recipe.calories_per_serving,
            recipe.prep_time + recipe.cook_time,
        );
    }
    println!();
    println!("{} of {} recipes", recipes.len(), catalog.recipes().len());

    Ok(())
}

fn matching_recipes<'c, C: RecipeCatalog>(
    catalog: &'c C,
    rules: &DietaryRules,
    filter: &RecipeFilterArgs,
) -> Vec<&'c Recipe> {
    let request = MealRequest {
        dietary_preferences: filter.preferences.clone(),
        allergies: filter.allergies.clone(),
        cuisines: filter.cuisines.clone(),
        ..MealRequest::default()
    };
    filter_catalog(catalog, rules, &request)
        .into_iter()
        .filter(|r| filter.meal_type.is_none_or(|m| r.serves(m)))
        .collect()
}
