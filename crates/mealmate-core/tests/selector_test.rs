//! Property tests for meal selection over the built-in and small custom
//! catalogs. Randomness comes from seeded `StdRng`s, so every run is
//! reproducible.

use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;

use mealmate_core::catalog::{RecipeCatalog, StaticCatalog};
use mealmate_core::diet::DietaryRules;
use mealmate_core::selector::{DAYS_PER_WEEK, MealRequest, Slot, filter_catalog, select_meals};
use mealmate_db::models::MealType;

const THREE_BREAKFASTS: &str = r#"
[[recipes]]
name = "Porridge"
cuisine = "British"
meal_types = ["breakfast"]
calories_per_serving = 300
ingredients = [{ name = "Rolled oats", quantity = 0.5, unit = "cup" }]

[[recipes]]
name = "Pancakes"
cuisine = "American"
meal_types = ["breakfast"]
calories_per_serving = 450
ingredients = [
    { name = "Flour", quantity = 1.0, unit = "cup" },
    { name = "Milk", quantity = 1.0, unit = "cup" },
]

[[recipes]]
name = "Fruit Bowl"
cuisine = "American"
meal_types = ["breakfast"]
calories_per_serving = 200
ingredients = [{ name = "Banana", quantity = 1.0, unit = "pcs" }]
"#;

fn request(prefs: &[&str], allergies: &[&str]) -> MealRequest {
    MealRequest {
        dietary_preferences: prefs.iter().map(|s| s.to_string()).collect(),
        allergies: allergies.iter().map(|s| s.to_string()).collect(),
        ..MealRequest::default()
    }
}

// -- filtering tests --

#[test]
fn filtered_catalog_never_contains_excluded_terms() {
    let catalog = StaticCatalog::builtin();
    let rules = DietaryRules::builtin();

    let pref_names: Vec<&str> = rules.preferences().iter().map(|p| p.name.as_str()).collect();
    let allergy_names: Vec<&str> = rules.allergies().iter().map(|a| a.name.as_str()).collect();

    // Every single preference, every single allergy, and each
    // preference paired with each allergy.
    let mut combos: Vec<(Vec<&str>, Vec<&str>)> = Vec::new();
    for p in &pref_names {
        combos.push((vec![*p], vec![]));
        for a in &allergy_names {
            combos.push((vec![*p], vec![*a]));
        }
    }
    for a in &allergy_names {
        combos.push((vec![], vec![*a]));
    }

    for (prefs, allergies) in combos {
        let req = request(&prefs, &allergies);
        let exclusions = rules.exclusions(&req.dietary_preferences, &req.allergies);
        for recipe in filter_catalog(&catalog, &rules, &req) {
            for ingredient in &recipe.ingredients {
                let name = ingredient.name.to_lowercase();
                for term in exclusions.terms() {
                    assert!(
                        !name.contains(term),
                        "{prefs:?}/{allergies:?} kept {:?} with {:?} ({term:?})",
                        recipe.name,
                        ingredient.name
                    );
                }
            }
        }
    }
}

#[test]
fn vegetarian_with_dairy_allergy_excludes_salmon_and_feta() {
    let catalog = StaticCatalog::builtin();
    let rules = DietaryRules::builtin();
    let req = request(&["Vegetarian"], &["Dairy"]);

    let names: HashSet<&str> = filter_catalog(&catalog, &rules, &req)
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert!(!names.contains("Grilled Salmon with Roasted Vegetables"));
    assert!(!names.contains("Mediterranean Quinoa Bowl"));
    assert!(names.contains("Black Bean Tacos"));

    for seed in 0..20 {
        let meals = select_meals(&catalog, &rules, &req, &mut StdRng::seed_from_u64(seed)).unwrap();
        for meal in &meals {
            for ingredient in &meal.ingredients {
                let name = ingredient.name.to_lowercase();
                assert!(!name.contains("salmon") && !name.contains("feta"));
            }
        }
    }
}

#[test]
fn fish_allergy_excludes_caesar_salad() {
    let catalog = StaticCatalog::builtin();
    let rules = DietaryRules::builtin();

    let names = |req: &MealRequest| -> HashSet<String> {
        filter_catalog(&catalog, &rules, req)
            .iter()
            .map(|r| r.name.clone())
            .collect()
    };
    assert!(names(&request(&[], &[])).contains("Chicken Caesar Salad"));
    assert!(!names(&request(&[], &["Fish"])).contains("Chicken Caesar Salad"));
    assert!(names(&request(&[], &["Fish"])).contains("Black Bean Tacos"));
}

#[test]
fn everything_excluded_yields_empty_plan() {
    let catalog = StaticCatalog::parse(THREE_BREAKFASTS).unwrap();
    let rules = DietaryRules::builtin();
    // Oats, flour+milk and banana all go.
    let req = request(&["Gluten-free", "Dairy-free"], &["oats", "banana"]);
    let meals = select_meals(&catalog, &rules, &req, &mut StdRng::seed_from_u64(1)).unwrap();
    assert!(meals.is_empty());
}

// -- selection tests --

#[test]
fn slots_are_unique_and_within_the_week() {
    let catalog = StaticCatalog::builtin();
    let rules = DietaryRules::builtin();
    for seed in 0..50 {
        let meals = select_meals(
            &catalog,
            &rules,
            &MealRequest::default(),
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap();
        let slots: HashSet<Slot> = meals.iter().map(|m| m.slot).collect();
        assert_eq!(slots.len(), meals.len(), "seed {seed} produced a duplicate slot");
        assert!(meals.len() <= usize::from(DAYS_PER_WEEK) * 3);
        assert!(meals.iter().all(|m| m.slot.day < DAYS_PER_WEEK));
        assert!(meals.iter().all(|m| MealType::PLANNED.contains(&m.slot.meal_type)));
    }
}

#[test]
fn meals_are_tagged_for_their_slot() {
    let catalog = StaticCatalog::builtin();
    let rules = DietaryRules::builtin();
    let meals = select_meals(
        &catalog,
        &rules,
        &MealRequest::default(),
        &mut StdRng::seed_from_u64(17),
    )
    .unwrap();
    for meal in &meals {
        let recipe = catalog.find(&meal.recipe_name).unwrap();
        assert!(recipe.serves(meal.slot.meal_type));
    }
}

#[test]
fn no_same_day_repeats_when_alternatives_exist() {
    let catalog = StaticCatalog::builtin();
    let rules = DietaryRules::builtin();
    for seed in 0..50 {
        let meals = select_meals(
            &catalog,
            &rules,
            &MealRequest::default(),
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap();
        for day in 0..DAYS_PER_WEEK {
            let names: Vec<&str> = meals
                .iter()
                .filter(|m| m.slot.day == day)
                .map(|m| m.recipe_name.as_str())
                .collect();
            let distinct: HashSet<&str> = names.iter().copied().collect();
            assert_eq!(distinct.len(), names.len(), "seed {seed} day {day}: {names:?}");
        }
    }
}

#[test]
fn same_seed_same_plan() {
    let catalog = StaticCatalog::builtin();
    let rules = DietaryRules::builtin();
    let req = request(&["Vegetarian"], &[]);
    let a = select_meals(&catalog, &rules, &req, &mut StdRng::seed_from_u64(2024)).unwrap();
    let b = select_meals(&catalog, &rules, &req, &mut StdRng::seed_from_u64(2024)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn picks_are_roughly_uniform() {
    let catalog = StaticCatalog::parse(THREE_BREAKFASTS).unwrap();
    let rules = DietaryRules::builtin();
    let mut counts: HashMap<String, u32> = HashMap::new();

    // 500 weeks x 7 breakfasts = 3500 picks, ~1167 each.
    for seed in 0..500 {
        let meals = select_meals(
            &catalog,
            &rules,
            &MealRequest::default(),
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap();
        for meal in meals {
            *counts.entry(meal.recipe_name).or_default() += 1;
        }
    }

    assert_eq!(counts.len(), 3);
    for (name, count) in &counts {
        assert!(
            (1000..=1350).contains(count),
            "{name} picked {count} times out of 3500"
        );
    }
}

// -- scaling tests --

#[test]
fn household_of_four_scales_one_cup_to_four() {
    let catalog = StaticCatalog::parse(THREE_BREAKFASTS).unwrap();
    let rules = DietaryRules::builtin();
    let req = MealRequest {
        household_size: 4,
        ..MealRequest::default()
    };
    let meals = select_meals(&catalog, &rules, &req, &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(meals.len(), 7);

    for meal in &meals {
        let recipe = catalog.find(&meal.recipe_name).unwrap();
        assert_eq!(meal.servings, 4);
        for (scaled, base) in meal.ingredients.iter().zip(&recipe.ingredients) {
            assert_eq!(scaled.quantity, base.quantity * 4.0);
            assert_eq!(scaled.unit, base.unit);
        }
        if meal.recipe_name == "Pancakes" {
            assert_eq!(meal.ingredients[1].quantity, 4.0);
            assert_eq!(meal.ingredients[1].unit, "cup");
        }
    }
}
