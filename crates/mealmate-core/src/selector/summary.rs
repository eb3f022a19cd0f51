use std::collections::BTreeSet;

use mealmate_db::models::Meal;
use serde::Serialize;

use super::GeneratedMeal;

/// Calorie totals for a plan, compared against an optional daily target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub meal_count: usize,
    pub days_covered: usize,
    /// Sum of calories per serving over every meal.
    pub total_calories: u64,
    /// `total_calories / days_covered`, 0 for an empty plan.
    pub average_daily_calories: u64,
    pub calorie_target: Option<u32>,
    /// Average daily calories minus the target.
    pub target_delta: Option<i64>,
}

impl PlanSummary {
    pub fn from_generated(meals: &[GeneratedMeal], calorie_target: Option<u32>) -> Self {
        Self::build(
            meals
                .iter()
                .map(|m| (i32::from(m.slot.day), u64::from(m.calories_per_serving))),
            calorie_target,
        )
    }

    pub fn from_meals(meals: &[Meal], calorie_target: Option<u32>) -> Self {
        Self::build(
            meals.iter().map(|m| {
                (
                    m.day_of_week,
                    u64::try_from(m.calories_per_serving).unwrap_or(0),
                )
            }),
            calorie_target,
        )
    }

    fn build(entries: impl Iterator<Item = (i32, u64)>, calorie_target: Option<u32>) -> Self {
        let mut days = BTreeSet::new();
        let mut meal_count = 0;
        let mut total_calories = 0u64;
        for (day, calories) in entries {
            days.insert(day);
            meal_count += 1;
            total_calories += calories;
        }

        let days_covered = days.len();
        let average_daily_calories = match days_covered {
            0 => 0,
            n => total_calories / n as u64,
        };
        let target_delta = calorie_target.map(|target| {
            i64::try_from(average_daily_calories).unwrap_or(i64::MAX) - i64::from(target)
        });

        Self {
            meal_count,
            days_covered,
            total_calories,
            average_daily_calories,
            calorie_target,
            target_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::diet::DietaryRules;
    use crate::selector::{MealRequest, select_meals};

    #[test]
    fn empty_plan_summary() {
        let summary = PlanSummary::from_generated(&[], Some(2000));
        assert_eq!(summary.meal_count, 0);
        assert_eq!(summary.days_covered, 0);
        assert_eq!(summary.average_daily_calories, 0);
        assert_eq!(summary.target_delta, Some(-2000));
    }

    #[test]
    fn summary_totals_match_meals() {
        let catalog = StaticCatalog::builtin();
        let rules = DietaryRules::builtin();
        let meals = select_meals(
            &catalog,
            &rules,
            &MealRequest::default(),
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();

        let expected: u64 = meals.iter().map(|m| u64::from(m.calories_per_serving)).sum();
        let summary = PlanSummary::from_generated(&meals, None);
        assert_eq!(summary.meal_count, 21);
        assert_eq!(summary.days_covered, 7);
        assert_eq!(summary.total_calories, expected);
        assert_eq!(summary.average_daily_calories, expected / 7);
        assert_eq!(summary.target_delta, None);
    }

    #[test]
    fn household_size_does_not_change_calories() {
        let catalog = StaticCatalog::builtin();
        let rules = DietaryRules::builtin();
        let single = select_meals(
            &catalog,
            &rules,
            &MealRequest::default(),
            &mut StdRng::seed_from_u64(8),
        )
        .unwrap();
        let family = select_meals(
            &catalog,
            &rules,
            &MealRequest {
                household_size: 5,
                ..MealRequest::default()
            },
            &mut StdRng::seed_from_u64(8),
        )
        .unwrap();

        assert_eq!(
            PlanSummary::from_generated(&single, None).total_calories,
            PlanSummary::from_generated(&family, None).total_calories,
        );
    }
}
