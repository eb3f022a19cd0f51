//! Persisted weekly meal plans.
//!
//! [`service`] runs the selector against a user's profile and writes the
//! plan and its meals in one transaction.

pub mod service;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use mealmate_db::models::{Meal, MealPlan};

pub use service::{
    delete_meal_plan, generate_meal_plan, get_meal_plan_with_meals, load_meal_plan_with_meals,
};

/// Returned in place of a plan when filtering leaves nothing to pick from.
pub const NO_SUITABLE_MEALS_MESSAGE: &str = "No suitable meals found for your preferences.";

/// Day names indexed by `day_of_week` (0 = Sunday).
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Name for a stored `day_of_week`, or `"Unknown"` outside 0..=6.
pub fn day_name(day_of_week: i32) -> &'static str {
    usize::try_from(day_of_week)
        .ok()
        .and_then(|d| DAY_NAMES.get(d))
        .copied()
        .unwrap_or("Unknown")
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_sunday()))
}

/// `"Meal Plan - 3/2/2025"`.
pub fn plan_title(week_start: NaiveDate) -> String {
    format!("Meal Plan - {}", week_start.format("%-m/%-d/%Y"))
}

/// A plan together with its meals in slot order.
#[derive(Debug, Clone, Serialize)]
pub struct PlanWithMeals {
    pub plan: MealPlan,
    pub meals: Vec<Meal>,
}

/// Result of a generation request.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Generated(PlanWithMeals),
    /// Nothing matched; nothing was stored.
    NoSuitableMeals,
}

impl GenerationOutcome {
    /// Message to show when nothing was generated.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Generated(_) => None,
            Self::NoSuitableMeals => Some(NO_SUITABLE_MEALS_MESSAGE),
        }
    }
}

/// The plan does not exist or belongs to someone else.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("meal plan {0} not found")]
pub struct PlanNotFound(pub Uuid);

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2025-03-05 is a Wednesday.
        assert_eq!(week_start(date(2025, 3, 5)), date(2025, 3, 2));
        assert_eq!(week_start(date(2025, 3, 2)), date(2025, 3, 2));
        assert_eq!(week_start(date(2025, 3, 8)), date(2025, 3, 2));
        // Across a year boundary.
        assert_eq!(week_start(date(2025, 1, 1)), date(2024, 12, 29));
    }

    #[test]
    fn title_uses_us_date() {
        assert_eq!(plan_title(date(2025, 3, 2)), "Meal Plan - 3/2/2025");
        assert_eq!(plan_title(date(2024, 12, 29)), "Meal Plan - 12/29/2024");
    }

    #[test]
    fn day_names() {
        assert_eq!(day_name(0), "Sunday");
        assert_eq!(day_name(6), "Saturday");
        assert_eq!(day_name(7), "Unknown");
        assert_eq!(day_name(-1), "Unknown");
    }

    #[test]
    fn outcome_message() {
        assert_eq!(
            GenerationOutcome::NoSuitableMeals.message(),
            Some("No suitable meals found for your preferences.")
        );
    }
}
