use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enum parse error
// ---------------------------------------------------------------------------

/// Error returned when a string does not name a variant of one of the
/// enums in this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    /// Human-readable name of the enum (e.g. "meal type").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Meal type a recipe can be tagged with and a slot is keyed on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Meal types filled by the weekly planner, in slot order.
    pub const PLANNED: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    /// Capitalized label for display ("Breakfast").
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        };
        f.write_str(s)
    }
}

impl FromStr for MealType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            _ => Err(ParseEnumError::new("meal type", s)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Subscription tier stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Premium,
    Pro,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [Self::Free, Self::Premium, Self::Pro];
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Pro => "pro",
        };
        f.write_str(s)
    }
}

impl FromStr for SubscriptionTier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            "pro" => Ok(Self::Pro),
            _ => Err(ParseEnumError::new("subscription tier", s)),
        }
    }
}

// ---------------------------------------------------------------------------

/// How a meal plan was shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShareMethod {
    Link,
    Email,
}

impl fmt::Display for ShareMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Link => "link",
            Self::Email => "email",
        };
        f.write_str(s)
    }
}

impl FromStr for ShareMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" => Ok(Self::Link),
            "email" => Ok(Self::Email),
            _ => Err(ParseEnumError::new("share method", s)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Grocery department a shopping list item is filed under.
///
/// Serialized with the display label, e.g. `"Meat & Seafood"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Produce,
    #[serde(rename = "Meat & Seafood")]
    MeatSeafood,
    #[serde(rename = "Dairy & Eggs")]
    DairyEggs,
    Bakery,
    Frozen,
    Beverages,
    Pantry,
}

impl Category {
    /// Every category, in matching priority order. `Pantry` is the fallback
    /// and always last.
    pub const ALL: [Category; 7] = [
        Self::Produce,
        Self::MeatSeafood,
        Self::DairyEggs,
        Self::Bakery,
        Self::Frozen,
        Self::Beverages,
        Self::Pantry,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Produce => "Produce",
            Self::MeatSeafood => "Meat & Seafood",
            Self::DairyEggs => "Dairy & Eggs",
            Self::Bakery => "Bakery",
            Self::Frozen => "Frozen",
            Self::Beverages => "Beverages",
            Self::Pantry => "Pantry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseEnumError::new("category", s))
    }
}

// ---------------------------------------------------------------------------
// JSON value types
// ---------------------------------------------------------------------------

/// An ingredient: a recipe template entry, or a scaled line item on a meal.
///
/// Stored rows may predate validation, so a missing or `null` quantity reads
/// as `0` and a missing unit reads as the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Macronutrients in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionInfo {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

impl NutritionInfo {
    /// Multiply every value by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
        }
    }
}

impl Add for NutritionInfo {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
            fiber: self.fiber + rhs.fiber,
        }
    }
}

impl AddAssign for NutritionInfo {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// One consolidated line of a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: Category,
    #[serde(default)]
    pub checked: bool,
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A user's planning defaults and subscription.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub dietary_preferences: Vec<String>,
    pub allergies: Vec<String>,
    pub cooking_skill_level: Option<String>,
    pub household_size: i32,
    pub subscription_tier: SubscriptionTier,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A generated week of meals.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub week_start_date: NaiveDate,
    pub dietary_preferences: Vec<String>,
    pub total_calories: i32,
    pub created_at: DateTime<Utc>,
}

/// One meal occupying a (day, meal type) slot of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub meal_plan_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: i32,
    pub meal_type: MealType,
    pub recipe_name: String,
    pub recipe_description: String,
    pub cuisine: String,
    pub ingredients: Json<Vec<Ingredient>>,
    pub instructions: Vec<String>,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub calories_per_serving: i32,
    pub nutrition_info: Json<NutritionInfo>,
    pub created_at: DateTime<Utc>,
}

/// The shopping list derived from a plan. At most one per plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingList {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_plan_id: Uuid,
    pub title: String,
    pub items: Json<Vec<ShoppingListItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record written each time a plan is shared.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlanShare {
    pub id: Uuid,
    pub meal_plan_id: Uuid,
    pub user_id: Uuid,
    pub share_method: ShareMethod,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_display_roundtrip() {
        for mt in [
            MealType::Breakfast,
            MealType::Lunch,
            MealType::Dinner,
            MealType::Snack,
        ] {
            let parsed: MealType = mt.to_string().parse().unwrap();
            assert_eq!(parsed, mt);
        }
    }

    #[test]
    fn meal_type_parse_is_case_insensitive() {
        assert_eq!("Dinner".parse::<MealType>().unwrap(), MealType::Dinner);
        assert_eq!(" LUNCH ".parse::<MealType>().unwrap(), MealType::Lunch);
    }

    #[test]
    fn meal_type_parse_rejects_unknown() {
        let err = "brunch".parse::<MealType>().unwrap_err();
        assert_eq!(err.to_string(), "invalid meal type: \"brunch\"");
    }

    #[test]
    fn subscription_tier_parse() {
        assert_eq!(
            "Premium".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Premium
        );
        assert!("gold".parse::<SubscriptionTier>().is_err());
    }

    #[test]
    fn category_serializes_with_label() {
        let json = serde_json::to_string(&Category::MeatSeafood).unwrap();
        assert_eq!(json, "\"Meat & Seafood\"");
        let back: Category = serde_json::from_str("\"Dairy & Eggs\"").unwrap();
        assert_eq!(back, Category::DairyEggs);
    }

    #[test]
    fn category_parse_accepts_labels() {
        assert_eq!("produce".parse::<Category>().unwrap(), Category::Produce);
        assert_eq!(
            "meat & seafood".parse::<Category>().unwrap(),
            Category::MeatSeafood
        );
        assert!("Deli".parse::<Category>().is_err());
    }

    #[test]
    fn category_all_ends_with_pantry() {
        assert_eq!(Category::ALL.len(), 7);
        assert_eq!(Category::ALL[6], Category::Pantry);
    }

    #[test]
    fn ingredient_tolerates_missing_fields() {
        let ing: Ingredient = serde_json::from_str(r#"{"name": "Salt"}"#).unwrap();
        assert_eq!(ing.quantity, 0.0);
        assert_eq!(ing.unit, "");

        let ing: Ingredient =
            serde_json::from_str(r#"{"name": "Salt", "quantity": null, "unit": null}"#).unwrap();
        assert_eq!(ing.quantity, 0.0);
        assert_eq!(ing.unit, "");
    }

    #[test]
    fn shopping_item_checked_defaults_false() {
        let item: ShoppingListItem = serde_json::from_str(
            r#"{"name": "Rice", "quantity": 2.0, "unit": "cup", "category": "Pantry"}"#,
        )
        .unwrap();
        assert!(!item.checked);
        assert_eq!(item.category, Category::Pantry);
    }

    #[test]
    fn nutrition_scaled_and_summed() {
        let base = NutritionInfo {
            protein: 10.0,
            carbs: 20.0,
            fat: 5.0,
            fiber: 2.0,
        };
        let doubled = base.scaled(2.0);
        assert_eq!(doubled.protein, 20.0);
        assert_eq!(doubled.fiber, 4.0);

        let mut total = NutritionInfo::default();
        total += base;
        total += doubled;
        assert_eq!(total.carbs, 60.0);
    }
}
