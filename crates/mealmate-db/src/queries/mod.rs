//! Query functions, one module per table.

pub mod meal_plans;
pub mod meals;
pub mod profiles;
pub mod shares;
pub mod shopping_lists;
