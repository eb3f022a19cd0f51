//! PostgreSQL persistence for mealmate: models, migrations, pool, queries.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
