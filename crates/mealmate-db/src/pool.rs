//! Connection pool, embedded migrations, and the helpers behind
//! `mealmate db-init`.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/mealmate-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Every table mealmate owns, parents before children.
pub const TABLES: [&str; 5] = [
    "profiles",
    "meal_plans",
    "meals",
    "shopping_lists",
    "meal_plan_shares",
];

/// PostgreSQL truncates identifiers longer than this.
const MAX_IDENTIFIER_BYTES: usize = 63;

/// Pool size for the CLI and the HTTP server.
const POOL_SIZE: u32 = 5;

/// A database name that `db-init` refuses to create.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseNameError {
    #[error("database URL has no database name")]
    Missing,

    #[error("database name {0:?} is longer than 63 bytes")]
    TooLong(String),

    #[error("database name {0:?} must start with a lowercase letter or underscore")]
    BadStart(String),

    #[error("database name {0:?} may only contain lowercase letters, digits and underscores")]
    BadCharacter(String),
}

/// Check a name before it is spliced into `CREATE DATABASE`.
///
/// Only unquoted lowercase identifiers are accepted. Postgres folds an
/// unquoted `Meals` to `meals`, so a mixed-case name would never match the
/// `pg_database` lookup and `db-init` would try to create it on every run.
pub fn validate_database_name(name: &str) -> Result<(), DatabaseNameError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(DatabaseNameError::Missing);
    };
    if name.len() > MAX_IDENTIFIER_BYTES {
        return Err(DatabaseNameError::TooLong(name.to_owned()));
    }
    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(DatabaseNameError::BadStart(name.to_owned()));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(DatabaseNameError::BadCharacter(name.to_owned()));
    }
    Ok(())
}

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Open the pool used by every mealmate command that touches storage.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(&config.database_url, POOL_SIZE).await
}

/// Apply pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("migrations applied");
    Ok(())
}

/// Create the configured database if it is missing. Returns `true` when it
/// was created by this call.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let name = config.database_name().unwrap_or_default();
    validate_database_name(name)?;

    let maintenance = connect(&config.maintenance_url(), 1).await?;
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&maintenance)
            .await
            .context("failed to query pg_database")?;

    if !exists {
        maintenance
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .with_context(|| format!("failed to create database {name}"))?;
        info!(db = name, "database created");
    } else {
        debug!(db = name, "database already exists");
    }

    maintenance.close().await;
    Ok(!exists)
}

/// Row count of each mealmate table, in [`TABLES`] order.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_lowercase_names() {
        assert_eq!(validate_database_name("mealmate"), Ok(()));
        assert_eq!(validate_database_name("_meals_2025"), Ok(()));
        assert_eq!(validate_database_name(&"m".repeat(63)), Ok(()));
    }

    #[test]
    fn rejects_names_postgres_would_fold_or_truncate() {
        assert_eq!(validate_database_name(""), Err(DatabaseNameError::Missing));
        assert!(matches!(
            validate_database_name(&"m".repeat(64)),
            Err(DatabaseNameError::TooLong(_))
        ));
        assert!(matches!(
            validate_database_name("2meals"),
            Err(DatabaseNameError::BadStart(_))
        ));
        assert!(matches!(
            validate_database_name("MealMate"),
            Err(DatabaseNameError::BadStart(_))
        ));
        assert!(matches!(
            validate_database_name("meal-mate"),
            Err(DatabaseNameError::BadCharacter(_))
        ));
        assert!(matches!(
            validate_database_name("meals; DROP TABLE x"),
            Err(DatabaseNameError::BadCharacter(_))
        ));
    }

    #[test]
    fn tables_list_parents_first() {
        let position = |name| TABLES.iter().position(|t| *t == name).unwrap();
        assert!(position("profiles") < position("meal_plans"));
        assert!(position("meal_plans") < position("meals"));
        assert!(position("meal_plans") < position("shopping_lists"));
        assert!(position("meal_plans") < position("meal_plan_shares"));
    }
}
