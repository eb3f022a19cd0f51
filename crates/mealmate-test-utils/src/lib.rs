//! Database fixtures for mealmate integration tests.
//!
//! All tests in a binary share one PostgreSQL server: the one named by
//! `MEALMATE_TEST_PG_URL`, or a `postgres:16-alpine` container started on
//! first use. Every test gets its own migrated database on that server.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use mealmate_db::models::{MealPlan, SubscriptionTier};
use mealmate_db::pool;
use mealmate_db::queries::meal_plans::{self, NewMealPlan};
use mealmate_db::queries::profiles;

/// Sunday used as the week of every seeded plan.
pub const SEED_WEEK: (i32, u32, u32) = (2025, 3, 2);

struct TestServer {
    /// Server root, without a database name.
    url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

impl TestServer {
    async fn start() -> Self {
        if let Ok(url) = std::env::var("MEALMATE_TEST_PG_URL") {
            return Self {
                url: url.trim_end_matches('/').to_owned(),
                _container: None,
            };
        }

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .expect("postgres container should start");
        let host = container.get_host().await.expect("container host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("container port 5432");

        Self {
            url: format!("postgresql://postgres:postgres@{host}:{port}"),
            _container: Some(container),
        }
    }

    async fn connect(&self, database: &str, max_connections: u32) -> PgPool {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&format!("{}/{database}", self.url))
            .await
            .unwrap_or_else(|e| panic!("connect to test database {database}: {e}"))
    }
}

static SERVER: OnceCell<TestServer> = OnceCell::const_new();

async fn server() -> &'static TestServer {
    SERVER.get_or_init(TestServer::start).await
}

/// Root URL of the shared server, for tests that build their own
/// `DbConfig`.
pub async fn pg_url() -> &'static str {
    &server().await.url
}

/// Create a fresh `mealmate_test_*` database with all migrations applied.
///
/// Returns `(pool, db_name)`; hand `db_name` to [`drop_test_db`] when done.
pub async fn create_test_db() -> (PgPool, String) {
    let server = server().await;
    let db_name = format!("mealmate_test_{}", Uuid::new_v4().simple());

    let maintenance = server.connect("postgres", 1).await;
    maintenance
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("create {db_name}: {e}"));
    maintenance.close().await;

    let pool = server.connect(&db_name, 5).await;
    pool::run_migrations(&pool)
        .await
        .unwrap_or_else(|e| panic!("migrate {db_name}: {e:#}"));
    (pool, db_name)
}

/// Drop a database made by [`create_test_db`], closing any sessions still
/// attached. Errors are ignored so cleanup never masks a test failure.
pub async fn drop_test_db(db_name: &str) {
    let maintenance = server().await.connect("postgres", 1).await;
    let _ = sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = $1 AND pid <> pg_backend_pid()",
    )
    .bind(db_name)
    .execute(&maintenance)
    .await;
    let _ = maintenance
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maintenance.close().await;
}

/// A test database holding one free-tier user with default preferences.
///
/// Returns `(pool, db_name, user_id)`.
pub async fn create_test_db_with_user() -> (PgPool, String, Uuid) {
    create_test_db_with_tier(SubscriptionTier::Free).await
}

/// A test database holding one user on `tier`. Paid tiers are active for
/// the next 30 days.
pub async fn create_test_db_with_tier(tier: SubscriptionTier) -> (PgPool, String, Uuid) {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();
    profiles::ensure_profile(&pool, user_id)
        .await
        .expect("seed profile");

    if tier != SubscriptionTier::Free {
        let expires = Utc::now() + chrono::Duration::days(30);
        profiles::update_subscription(&pool, user_id, tier, Some(expires))
            .await
            .expect("seed subscription");
    }
    (pool, db_name, user_id)
}

/// Insert an empty plan titled `title` for the week of [`SEED_WEEK`].
pub async fn seed_meal_plan(pool: &PgPool, user_id: Uuid, title: &str) -> MealPlan {
    let (year, month, day) = SEED_WEEK;
    meal_plans::insert_meal_plan(
        pool,
        &NewMealPlan {
            user_id,
            title,
            week_start_date: NaiveDate::from_ymd_opt(year, month, day).expect("valid seed week"),
            dietary_preferences: &[],
            total_calories: 0,
        },
    )
    .await
    .expect("seed meal plan")
}
