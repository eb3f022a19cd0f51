//! Plan reference resolution.
//!
//! Commands that act on a plan accept either a UUID or the word `latest`,
//! meaning the user's most recently created plan.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use mealmate_db::queries::meal_plans;

/// A plan reference as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRef {
    Latest,
    Id(Uuid),
}

impl PlanRef {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        let id = Uuid::parse_str(input)
            .with_context(|| format!("invalid plan ID: {input:?} (expected a UUID or `latest`)"))?;
        Ok(Self::Id(id))
    }
}

/// Resolve `input` to a plan ID for `user_id`.
pub async fn resolve_plan_id(pool: &PgPool, user_id: Uuid, input: &str) -> Result<Uuid> {
    match PlanRef::parse(input)? {
        PlanRef::Id(id) => Ok(id),
        PlanRef::Latest => {
            let plan = meal_plans::latest_meal_plan_for_user(pool, user_id)
                .await?
                .context("no meal plans yet; run `mealmate plan generate` first")?;
            Ok(plan.id)
        }
    }
}
