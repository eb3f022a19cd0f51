//! Share link service layer.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use mealmate_db::models::ShareMethod;
use mealmate_db::queries::shares;

use super::{ShareConfig, share_url};
use crate::plan::{PlanWithMeals, get_meal_plan_with_meals, load_meal_plan_with_meals};

/// Record a share of a plan owned by `user_id` and return its public link.
pub async fn share_meal_plan(
    pool: &PgPool,
    config: &ShareConfig,
    user_id: Uuid,
    plan_id: Uuid,
    method: ShareMethod,
) -> Result<String> {
    get_meal_plan_with_meals(pool, user_id, plan_id).await?;
    shares::insert_share(pool, plan_id, user_id, method).await?;

    info!(plan_id = %plan_id, method = %method, "meal plan shared");
    Ok(share_url(config, plan_id))
}

/// Resolve a share token to the plan it grants access to. Returns `None`
/// for a valid token whose plan has since been deleted.
pub async fn open_shared_plan(
    pool: &PgPool,
    config: &ShareConfig,
    token: &str,
) -> Result<Option<PlanWithMeals>> {
    let plan_id = super::validate_share_token(config, token)?;
    load_meal_plan_with_meals(pool, plan_id).await
}
