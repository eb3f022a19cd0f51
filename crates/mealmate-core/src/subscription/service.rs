//! Subscription changes and status.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use mealmate_db::models::{Profile, SubscriptionTier};
use mealmate_db::queries::{meal_plans, profiles};

use super::{BillingCycle, TierInfo, compute_expiry, effective_tier, month_start, tier_info};

/// A user's subscription as of now.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    /// Tier stored on the profile.
    pub tier: SubscriptionTier,
    /// Tier after applying expiry.
    pub effective_tier: SubscriptionTier,
    pub expires_at: Option<DateTime<Utc>>,
    pub plans_this_month: i64,
    pub info: &'static TierInfo,
}

/// Move the user to `tier`. Paid tiers expire after one billing cycle;
/// free never expires.
pub async fn change_subscription(
    pool: &PgPool,
    user_id: Uuid,
    tier: SubscriptionTier,
    cycle: BillingCycle,
) -> Result<Profile> {
    profiles::ensure_profile(pool, user_id).await?;

    let expires_at = match tier {
        SubscriptionTier::Free => None,
        _ => Some(compute_expiry(cycle, Utc::now()).context("subscription expiry out of range")?),
    };

    let profile = profiles::update_subscription(pool, user_id, tier, expires_at).await?;
    info!(user_id = %user_id, tier = %tier, cycle = %cycle, "subscription changed");
    Ok(profile)
}

/// Return the user to the free tier.
pub async fn cancel_subscription(pool: &PgPool, user_id: Uuid) -> Result<Profile> {
    change_subscription(pool, user_id, SubscriptionTier::Free, BillingCycle::Monthly).await
}

pub async fn subscription_status(pool: &PgPool, user_id: Uuid) -> Result<SubscriptionStatus> {
    let profile = profiles::ensure_profile(pool, user_id).await?;
    let now = Utc::now();
    let effective = effective_tier(profile.subscription_tier, profile.subscription_expires_at, now);
    let plans_this_month =
        meal_plans::count_meal_plans_since(pool, user_id, month_start(now)).await?;

    Ok(SubscriptionStatus {
        tier: profile.subscription_tier,
        effective_tier: effective,
        expires_at: profile.subscription_expires_at,
        plans_this_month,
        info: tier_info(effective),
    })
}
