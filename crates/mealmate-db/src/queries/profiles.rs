//! Database query functions for the `profiles` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Profile, SubscriptionTier};

/// Planning defaults written back after a plan is generated or when the
/// user edits their profile.
#[derive(Debug, Clone)]
pub struct PreferencesUpdate<'a> {
    pub dietary_preferences: &'a [String],
    pub allergies: &'a [String],
    pub cooking_skill_level: Option<&'a str>,
    pub household_size: i32,
}

/// Return the profile for `id`, creating a default one if none exists.
pub async fn ensure_profile<'e, E>(executor: E, id: Uuid) -> Result<Profile>
where
    E: sqlx::PgExecutor<'e>,
{
    // The no-op update makes RETURNING yield the existing row on conflict.
    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (id) VALUES ($1) \
         ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id \
         RETURNING *",
    )
    .bind(id)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to ensure profile {id}"))?;

    Ok(profile)
}

/// Fetch a profile and hold a row lock on it until the surrounding
/// transaction ends. Plan generation holds it while counting the user's
/// plans against their quota.
pub async fn lock_profile<'e, E>(executor: E, id: Uuid) -> Result<Profile>
where
    E: sqlx::PgExecutor<'e>,
{
    let profile =
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("failed to lock profile")?;

    profile.with_context(|| format!("profile {id} not found"))
}

/// Fetch a profile by user ID.
pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch profile")?;

    Ok(profile)
}

/// Overwrite the stored planning defaults. Fails if the profile is missing.
pub async fn update_preferences<'e, E>(
    executor: E,
    id: Uuid,
    update: &PreferencesUpdate<'_>,
) -> Result<Profile>
where
    E: sqlx::PgExecutor<'e>,
{
    let profile = sqlx::query_as::<_, Profile>(
        "UPDATE profiles \
         SET dietary_preferences = $2, allergies = $3, cooking_skill_level = $4, \
             household_size = $5, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(update.dietary_preferences)
    .bind(update.allergies)
    .bind(update.cooking_skill_level)
    .bind(update.household_size)
    .fetch_optional(executor)
    .await
    .context("failed to update profile preferences")?;

    profile.with_context(|| format!("profile {id} not found"))
}

/// Set the subscription tier and expiry.
pub async fn update_subscription(
    pool: &PgPool,
    id: Uuid,
    tier: SubscriptionTier,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        "UPDATE profiles \
         SET subscription_tier = $2, subscription_expires_at = $3, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(tier)
    .bind(expires_at)
    .fetch_optional(pool)
    .await
    .context("failed to update subscription")?;

    profile.with_context(|| format!("profile {id} not found"))
}
