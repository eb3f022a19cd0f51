//! Subscription tiers and entitlement checks.
//!
//! Tier changes are recorded locally; no payment processor is involved.

pub mod service;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveTime, Utc};
use mealmate_db::models::{ParseEnumError, SubscriptionTier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pricing and limits for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierInfo {
    pub tier: SubscriptionTier,
    pub name: &'static str,
    pub monthly_price_cents: u32,
    pub yearly_price_cents: u32,
    /// `None` means unlimited.
    pub plans_per_month: Option<u32>,
    /// `None` means unlimited.
    pub max_household_size: Option<u32>,
    pub features: &'static [&'static str],
}

pub const TIERS: [TierInfo; 3] = [
    TierInfo {
        tier: SubscriptionTier::Free,
        name: "Free",
        monthly_price_cents: 0,
        yearly_price_cents: 0,
        plans_per_month: Some(3),
        max_household_size: Some(1),
        features: &[
            "3 meal plans per month",
            "Single-person household",
            "Dietary and allergy filters",
            "Shopping lists",
        ],
    },
    TierInfo {
        tier: SubscriptionTier::Premium,
        name: "Premium",
        monthly_price_cents: 999,
        yearly_price_cents: 9999,
        plans_per_month: None,
        max_household_size: Some(6),
        features: &[
            "Unlimited meal plans",
            "Households of up to 6",
            "Dietary and allergy filters",
            "Shopping lists",
        ],
    },
    TierInfo {
        tier: SubscriptionTier::Pro,
        name: "Pro",
        monthly_price_cents: 1999,
        yearly_price_cents: 19999,
        plans_per_month: None,
        max_household_size: None,
        features: &[
            "Unlimited meal plans",
            "Any household size",
            "Dietary and allergy filters",
            "Shopping lists",
        ],
    },
];

pub fn tier_info(tier: SubscriptionTier) -> &'static TierInfo {
    match tier {
        SubscriptionTier::Free => &TIERS[0],
        SubscriptionTier::Premium => &TIERS[1],
        SubscriptionTier::Pro => &TIERS[2],
    }
}

/// `999` -> `"$9.99"`.
pub fn format_price(cents: u32) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

/// How often a paid tier renews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        }
    }

    pub fn price_cents(self, info: &TierInfo) -> u32 {
        match self {
            Self::Monthly => info.monthly_price_cents,
            Self::Yearly => info.yearly_price_cents,
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => f.write_str("monthly"),
            Self::Yearly => f.write_str("yearly"),
        }
    }
}

impl FromStr for BillingCycle {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(ParseEnumError::new("billing cycle", s)),
        }
    }
}

/// Expiry for a paid tier bought at `now`. `None` only if the date
/// arithmetic overflows.
pub fn compute_expiry(cycle: BillingCycle, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.checked_add_months(Months::new(cycle.months()))
}

/// The tier the user is entitled to at `now`: a paid tier past its expiry
/// counts as free.
pub fn effective_tier(
    tier: SubscriptionTier,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SubscriptionTier {
    match (tier, expires_at) {
        (SubscriptionTier::Free, _) => SubscriptionTier::Free,
        (_, Some(expiry)) if expiry <= now => SubscriptionTier::Free,
        (paid, _) => paid,
    }
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive() - Days::new(u64::from(now.day0()));
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Errors raised when a request exceeds the user's tier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("the {tier} tier allows {limit} meal plans per month and {used} have been created; upgrade for more")]
    PlanLimitReached {
        tier: SubscriptionTier,
        limit: u32,
        used: u64,
    },

    #[error("the {tier} tier supports households of up to {max}, requested {requested}")]
    HouseholdTooLarge {
        tier: SubscriptionTier,
        max: u32,
        requested: u32,
    },
}

/// Check whether a user on `tier` may generate another plan.
pub fn check_generation(
    tier: SubscriptionTier,
    plans_this_month: u64,
    household_size: u32,
) -> Result<(), EntitlementError> {
    let info = tier_info(tier);

    if let Some(limit) = info.plans_per_month {
        if plans_this_month >= u64::from(limit) {
            return Err(EntitlementError::PlanLimitReached {
                tier,
                limit,
                used: plans_this_month,
            });
        }
    }

    if let Some(max) = info.max_household_size {
        if household_size > max {
            return Err(EntitlementError::HouseholdTooLarge {
                tier,
                max,
                requested: household_size,
            });
        }
    }

    Ok(())
}
