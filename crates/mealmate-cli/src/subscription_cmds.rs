//! CLI handlers for `mealmate subscription` subcommands.
//!
//! Tier changes are recorded locally; no payment is taken.

use anyhow::{Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use mealmate_core::subscription::service::{
    cancel_subscription, change_subscription, subscription_status,
};
use mealmate_core::subscription::{BillingCycle, TIERS, TierInfo, format_price, tier_info};
use mealmate_db::models::{Profile, SubscriptionTier};

use crate::SubscriptionCommands;

pub async fn run_subscription_command(
    command: SubscriptionCommands,
    pool: &PgPool,
    user_id: Uuid,
) -> Result<()> {
    match command {
        SubscriptionCommands::Show => {
            let status = subscription_status(pool, user_id).await?;
            println!("Tier:        {}", status.info.name);
            if status.effective_tier != status.tier {
                println!("             ({} expired, limits of {} apply)", status.tier, status.effective_tier);
            }
            match status.expires_at {
                Some(at) => println!("Renews:      {}", at.format("%Y-%m-%d")),
                None => println!("Renews:      never"),
            }
            match status.info.plans_per_month {
                Some(limit) => println!("This month:  {} of {limit} plans", status.plans_this_month),
                None => println!("This month:  {} plans (unlimited)", status.plans_this_month),
            }
            println!("Household:   {}", household_limit(status.info));
            Ok(())
        }
        SubscriptionCommands::Plans => {
            print_tiers();
            Ok(())
        }
        SubscriptionCommands::Upgrade { tier, yearly } => {
            if tier == SubscriptionTier::Free {
                bail!("use `mealmate subscription cancel` to return to the free tier");
            }
            let cycle = if yearly {
                BillingCycle::Yearly
            } else {
                BillingCycle::Monthly
            };
            let profile = change_subscription(pool, user_id, tier, cycle).await?;
            let price = format_price(cycle.price_cents(tier_info(tier)));
            let period = match cycle {
                BillingCycle::Monthly => "month",
                BillingCycle::Yearly => "year",
            };
            println!("Recorded {price} per {period} (no payment taken).");
            print_change(&profile);
            Ok(())
        }
        SubscriptionCommands::Cancel => {
            let profile = cancel_subscription(pool, user_id).await?;
            print_change(&profile);
            Ok(())
        }
    }
}

/// `subscription plans` needs no database.
pub fn print_tiers() {
    for info in &TIERS {
        println!(
            "{:<8} {:>7}/month  {:>8}/year",
            info.name,
            format_price(info.monthly_price_cents),
            format_price(info.yearly_price_cents),
        );
        for feature in info.features {
            println!("    - {feature}");
        }
    }
}

fn household_limit(info: &TierInfo) -> String {
    match info.max_household_size {
        Some(1) => "1 person".to_string(),
        Some(n) => format!("up to {n} people"),
        None => "any size".to_string(),
    }
}

fn print_change(profile: &Profile) {
    match profile.subscription_expires_at {
        Some(at) => println!(
            "Subscription is now {} until {}.",
            profile.subscription_tier,
            at.format("%Y-%m-%d")
        ),
        None => println!("Subscription is now {}.", profile.subscription_tier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_limits_read_naturally() {
        assert_eq!(household_limit(tier_info(SubscriptionTier::Free)), "1 person");
        assert_eq!(household_limit(tier_info(SubscriptionTier::Premium)), "up to 6 people");
        assert_eq!(household_limit(tier_info(SubscriptionTier::Pro)), "any size");
    }
}
