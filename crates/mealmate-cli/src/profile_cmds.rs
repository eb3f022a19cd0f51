//! CLI handlers for `mealmate profile` subcommands.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use mealmate_core::diet::DietaryRules;
use mealmate_db::models::Profile;
use mealmate_db::queries::profiles::{self, PreferencesUpdate};

use crate::ProfileCommands;

pub async fn run_profile_command(
    command: ProfileCommands,
    pool: &PgPool,
    user_id: Uuid,
) -> Result<()> {
    match command {
        ProfileCommands::Show => {
            let profile = profiles::ensure_profile(pool, user_id).await?;
            print_profile(&profile);
            Ok(())
        }
        ProfileCommands::Set {
            preferences,
            allergies,
            household_size,
            cooking_skill,
        } => {
            if household_size == Some(0) {
                bail!("household size must be at least 1");
            }
            let current = profiles::ensure_profile(pool, user_id).await?;

            let preferences = preferences
                .map(clean_list)
                .unwrap_or(current.dietary_preferences);
            let allergies = allergies.map(clean_list).unwrap_or(current.allergies);
            warn_unknown(&preferences);

            let household_size = match household_size {
                Some(n) => i32::try_from(n).context("household size out of range")?,
                None => current.household_size,
            };
            let cooking_skill = cooking_skill
                .filter(|s| !s.trim().is_empty())
                .or(current.cooking_skill_level);

            let updated = profiles::update_preferences(
                pool,
                user_id,
                &PreferencesUpdate {
                    dietary_preferences: &preferences,
                    allergies: &allergies,
                    cooking_skill_level: cooking_skill.as_deref(),
                    household_size,
                },
            )
            .await?;

            println!("Profile updated.");
            println!();
            print_profile(&updated);
            Ok(())
        }
    }
}

/// Trim entries and drop blanks, so `--preference ""` clears the list.
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn warn_unknown(preferences: &[String]) {
    let rules = DietaryRules::builtin();
    for name in preferences {
        if rules.preference(name).is_none() {
            eprintln!("warning: {name:?} is not a known dietary preference and filters nothing");
        }
    }
}

fn print_profile(profile: &Profile) {
    let or_none = |items: &[String]| {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(", ")
        }
    };

    println!("Profile {}", profile.id);
    println!("  Preferences:     {}", or_none(&profile.dietary_preferences));
    println!("  Allergies:       {}", or_none(&profile.allergies));
    println!("  Household size:  {}", profile.household_size);
    println!(
        "  Cooking skill:   {}",
        profile.cooking_skill_level.as_deref().unwrap_or("(not set)")
    );
    println!("  Subscription:    {}", profile.subscription_tier);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_list_trims_and_drops_blanks() {
        assert_eq!(
            clean_list(vec![" Vegan ".to_string(), String::new(), "  ".to_string()]),
            vec!["Vegan"]
        );
        assert!(clean_list(vec![String::new()]).is_empty());
    }
}
