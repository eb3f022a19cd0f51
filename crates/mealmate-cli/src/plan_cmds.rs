//! CLI handlers for `mealmate plan` subcommands.
//!
//! Implements:
//! - `mealmate plan generate [flags]`   -- generate and store a week of meals
//! - `mealmate plan show [plan]`        -- show one plan or list all plans
//! - `mealmate plan export <plan>`      -- CSV or printable HTML
//! - `mealmate plan share <plan>`       -- signed share link
//! - `mealmate plan delete <plan>`

use std::path::Path;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::PgPool;

use mealmate_core::catalog::RecipeCatalog;
use mealmate_core::diet::DietaryRules;
use mealmate_core::export::{ExportFormat, export_meal_plan};
use mealmate_core::plan::{
    GenerationOutcome, NO_SUITABLE_MEALS_MESSAGE, PlanWithMeals, day_name, delete_meal_plan,
    generate_meal_plan, get_meal_plan_with_meals,
};
use mealmate_core::selector::{GeneratedMeal, MealRequest, PlanSummary, select_meals};
use mealmate_core::share::service::share_meal_plan;
use mealmate_db::models::{Profile, ShareMethod};
use mealmate_db::queries::{meal_plans, profiles};

use crate::config::MealmateConfig;
use crate::resolve::resolve_plan_id;
use crate::{GenerateArgs, PlanCommands};

// -----------------------------------------------------------------------
// Public entry points
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(
    command: PlanCommands,
    pool: &PgPool,
    config: &MealmateConfig,
) -> Result<()> {
    let user_id = config.user_id;
    match command {
        PlanCommands::Generate(args) => cmd_generate(pool, config, &args).await,
        PlanCommands::Show { plan } => match plan {
            Some(plan) => cmd_show_one(pool, user_id, &plan).await,
            None => cmd_show_all(pool, user_id).await,
        },
        PlanCommands::Export {
            plan,
            format,
            output,
        } => cmd_export(pool, user_id, &plan, format, output.as_deref()).await,
        PlanCommands::Share { plan, method } => cmd_share(pool, config, &plan, method).await,
        PlanCommands::Delete { plan } => {
            let plan_id = resolve_plan_id(pool, user_id, &plan).await?;
            delete_meal_plan(pool, user_id, plan_id).await?;
            println!("Plan {plan_id} deleted.");
            Ok(())
        }
    }
}

/// `plan generate --dry-run`: select from the catalog and print, with no
/// database and no profile defaults.
pub fn run_dry_run<C: RecipeCatalog>(catalog: &C, args: &GenerateArgs) -> Result<()> {
    let request = build_request(args, None);
    let mut rng = make_rng(args.seed);
    let meals = select_meals(catalog, &DietaryRules::builtin(), &request, &mut rng)?;

    if meals.is_empty() {
        println!("{NO_SUITABLE_MEALS_MESSAGE}");
        return Ok(());
    }

    println!("Dry run: nothing was saved.");
    print_generated(&meals);
    println!();
    print_summary(&PlanSummary::from_generated(&meals, request.calorie_target));
    Ok(())
}

// -----------------------------------------------------------------------
// Request building
// -----------------------------------------------------------------------

/// Merge flags with the stored profile. A flag that was given wins;
/// otherwise the profile's value is used.
fn build_request(args: &GenerateArgs, profile: Option<&Profile>) -> MealRequest {
    let or_profile = |given: &Vec<String>, stored: Option<&Vec<String>>| {
        if given.is_empty() {
            stored.cloned().unwrap_or_default()
        } else {
            given.clone()
        }
    };

    MealRequest {
        dietary_preferences: or_profile(
            &args.preferences,
            profile.map(|p| &p.dietary_preferences),
        ),
        allergies: or_profile(&args.allergies, profile.map(|p| &p.allergies)),
        cuisines: args.cuisines.clone(),
        household_size: args
            .household_size
            .or_else(|| profile.and_then(|p| u32::try_from(p.household_size).ok()))
            .unwrap_or(1),
        calorie_target: args.calorie_target,
        cooking_skill: args
            .cooking_skill
            .clone()
            .or_else(|| profile.and_then(|p| p.cooking_skill_level.clone())),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

// -----------------------------------------------------------------------
// mealmate plan generate
// -----------------------------------------------------------------------

async fn cmd_generate(pool: &PgPool, config: &MealmateConfig, args: &GenerateArgs) -> Result<()> {
    let profile = profiles::ensure_profile(pool, config.user_id).await?;
    let request = build_request(args, Some(&profile));
    let catalog = config.catalog()?;
    let mut rng = make_rng(args.seed);

    let outcome = generate_meal_plan(
        pool,
        &catalog,
        &DietaryRules::builtin(),
        config.user_id,
        &request,
        &mut rng,
    )
    .await?;

    match outcome {
        GenerationOutcome::NoSuitableMeals => println!("{NO_SUITABLE_MEALS_MESSAGE}"),
        GenerationOutcome::Generated(found) => {
            println!("Meal plan generated.");
            println!();
            print_plan(&found, request.calorie_target);
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// mealmate plan show
// -----------------------------------------------------------------------

async fn cmd_show_all(pool: &PgPool, user_id: uuid::Uuid) -> Result<()> {
    let plans = meal_plans::list_meal_plans_for_user(pool, user_id).await?;

    if plans.is_empty() {
        println!("No meal plans found. Use `mealmate plan generate` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let title_w = plans.iter().map(|p| p.title.len()).max().unwrap_or(5).max(5);

    println!(
        "{:<id_w$}  {:<title_w$}  {:>8}  CREATED",
        "ID", "TITLE", "CALORIES",
    );
    for plan in &plans {
        println!(
            "{:<id_w$}  {:<title_w$}  {:>8}  {}",
            plan.id,
            plan.title,
            plan.total_calories,
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

async fn cmd_show_one(pool: &PgPool, user_id: uuid::Uuid, plan: &str) -> Result<()> {
    let plan_id = resolve_plan_id(pool, user_id, plan).await?;
    let found = get_meal_plan_with_meals(pool, user_id, plan_id).await?;
    print_plan(&found, None);
    Ok(())
}

fn print_plan(found: &PlanWithMeals, calorie_target: Option<u32>) {
    let plan = &found.plan;
    println!("{}", plan.title);
    println!("  ID:           {}", plan.id);
    println!("  Week of:      {}", plan.week_start_date.format("%Y-%m-%d"));
    if !plan.dietary_preferences.is_empty() {
        println!("  Preferences:  {}", plan.dietary_preferences.join(", "));
    }
    println!(
        "  Created:      {}",
        plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mut current_day = None;
    for meal in &found.meals {
        if current_day != Some(meal.day_of_week) {
            current_day = Some(meal.day_of_week);
            println!();
            println!("{}", day_name(meal.day_of_week));
        }
        println!(
            "  {:<10} {} ({}, {} min, {} cal, serves {})",
            meal.meal_type.label(),
            meal.recipe_name,
            meal.cuisine,
            meal.prep_time + meal.cook_time,
            meal.calories_per_serving,
            meal.servings,
        );
    }

    println!();
    print_summary(&PlanSummary::from_meals(&found.meals, calorie_target));
}

fn print_generated(meals: &[GeneratedMeal]) {
    let mut current_day = None;
    for meal in meals {
        if current_day != Some(meal.slot.day) {
            current_day = Some(meal.slot.day);
            println!();
            println!("{}", day_name(i32::from(meal.slot.day)));
        }
        println!(
            "  {:<10} {} ({}, {} min, {} cal, serves {})",
            meal.slot.meal_type.label(),
            meal.recipe_name,
            meal.cuisine,
            meal.prep_time + meal.cook_time,
            meal.calories_per_serving,
            meal.servings,
        );
    }
}

fn print_summary(summary: &PlanSummary) {
    println!(
        "{} meals over {} days, {} calories ({} per day)",
        summary.meal_count,
        summary.days_covered,
        summary.total_calories,
        summary.average_daily_calories,
    );
    if let (Some(target), Some(delta)) = (summary.calorie_target, summary.target_delta) {
        println!("Daily target {target}: {delta:+} per day");
    }
}

// -----------------------------------------------------------------------
// mealmate plan export / share
// -----------------------------------------------------------------------

async fn cmd_export(
    pool: &PgPool,
    user_id: uuid::Uuid,
    plan: &str,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let plan_id = resolve_plan_id(pool, user_id, plan).await?;
    let found = get_meal_plan_with_meals(pool, user_id, plan_id).await?;
    let artifact = export_meal_plan(&found.plan, &found.meals, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, &artifact.body)
                .with_context(|| format!("failed to write to {}", path.display()))?;
            println!("Plan exported to {}", path.display());
        }
        None => print!("{}", artifact.body),
    }
    Ok(())
}

async fn cmd_share(
    pool: &PgPool,
    config: &MealmateConfig,
    plan: &str,
    method: ShareMethod,
) -> Result<()> {
    let plan_id = resolve_plan_id(pool, config.user_id, plan).await?;
    let url = share_meal_plan(pool, &config.share_config, config.user_id, plan_id, method).await?;
    println!("{url}");
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
