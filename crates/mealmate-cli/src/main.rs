mod config;
mod plan_cmds;
mod profile_cmds;
mod recipes_cmd;
mod resolve;
mod serve_cmd;
mod shopping_cmds;
mod subscription_cmds;

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use uuid::Uuid;

use mealmate_core::export::ExportFormat;
use mealmate_core::share::DEFAULT_APP_URL;
use mealmate_db::models::{MealType, ShareMethod, SubscriptionTier};
use mealmate_db::pool;

use config::MealmateConfig;

#[derive(Parser)]
#[command(name = "mealmate", about = "Weekly meal plans and shopping lists")]
struct Cli {
    /// Database URL (overrides MEALMATE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealmate config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/mealmate")]
        db_url: String,
        /// Public base URL for share links
        #[arg(long, default_value = DEFAULT_APP_URL)]
        app_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the mealmate database (requires config file or env vars)
    DbInit,
    /// List the recipe catalog (no database required)
    Recipes(RecipeFilterArgs),
    /// Show or change your planning defaults
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Meal plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Shopping lists for a meal plan
    Shopping {
        #[command(subcommand)]
        command: ShoppingCommands,
    },
    /// Subscription tier and limits
    Subscription {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },
    /// Serve the JSON API and shared plan pages
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct RecipeFilterArgs {
    /// Only these cuisines (repeatable)
    #[arg(long = "cuisine", value_name = "CUISINE")]
    pub cuisines: Vec<String>,
    /// Dietary preference to honor (repeatable)
    #[arg(long = "preference", value_name = "NAME")]
    pub preferences: Vec<String>,
    /// Allergy to avoid (repeatable)
    #[arg(long = "allergy", value_name = "NAME")]
    pub allergies: Vec<String>,
    /// Only recipes for this meal type
    #[arg(long)]
    pub meal_type: Option<MealType>,
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Dietary preference (repeatable; defaults to your profile)
    #[arg(long = "preference", value_name = "NAME")]
    pub preferences: Vec<String>,
    /// Allergy (repeatable; defaults to your profile)
    #[arg(long = "allergy", value_name = "NAME")]
    pub allergies: Vec<String>,
    /// Only these cuisines (repeatable)
    #[arg(long = "cuisine", value_name = "CUISINE")]
    pub cuisines: Vec<String>,
    /// People to cook for (defaults to your profile)
    #[arg(long)]
    pub household_size: Option<u32>,
    /// Daily calorie target to report against
    #[arg(long)]
    pub calorie_target: Option<u32>,
    /// Cooking skill to remember on your profile
    #[arg(long)]
    pub cooking_skill: Option<String>,
    /// Seed for a reproducible plan
    #[arg(long)]
    pub seed: Option<u64>,
    /// Select and print without touching the database
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update planning defaults (pass "" to clear a list)
    Set {
        /// Dietary preferences (repeatable, replaces the stored list)
        #[arg(long = "preference", value_name = "NAME")]
        preferences: Option<Vec<String>>,
        /// Allergies (repeatable, replaces the stored list)
        #[arg(long = "allergy", value_name = "NAME")]
        allergies: Option<Vec<String>>,
        #[arg(long)]
        household_size: Option<u32>,
        #[arg(long)]
        cooking_skill: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate a week of meals
    Generate(GenerateArgs),
    /// Show a plan (or list all plans)
    Show {
        /// Plan ID or `latest` (omit to list all)
        plan: Option<String>,
    },
    /// Export a plan as CSV or printable HTML
    Export {
        /// Plan ID or `latest`
        plan: String,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Create a share link for a plan
    Share {
        /// Plan ID or `latest`
        plan: String,
        #[arg(long, default_value = "link")]
        method: ShareMethod,
    },
    /// Delete a plan with its shopping list and share records
    Delete {
        /// Plan ID or `latest`
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum ShoppingCommands {
    /// Build (or rebuild) the shopping list for a plan
    Generate {
        /// Plan ID or `latest`
        plan: String,
    },
    /// Show the shopping list for a plan
    Show {
        /// Plan ID or `latest`
        plan: String,
    },
    /// Check or uncheck an item by its number in `shopping show`
    Check {
        /// Plan ID or `latest`
        plan: String,
        /// Item number (starting at 1)
        item: usize,
    },
    /// Export the shopping list as CSV
    Export {
        /// Plan ID or `latest`
        plan: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    /// Show your tier, expiry and usage this month
    Show,
    /// List available tiers
    Plans,
    /// Change to a paid tier
    Upgrade {
        tier: SubscriptionTier,
        /// Bill yearly instead of monthly
        #[arg(long)]
        yearly: bool,
    },
    /// Return to the free tier
    Cancel,
}

/// Execute the `mealmate init` command: write config file.
fn cmd_init(db_url: &str, app_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let user_id = Uuid::new_v4();
    let secret = config::generate_share_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        user: config::UserSection { id: user_id },
        share: config::ShareSection {
            secret: secret.clone(),
            app_url: app_url.to_string(),
        },
        catalog: None,
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  user.id = {user_id}");
    println!("  share.secret = {}...{}", &secret[..8], &secret[56..]);
    println!("  share.app_url = {app_url}");
    println!();
    println!("Next: run `mealmate db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `mealmate db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = MealmateConfig::resolve(cli_db_url)?;

    println!("Initializing mealmate database...");

    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database {}.", resolved.db_config.database_name().unwrap_or_default());
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("mealmate db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            app_url,
            force,
        } => {
            cmd_init(&db_url, &app_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Recipes(filter) => {
            let catalog = config::catalog_from_env()?;
            recipes_cmd::run_recipes(&catalog, &filter)?;
        }
        Commands::Plan {
            command: PlanCommands::Generate(args),
        } if args.dry_run => {
            let catalog = config::catalog_from_env()?;
            plan_cmds::run_dry_run(&catalog, &args)?;
        }
        Commands::Subscription {
            command: SubscriptionCommands::Plans,
        } => {
            subscription_cmds::print_tiers();
        }
        Commands::Profile { command } => {
            let resolved = MealmateConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                profile_cmds::run_profile_command(command, &db_pool, resolved.user_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = MealmateConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool, &resolved).await;
            db_pool.close().await;
            result?;
        }
        Commands::Shopping { command } => {
            let resolved = MealmateConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                shopping_cmds::run_shopping_command(command, &db_pool, resolved.user_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Subscription { command } => {
            let resolved = MealmateConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                subscription_cmds::run_subscription_command(command, &db_pool, resolved.user_id)
                    .await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = MealmateConfig::resolve(cli.database_url.as_deref())?;
            let catalog = resolved.catalog()?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state = serve_cmd::AppState::new(
                db_pool.clone(),
                resolved.user_id,
                catalog,
                resolved.share_config,
            );
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "mealmate", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that read or write process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::parse_from([
            "mealmate",
            "plan",
            "generate",
            "--preference",
            "Vegetarian",
            "--allergy",
            "Dairy",
            "--allergy",
            "Nuts",
            "--household-size",
            "4",
            "--seed",
            "7",
            "--dry-run",
        ]);
        let Commands::Plan {
            command: PlanCommands::Generate(args),
        } = cli.command
        else {
            panic!("expected plan generate");
        };
        assert_eq!(args.preferences, vec!["Vegetarian"]);
        assert_eq!(args.allergies, vec!["Dairy", "Nuts"]);
        assert_eq!(args.household_size, Some(4));
        assert_eq!(args.seed, Some(7));
        assert!(args.dry_run);
    }

    #[test]
    fn parses_export_format_and_share_method() {
        let cli = Cli::parse_from(["mealmate", "plan", "export", "latest", "--format", "HTML"]);
        let Commands::Plan {
            command: PlanCommands::Export { plan, format, .. },
        } = cli.command
        else {
            panic!("expected plan export");
        };
        assert_eq!(plan, "latest");
        assert_eq!(format, ExportFormat::Html);

        assert!(
            Cli::try_parse_from(["mealmate", "plan", "share", "latest", "--method", "fax"])
                .is_err()
        );
    }

    #[test]
    fn parses_upgrade_tier() {
        let cli = Cli::parse_from(["mealmate", "subscription", "upgrade", "premium", "--yearly"]);
        let Commands::Subscription {
            command: SubscriptionCommands::Upgrade { tier, yearly },
        } = cli.command
        else {
            panic!("expected subscription upgrade");
        };
        assert_eq!(tier, SubscriptionTier::Premium);
        assert!(yearly);
    }
}
